//! keebs: a small micro-blogging app for keyboard enthusiasts.
//!
//! Users, posts and the login session live in an in-memory [`store::AppStore`].
//! The follow graph lives in per-user documents behind [`core::db::DocumentStore`].
//! The same handlers serve both the Spin component and the native actix host.

pub mod auth;
pub mod config;
pub mod core;
pub mod follow;
pub mod handlers;
pub mod models;
pub mod router;
pub mod store;
pub mod views;

#[cfg(not(target_arch = "wasm32"))]
pub mod server;

#[cfg(target_arch = "wasm32")]
mod component {
    use spin_sdk::http::{IntoResponse, Request};
    use spin_sdk::http_component;

    use crate::config::kv_store_label;
    use crate::core::db::KvDocumentStore;
    use crate::handlers::{handle_request, AppContext};

    #[http_component]
    fn handle(req: Request) -> anyhow::Result<impl IntoResponse> {
        let db = KvDocumentStore::open(&kv_store_label())?;
        let ctx = AppContext::new(db)?;
        handle_request(&ctx, req)
    }
}
