//! Native actix-web host. Requests are converted to Spin types and handed to
//! the same handlers the wasm component uses, over an in-memory document store.

use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};

use crate::core::db::MemoryDocumentStore;
use crate::handlers::{handle_request, AppContext};

pub type NativeContext = AppContext<MemoryDocumentStore>;

mod adapter {
    use actix_web::HttpRequest;
    use spin_sdk::http::{Method, Request};

    pub fn actix_to_spin_request(
        req: &HttpRequest,
        body: actix_web::web::Bytes,
    ) -> anyhow::Result<Request> {
        let method = match req.method().as_str() {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "HEAD" => Method::Head,
            "OPTIONS" => Method::Options,
            "PATCH" => Method::Patch,
            other => anyhow::bail!("unsupported method {}", other),
        };

        let uri = req.uri().to_string();
        let body_vec = body.to_vec();

        let mut req_builder = Request::builder();
        let method_set = req_builder.method(method);
        let uri_set = method_set.uri(&uri);

        let mut with_headers = uri_set;
        for (name, value) in req.headers() {
            if let Ok(val_str) = value.to_str() {
                with_headers = with_headers.header(name.as_str(), val_str);
            }
        }

        Ok(with_headers.body(body_vec).build())
    }

    pub fn spin_to_actix_response(spin_resp: spin_sdk::http::Response) -> actix_web::HttpResponse {
        let status = *spin_resp.status();

        let mut response = actix_web::HttpResponse::build(
            actix_web::http::StatusCode::from_u16(status)
                .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR),
        );
        if let Some(content_type) = spin_resp.header("content-type").and_then(|v| v.as_str()) {
            response.content_type(content_type.to_string());
        }

        response.body(spin_resp.body().to_vec())
    }
}

/// A seeded context backed by process memory.
pub fn native_context() -> anyhow::Result<web::Data<NativeContext>> {
    let ctx = AppContext::new(MemoryDocumentStore::new())?;
    Ok(web::Data::new(ctx))
}

pub fn build_server(ctx: web::Data<NativeContext>, listener: TcpListener) -> std::io::Result<Server> {
    let server = HttpServer::new(move || {
        App::new()
            .app_data(ctx.clone())
            .default_service(web::route().to(handle_all))
    })
    .listen(listener)?
    .run();

    Ok(server)
}

pub async fn run(bind_addr: &str) -> anyhow::Result<()> {
    let ctx = native_context()?;
    let listener = TcpListener::bind(bind_addr)?;
    log::info!("server listening on http://{}", listener.local_addr()?);

    build_server(ctx, listener)?.await?;
    Ok(())
}

async fn handle_all(ctx: web::Data<NativeContext>, req: HttpRequest, body: web::Bytes) -> HttpResponse {
    let spin_req = match adapter::actix_to_spin_request(&req, body) {
        Ok(r) => r,
        Err(e) => {
            log::warn!("rejected request {} {}: {}", req.method(), req.path(), e);
            return HttpResponse::BadRequest()
                .json(serde_json::json!({"error": "Invalid request"}));
        }
    };

    match handle_request(ctx.get_ref(), spin_req) {
        Ok(spin_resp) => adapter::spin_to_actix_response(spin_resp),
        Err(e) => {
            log::error!("{} {} failed: {:#}", req.method(), req.path(), e);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({"error": "Internal server error"}))
        }
    }
}
