//! Framework-neutral HTTP handlers. Both the Spin component and the native
//! actix server funnel requests through [`handle_request`].

use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use spin_sdk::http::{Request, Response};

use crate::auth::{bearer_token, Auth};
use crate::core::db::DocumentStore;
use crate::core::errors::{ApiError, AppError, Result};
use crate::core::helpers::{is_email_shaped, parse_numeric_id};
use crate::core::query_params::{parse_pairs, parse_query_params};
use crate::core::seed::init_test_data;
use crate::follow::{follow_user, get_feed, get_followers, get_followings, unfollow_user};
use crate::models::models::{AuthUser, Mode, Post};
use crate::router::{resolve, View};
use crate::store::AppStore;
use crate::views;

/// Everything a request needs: the document backend and the client-side state.
pub struct AppContext<D: DocumentStore> {
    pub db: D,
    app: Mutex<AppStore>,
}

impl<D: DocumentStore> AppContext<D> {
    /// Wraps `db` with fixture state and seeds the fixture documents.
    pub fn new(db: D) -> Result<Self> {
        let app = AppStore::default();
        init_test_data(&db, &app)?;
        Ok(Self { db, app: Mutex::new(app) })
    }

    pub fn app(&self) -> Result<MutexGuard<'_, AppStore>> {
        self.app
            .lock()
            .map_err(|_| AppError::Storage("app state lock poisoned".to_string()))
    }

    fn auth(&self) -> Auth<'_> {
        Auth::new(&self.db)
    }
}

fn json_response<T: Serialize>(status: u16, value: &T) -> anyhow::Result<Response> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(serde_json::to_vec(value)?)
        .build())
}

fn html_response(html: String) -> anyhow::Result<Response> {
    Ok(Response::builder()
        .status(200)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(html.into_bytes())
        .build())
}

fn error_response(err: AppError) -> anyhow::Result<Response> {
    Ok(ApiError::from(err).into())
}

fn authorization(req: &Request) -> Option<&str> {
    bearer_token(req.header("Authorization").and_then(|h| h.as_str()))
}

fn current_user<D: DocumentStore>(ctx: &AppContext<D>, req: &Request) -> Result<Option<AuthUser>> {
    match authorization(req) {
        Some(token) => ctx.auth().current_user(token),
        None => Ok(None),
    }
}

/// Reads a field from a JSON body, falling back to a form-encoded body.
fn body_field(req: &Request, field: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(req.body()) {
        return match &value[field] {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        };
    }
    let body = std::str::from_utf8(req.body()).ok()?;
    parse_pairs(body).remove(field)
}

pub fn handle_request<D: DocumentStore>(ctx: &AppContext<D>, req: Request) -> anyhow::Result<Response> {
    let method = req.method().to_string();
    let path = req.path().to_string();

    match (method.as_str(), path.as_str()) {
        ("POST", "/login") => login(ctx, &req),
        ("POST", "/logout") => logout(ctx, &req),
        ("POST", "/follow") => handle_follow(ctx, &req),
        ("POST", "/unfollow") => handle_unfollow(ctx, &req),
        ("GET", "/feed") => feed(ctx, &req),
        ("GET", p) if p.starts_with("/followings/") => {
            followings_list(ctx, p.trim_start_matches("/followings/"))
        }
        ("GET", p) if p.starts_with("/followers/") => {
            followers_list(ctx, p.trim_start_matches("/followers/"))
        }
        ("GET", _) => render_view(ctx, &req),
        _ => json_response(404, &serde_json::json!({ "error": "No route found" })),
    }
}

fn render_view<D: DocumentStore>(ctx: &AppContext<D>, req: &Request) -> anyhow::Result<Response> {
    let route = match resolve(req.path()) {
        Some(route) => route,
        None => return json_response(404, &serde_json::json!({ "error": "No route found" })),
    };

    let mut app = match ctx.app() {
        Ok(app) => app,
        Err(e) => return error_response(e),
    };

    let rendered = match route.view {
        View::Home => {
            app.set_viewing_user("");
            views::render_home(&app)
        }
        View::UserProfile => {
            let user = route
                .param("id")
                .and_then(parse_numeric_id)
                .and_then(|id| app.get_user_by_id(id).cloned());
            let user = match user {
                Some(user) => user,
                None => return Ok(ApiError::NotFound("User not found".to_string()).into()),
            };
            let viewing = if user.username == app.current_user() {
                ""
            } else {
                user.username.as_str()
            };
            app.set_viewing_user(viewing);
            views::render_user_profile(&app, user.id).map(Option::unwrap_or_default)
        }
        View::Login => {
            match parse_query_params(&req.uri()).get("mode").map(String::as_str) {
                Some("signup") => app.toggle_mode(Mode::Signup),
                Some("login") => app.toggle_mode(Mode::Login),
                _ => {}
            }
            views::render_login(&app)
        }
        View::Archives => views::render_archives(&app),
    };

    match rendered {
        Ok(html) => html_response(html),
        Err(e) => error_response(e),
    }
}

pub fn login<D: DocumentStore>(ctx: &AppContext<D>, req: &Request) -> anyhow::Result<Response> {
    let username = body_field(req, "username").unwrap_or_default().trim().to_string();
    let password = body_field(req, "password").unwrap_or_default();

    if !is_email_shaped(&username) {
        return Ok(ApiError::BadRequest("Username must be an email address".to_string()).into());
    }
    if password.is_empty() {
        return Ok(ApiError::BadRequest("Password is required".to_string()).into());
    }

    let (token, user) = match ctx.auth().sign_in(&username, &password) {
        Ok(signed_in) => signed_in,
        Err(e) => return error_response(e),
    };

    match ctx.app() {
        Ok(mut app) => {
            if app.get_user_by_username(&user.email).is_none() {
                log::warn!("uid={} signed in without a profile", user.uid);
            }
            app.login(&user.email);
        }
        Err(e) => return error_response(e),
    }

    json_response(200, &serde_json::json!({ "token": token, "user_id": user.uid }))
}

pub fn logout<D: DocumentStore>(ctx: &AppContext<D>, req: &Request) -> anyhow::Result<Response> {
    let token = match authorization(req) {
        Some(token) => token,
        None => return Ok(ApiError::Unauthorized.into()),
    };

    if let Err(e) = ctx.auth().sign_out(token) {
        return error_response(e);
    }
    match ctx.app() {
        Ok(mut app) => app.logout(),
        Err(e) => return error_response(e),
    }

    json_response(200, &serde_json::json!({ "message": "Logged out successfully" }))
}

pub fn handle_follow<D: DocumentStore>(ctx: &AppContext<D>, req: &Request) -> anyhow::Result<Response> {
    let current = match current_user(ctx, req) {
        Ok(current) => current,
        Err(e) => return error_response(e),
    };
    let target_user_id = body_field(req, "target_user_id").unwrap_or_default();

    let outcome = match follow_user(&ctx.db, current.as_ref(), &target_user_id) {
        Ok(outcome) => outcome,
        Err(e) => return error_response(e),
    };

    // Only a new edge moves the profile counters.
    if let (Some(user), true) = (&current, outcome.changed) {
        update_counts(ctx, &user.uid, &target_user_id, true);
    }

    json_response(200, &outcome)
}

pub fn handle_unfollow<D: DocumentStore>(ctx: &AppContext<D>, req: &Request) -> anyhow::Result<Response> {
    let current = match current_user(ctx, req) {
        Ok(current) => current,
        Err(e) => return error_response(e),
    };
    let target_user_id = body_field(req, "target_user_id").unwrap_or_default();

    let outcome = match unfollow_user(&ctx.db, current.as_ref(), &target_user_id) {
        Ok(outcome) => outcome,
        Err(e) => return error_response(e),
    };

    if let (Some(user), true) = (&current, outcome.changed) {
        update_counts(ctx, &user.uid, &target_user_id, false);
    }

    json_response(200, &outcome)
}

fn update_counts<D: DocumentStore>(ctx: &AppContext<D>, follower: &str, target: &str, followed: bool) {
    let (Some(follower), Some(target)) = (parse_numeric_id(follower), parse_numeric_id(target)) else {
        return;
    };
    match ctx.app() {
        Ok(mut app) if followed => {
            app.increment_following(follower);
            app.increment_followers(target);
        }
        Ok(mut app) => {
            app.decrement_following(follower);
            app.decrement_followers(target);
        }
        Err(e) => log::warn!("profile counters not updated: {}", e),
    }
}

pub fn feed<D: DocumentStore>(ctx: &AppContext<D>, req: &Request) -> anyhow::Result<Response> {
    let user = match current_user(ctx, req) {
        Ok(Some(user)) => user,
        Ok(None) => return Ok(ApiError::Unauthorized.into()),
        Err(e) => return error_response(e),
    };

    let ids = match get_feed(&ctx.db, &user.uid) {
        Ok(ids) => ids,
        Err(e) => return error_response(e),
    };

    let app = match ctx.app() {
        Ok(app) => app,
        Err(e) => return error_response(e),
    };
    let mut posts: Vec<Post> = ids
        .iter()
        .filter_map(|id| parse_numeric_id(id))
        .filter_map(|id| app.get_post_by_id(id).cloned())
        .collect();
    posts.sort_by(|a, b| (b.date, b.time).cmp(&(a.date, a.time)));

    json_response(200, &posts)
}

fn followings_list<D: DocumentStore>(ctx: &AppContext<D>, user_id: &str) -> anyhow::Result<Response> {
    if user_id.is_empty() {
        return Ok(ApiError::BadRequest("User ID required".to_string()).into());
    }
    match get_followings(&ctx.db, user_id) {
        Ok(list) => json_response(200, &list),
        Err(e) => error_response(e),
    }
}

fn followers_list<D: DocumentStore>(ctx: &AppContext<D>, user_id: &str) -> anyhow::Result<Response> {
    if user_id.is_empty() {
        return Ok(ApiError::BadRequest("User ID required".to_string()).into());
    }
    match get_followers(&ctx.db, user_id) {
        Ok(list) => json_response(200, &list),
        Err(e) => error_response(e),
    }
}
