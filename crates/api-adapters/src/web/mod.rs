//! # Web tier
//!
//! Server-rendered pages over the services layer. Enabled with the
//! `web-axum` feature.

pub mod error;
pub mod handlers;
pub mod state;
pub mod templates;

use std::time::Duration;

use axum::http::{header, HeaderValue};
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::{time, SameSite};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

pub use error::WebError;
pub use state::{ApiConnector, AppState, ClientHandle, HttpApiConnector};

/// How the visitor cookie is issued.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub cookie_name: String,
    /// Only send the cookie over HTTPS.
    pub secure: bool,
    /// The cookie expires after this long without a request.
    pub idle: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            cookie_name: "board-session".to_string(),
            secure: false,
            idle: Duration::from_secs(60 * 60),
        }
    }
}

pub fn router(state: AppState, options: SessionOptions) -> Router {
    let idle = i64::try_from(options.idle.as_secs()).unwrap_or(i64::MAX);
    let sessions = SessionManagerLayer::new(MemoryStore::default())
        .with_name(options.cookie_name)
        .with_secure(options.secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(time::Duration::seconds(idle)));

    Router::new()
        .route("/", get(handlers::home))
        .route("/healthz", get(handlers::healthz))
        .route("/posts/{id}", get(handlers::show_posting))
        .route(
            "/create",
            get(handlers::new_posting).post(handlers::create_posting),
        )
        .route(
            "/posts/{id}/edit",
            get(handlers::edit_posting).post(handlers::update_posting),
        )
        .route("/posts/{id}/delete", post(handlers::delete_posting))
        .route("/posts/{id}/vote", post(handlers::vote))
        .route("/posts/{id}/report", post(handlers::report))
        .route("/posts/{id}/comments", post(handlers::add_comment))
        .route("/comments/{id}/edit", post(handlers::edit_comment))
        .route("/comments/{id}/delete", post(handlers::delete_comment))
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/signup", get(handlers::signup_page).post(handlers::signup))
        .route("/logout", post(handlers::logout))
        .route("/admin", get(handlers::admin))
        .route(
            "/admin/reports/{id}/resolve",
            post(handlers::resolve_report),
        )
        .route("/admin/posts/{id}/delete", post(handlers::moderate_delete))
        .route("/admin/posts/{id}/restore", post(handlers::moderate_restore))
        .layer(sessions)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(state)
}
