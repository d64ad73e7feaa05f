use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domains::ApiError;
use thiserror::Error;
use tracing::error;

/// Failures that abort a page instead of turning into a notice.
#[derive(Error, Debug)]
pub enum WebError {
    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),

    #[error("session store failure: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("could not open a backend session: {0}")]
    Connect(ApiError),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        error!(error = %self, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Something went wrong. Please try again.",
        )
            .into_response()
    }
}
