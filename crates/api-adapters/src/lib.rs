//! # API Adapters
//!
//! Outside-facing implementations for the board client: the `reqwest`
//! backend client and, behind the `web-axum` feature, the server-rendered
//! pages.

pub mod http;

#[cfg(feature = "web-axum")]
pub mod web;

pub use http::{HttpApiConfig, HttpBoardApi};
