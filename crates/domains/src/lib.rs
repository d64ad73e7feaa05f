//! domains
//!
//! Entities, wire schema, validation rules and the backend port for the
//! internship board client. No I/O happens in this crate.

pub mod error;
pub mod models;
pub mod ports;
pub mod validation;
pub mod wire;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use ports::*;
