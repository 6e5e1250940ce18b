//! Shared domain types for handheld reader sessions.
//!
//! Devices, scan modes, transmit power and the error taxonomy surfaced to
//! consumers of a reader session.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
