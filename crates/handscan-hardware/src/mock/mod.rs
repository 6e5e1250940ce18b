//! Mock driver implementations for testing and development.
//!
//! This module provides a simulated reader transport that can be controlled
//! programmatically without requiring physical hardware.

pub mod reader;

// Re-export commonly used types
pub use reader::{MockCommand, MockOperation, MockReader, MockReaderHandle};
