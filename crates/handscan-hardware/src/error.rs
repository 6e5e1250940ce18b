//! Error types for reader driver operations.
//!
//! Handheld reader SDKs report two broad fault classes: usage faults (the
//! call was not valid in the current transport or reader state) and operation
//! failures (the reader accepted the call but could not carry it out). Both are
//! represented here, alongside transport-level disconnections.

/// Result type alias for driver operations.
pub type Result<T> = std::result::Result<T, DriverError>;

/// Errors that can occur during reader driver operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DriverError {
    /// The call is not valid in the current state (e.g. transport not ready).
    #[error("Invalid usage: {message}")]
    InvalidUsage { message: String },

    /// The reader could not complete the operation.
    #[error("Operation failed: {message}")]
    OperationFailure { message: String },

    /// Reader is not connected or has been disconnected.
    #[error("Reader disconnected: {device}")]
    Disconnected { device: String },

    /// The driver does not know this reader.
    #[error("Unknown reader: {device}")]
    UnknownDevice { device: String },

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl DriverError {
    /// Create a new invalid usage error.
    pub fn invalid_usage(message: impl Into<String>) -> Self {
        Self::InvalidUsage {
            message: message.into(),
        }
    }

    /// Create a new operation failure error.
    pub fn operation_failure(message: impl Into<String>) -> Self {
        Self::OperationFailure {
            message: message.into(),
        }
    }

    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new unknown device error.
    pub fn unknown_device(device: impl Into<String>) -> Self {
        Self::UnknownDevice {
            device: device.into(),
        }
    }

    /// Create a generic error with custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}
