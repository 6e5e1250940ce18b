use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Discovery errors
    #[error("Device discovery failed: {0}")]
    Discovery(String),

    // Connection errors
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Connection to {device} failed: {message}")]
    Connection { device: String, message: String },

    // Reader configuration errors
    #[error("Reader configuration failed: {0}")]
    Config(String),

    #[error("Invalid scan mode: {0}")]
    InvalidScanMode(String),

    #[error("Transmit power {value} out of range 0..={max}")]
    PowerOutOfRange { value: u16, max: u16 },

    // Session settings errors
    #[error("Invalid session settings: {0}")]
    Settings(String),
}

impl Error {
    /// Create a connection error for the named device.
    pub fn connection(device: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            device: device.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
