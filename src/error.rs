use thiserror::Error;

/// Result type for receiver operations
pub type Result<T> = std::result::Result<T, NadError>;

/// Errors that can occur when talking to a NAD receiver
#[derive(Error, Debug)]
pub enum NadError {
    /// I/O error on the underlying transport
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial device could not be opened
    #[error("Serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// Host did not accept a connection after all attempts
    #[error("Host {host} unreachable after {attempts} attempts")]
    Unreachable {
        /// Host that was dialled
        host: String,
        /// Number of connection attempts made
        attempts: u32,
    },

    /// Connection was closed by the receiver
    #[error("Connection closed")]
    ConnectionClosed,

    /// Operation timed out
    #[error("Timeout")]
    Timeout,

    /// Configuration is invalid
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Operation not available on this transport family
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Missing or malformed argument to an operation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
