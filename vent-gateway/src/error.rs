//! Error types for the gateway

use thiserror::Error;

/// Errors that end a gateway session
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Serial port could not be opened
    #[error("serial error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
