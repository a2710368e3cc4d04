//! Error types for message assembly

use thiserror::Error;

/// Errors produced while building an observation message
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// No parameter has been decoded yet; there is nothing to report
    #[error("no ventilator data collected, nothing to report")]
    EmptySnapshot,
}
