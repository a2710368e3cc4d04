//! Unified event stream for the gateway
//!
//! The connection task and the gateway actor emit all observable activity
//! through a single event channel, consumed by the binary for logging and
//! by tests for assertions.

/// Events emitted by the gateway tasks
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// The serial transport is open and the I/O loop is running
    SerialConnected {
        /// Port or channel name
        port: String,
    },

    /// The serial transport closed or failed; the session is over
    SerialDisconnected,

    /// A new breath cycle started
    BreathDetected {
        /// Breath number reported by the ventilator
        breath_number: String,
    },

    /// An observation message was handed to the sink
    MessageEmitted {
        /// Suggested filename the sink used
        filename: String,
    },

    /// A non-fatal error occurred; processing continues
    Error {
        /// Component that produced the error
        source: String,
        /// Error message
        message: String,
    },
}
