//! Ventilator HL7 Gateway
//!
//! Wires the protocol engine to a serial transport and a message sink:
//! an async connection task reads raw bytes from the ventilator and
//! forwards them to the gateway actor, which reassembles and decodes
//! frames, tracks parameter state, and emits one HL7 observation message
//! at the start of every breath cycle. A timer inside the actor resends
//! the mixed-mode activation command so the ventilator keeps reporting.
//!
//! # Architecture
//!
//! ```text
//! serial port <--> SerialConnection --GatewayCommand--> gateway actor --> MessageSink
//!                        ^                                   |
//!                        +--------- activation bytes --------+
//! ```
//!
//! Both tasks communicate only through channels; either one ending closes
//! the other's channel and shuts the pair down cooperatively.

pub mod actor;
pub mod config;
pub mod connection;
pub mod error;
pub mod events;
pub mod sink;

pub use actor::{run_gateway, GatewayCommand, GatewayOptions};
pub use config::GatewayConfig;
pub use connection::SerialConnection;
pub use error::GatewayError;
pub use events::GatewayEvent;
pub use sink::{FileSink, MessageSink, SinkError};
