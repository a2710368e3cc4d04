//! Ventilator State and HL7 Projection
//!
//! This crate accumulates decoded parameter readings into a per-process
//! ventilator state, detects the start of each new breath cycle, and
//! projects state snapshots into HL7 ORU^R01 observation messages for
//! downstream clinical systems.
//!
//! # Example
//!
//! ```rust
//! use vent_hl7::{build_message, VentilatorState};
//! use vent_protocol::Reading;
//!
//! let mut state = VentilatorState::new();
//! let readings = vec![Reading {
//!     group: "Monitored Parameters",
//!     parameter: "Breath Number",
//!     value: "12".to_string(),
//! }];
//!
//! // First non-empty breath number marks a new breath cycle
//! assert_eq!(state.merge(&readings).as_deref(), Some("12"));
//!
//! let snapshot = state.snapshot();
//! let message = build_message(&snapshot, "PATIENT_1", chrono::Local::now()).unwrap();
//! assert!(message.text.starts_with("MSH|"));
//! ```

pub mod codes;
pub mod error;
pub mod message;
pub mod state;

pub use codes::{clinical_identifier, OBSERVATION_CODES};
pub use error::MessageError;
pub use message::{build_message, ObservationMessage};
pub use state::{StateSnapshot, VentilatorState};
