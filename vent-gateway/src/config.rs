//! Gateway configuration
//!
//! Plain values consumed by the transport and the actor, loaded from a
//! JSON file with per-field defaults so a partial file stays valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatewayConfig {
    /// Serial port the ventilator is attached to
    #[serde(default = "default_port")]
    pub port: String,
    /// Serial baud rate
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Delay before reopening the port after a connection failure
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
    /// Patient identifier placed in the PID segment
    #[serde(default = "default_patient_id")]
    pub patient_id: String,
    /// How often the activation command is resent
    #[serde(default = "default_resend_interval_secs")]
    pub resend_interval_secs: u64,
    /// Read poll timeout on the serial line
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Directory observation messages are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_port() -> String {
    "/dev/ttyUSB0".to_string()
}

fn default_baud_rate() -> u32 {
    38400
}

fn default_reconnect_delay_secs() -> u64 {
    10
}

fn default_patient_id() -> String {
    "UNKNOWN_PATIENT".to_string()
}

fn default_resend_interval_secs() -> u64 {
    30
}

fn default_read_timeout_ms() -> u64 {
    10
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("hl7_messages")
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            baud_rate: default_baud_rate(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
            patient_id: default_patient_id(),
            resend_interval_secs: default_resend_interval_secs(),
            read_timeout_ms: default_read_timeout_ms(),
            output_dir: default_output_dir(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a JSON file, falling back to defaults when
    /// the file is missing or unreadable
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!("invalid config file {}: {}, using defaults", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }
}
