//! Ventilator Simulation Library
//!
//! This crate provides a simulated Hamilton ventilator for testing the
//! gateway pipeline without physical hardware. [`VirtualVentilator`]
//! generates protocol-accurate parameter frames; [`run_virtual_ventilator`]
//! drives one over any duplex byte channel, behaving like the real device:
//! silent until an activation command arrives, then reporting monitored
//! parameters once per breath.
//!
//! # Example
//!
//! ```rust
//! use vent_sim::VirtualVentilator;
//! use vent_protocol::{decode_parameters, validate_frame};
//!
//! let mut vent = VirtualVentilator::default();
//! let frame = vent.next_breath_frame();
//!
//! let payload = validate_frame(&frame).unwrap();
//! let readings = decode_parameters(payload).unwrap();
//! assert!(readings.iter().any(|r| r.parameter == "Breath Number"));
//! ```

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::interval;
use tracing::{debug, info, warn};

use vent_protocol::{encode_frame, validate_frame, CMD_ACTIVATE_MIXED_MODE, VT};

/// Group id for Monitored Parameters chunks
const GROUP_MONITORED: u8 = 0x50;
/// Group id for Control Settings chunks
const GROUP_CONTROL: u8 = 0x70;

/// Configuration for a simulated ventilator
#[derive(Debug, Clone)]
pub struct VirtualVentilatorConfig {
    /// Breath number of the first emitted breath
    pub initial_breath_number: u32,
    /// Time between breath frames
    pub breath_interval: Duration,
    /// Ventilation mode reported in Control Settings
    pub mode_name: String,
}

impl Default for VirtualVentilatorConfig {
    fn default() -> Self {
        Self {
            initial_breath_number: 1,
            breath_interval: Duration::from_millis(50),
            mode_name: "ASV".to_string(),
        }
    }
}

/// A simulated ventilator that generates protocol-accurate frames
#[derive(Debug)]
pub struct VirtualVentilator {
    breath_number: u32,
    mode_name: String,
    pulse: u32,
    spo2: u32,
    p_max: u32,
    peep: u32,
}

impl VirtualVentilator {
    /// Create a ventilator from configuration
    pub fn from_config(config: &VirtualVentilatorConfig) -> Self {
        Self {
            breath_number: config.initial_breath_number,
            mode_name: config.mode_name.clone(),
            pulse: 78,
            spo2: 97,
            p_max: 24,
            peep: 5,
        }
    }

    /// Breath number the next frame will carry
    pub fn breath_number(&self) -> u32 {
        self.breath_number
    }

    /// Override the reported pulse rate
    pub fn set_pulse(&mut self, pulse: u32) {
        self.pulse = pulse;
    }

    /// Override the reported oxygen saturation
    pub fn set_spo2(&mut self, spo2: u32) {
        self.spo2 = spo2;
    }

    /// Produce one breath-by-breath monitored parameters frame and
    /// advance the breath number
    pub fn next_breath_frame(&mut self) -> Vec<u8> {
        let breath = self.breath_number.to_string();
        let pulse = self.pulse.to_string();
        let spo2 = self.spo2.to_string();
        let p_max = self.p_max.to_string();
        let peep = self.peep.to_string();

        let frame = parameter_frame(&[
            (GROUP_MONITORED, 0x20, breath.as_str()),
            (GROUP_MONITORED, 0x21, p_max.as_str()),
            (GROUP_MONITORED, 0x24, peep.as_str()),
            (GROUP_MONITORED, 0x4E, pulse.as_str()),
            (GROUP_MONITORED, 0x4F, spo2.as_str()),
        ]);
        self.breath_number += 1;
        frame
    }

    /// Produce an on-change Control Settings frame reporting the mode
    pub fn mode_frame(&self) -> Vec<u8> {
        parameter_frame(&[(GROUP_CONTROL, 0x22, &self.mode_name)])
    }
}

impl Default for VirtualVentilator {
    fn default() -> Self {
        Self::from_config(&VirtualVentilatorConfig::default())
    }
}

/// Seal a mixed-mode reply carrying the given (group, parameter, value)
/// chunks
fn parameter_frame(chunks: &[(u8, u8, &str)]) -> Vec<u8> {
    let mut body = vec![CMD_ACTIVATE_MIXED_MODE];
    for &(group_id, param_id, value) in chunks {
        body.push(VT);
        body.push(group_id);
        body.push(param_id);
        body.extend_from_slice(value.as_bytes());
    }
    encode_frame(&body)
}

/// Drive a virtual ventilator over a duplex byte channel.
///
/// Stays silent until a valid activation command arrives, then reports
/// the mode once and emits one breath frame per configured interval.
/// Returns when the peer closes the channel.
pub async fn run_virtual_ventilator<T>(mut io: T, config: VirtualVentilatorConfig)
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    let mut ventilator = VirtualVentilator::from_config(&config);
    let mut buffer = [0u8; 256];
    let mut activated = false;
    let mut breath_timer = interval(config.breath_interval);

    info!("virtual ventilator waiting for activation");

    loop {
        tokio::select! {
            result = io.read(&mut buffer) => {
                match result {
                    Ok(0) => {
                        debug!("peer closed, virtual ventilator stopping");
                        break;
                    }
                    Ok(n) => {
                        if !activated && is_activation_command(&buffer[..n]) {
                            info!("activation command received, reporting begins");
                            activated = true;
                            if io.write_all(&ventilator.mode_frame()).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        warn!("virtual ventilator read error: {}", e);
                        break;
                    }
                }
            }
            _ = breath_timer.tick() => {
                if !activated {
                    continue;
                }
                let frame = ventilator.next_breath_frame();
                if io.write_all(&frame).await.is_err() {
                    break;
                }
                let _ = io.flush().await;
            }
        }
    }
}

/// Check whether a received chunk contains a valid activation command
fn is_activation_command(data: &[u8]) -> bool {
    validate_frame(data)
        .map(|payload| payload.first() == Some(&CMD_ACTIVATE_MIXED_MODE))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::{is_activation_command, VirtualVentilator};
    use vent_protocol::{build_activation_command, decode_parameters, validate_frame};

    #[test]
    fn test_breath_frames_decode_and_advance() {
        let mut vent = VirtualVentilator::default();

        let first = vent.next_breath_frame();
        let second = vent.next_breath_frame();

        let breath_of = |frame: &[u8]| {
            let payload = validate_frame(frame).unwrap();
            decode_parameters(payload)
                .unwrap()
                .into_iter()
                .find(|r| r.parameter == "Breath Number")
                .unwrap()
                .value
        };

        assert_eq!(breath_of(&first), "1");
        assert_eq!(breath_of(&second), "2");
    }

    #[test]
    fn test_mode_frame_reports_control_settings() {
        let vent = VirtualVentilator::default();
        let frame = vent.mode_frame();
        let payload = validate_frame(&frame).unwrap();
        let readings = decode_parameters(payload).unwrap();

        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].group, "Control Settings");
        assert_eq!(readings[0].value, "ASV");
    }

    #[test]
    fn test_recognizes_activation_command() {
        assert!(is_activation_command(&build_activation_command()));
        assert!(!is_activation_command(b"garbage"));
    }

    #[tokio::test]
    async fn test_silent_until_activated_then_reports() {
        use super::{run_virtual_ventilator, VirtualVentilatorConfig};
        use std::time::Duration;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let (mut gateway_io, ventilator_io) = tokio::io::duplex(1024);
        tokio::spawn(run_virtual_ventilator(
            ventilator_io,
            VirtualVentilatorConfig {
                breath_interval: Duration::from_millis(10),
                ..Default::default()
            },
        ));

        // Nothing arrives before activation
        let mut buffer = [0u8; 256];
        let quiet =
            tokio::time::timeout(Duration::from_millis(50), gateway_io.read(&mut buffer)).await;
        assert!(quiet.is_err(), "ventilator reported before activation");

        gateway_io
            .write_all(&build_activation_command())
            .await
            .unwrap();

        // Mode frame first, breath frames after; collect until one decodes
        let mut codec = vent_protocol::FrameCodec::new();
        let breath = loop {
            let n = tokio::time::timeout(Duration::from_secs(2), gateway_io.read(&mut buffer))
                .await
                .expect("timed out waiting for ventilator output")
                .unwrap();
            codec.push_bytes(&buffer[..n]);
            let found = std::iter::from_fn(|| codec.next_frame())
                .filter_map(|frame| {
                    let payload = validate_frame(&frame).ok()?;
                    decode_parameters(payload)?
                        .into_iter()
                        .find(|r| r.parameter == "Breath Number")
                })
                .next();
            if let Some(reading) = found {
                break reading.value;
            }
        };

        assert_eq!(breath, "1");
    }
}
