//! Gateway Actor
//!
//! Owns the full decode pipeline: raw bytes from the connection task are
//! reassembled into frames, validated, decoded, and merged into the
//! ventilator state. Crossing a breath boundary snapshots the state,
//! builds an HL7 observation message, and hands it to the sink.
//!
//! The actor also owns the activation resend timer: the ventilator drops
//! out of mixed mode when it stops hearing the activation command, so the
//! command goes out immediately on startup and on a fixed interval after
//! that. Timer and decode pipeline share nothing but this task's state,
//! so no frame is ever half-processed when the timer fires.
//!
//! # Example
//!
//! ```rust,ignore
//! use vent_gateway::actor::{run_gateway, GatewayCommand, GatewayOptions};
//! use tokio::sync::mpsc;
//!
//! let (cmd_tx, cmd_rx) = mpsc::channel(256);
//! let (event_tx, mut event_rx) = mpsc::channel(256);
//! let (serial_tx, serial_rx) = mpsc::channel(32);
//!
//! tokio::spawn(run_gateway(cmd_rx, event_tx, serial_tx, sink, options));
//! ```

use std::time::Duration;

use chrono::Local;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use vent_hl7::{build_message, MessageError, VentilatorState};
use vent_protocol::{
    build_activation_command, decode_parameters, validate_frame, FrameCodec, FrameError,
};

use crate::events::GatewayEvent;
use crate::sink::MessageSink;

/// Commands sent to the gateway actor
#[derive(Debug)]
pub enum GatewayCommand {
    /// Raw bytes read from the serial line
    SerialData {
        /// The bytes, in arrival order
        data: Vec<u8>,
    },

    /// Shut the actor down
    Shutdown,
}

/// Runtime options for the gateway actor
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    /// Patient identifier placed in every emitted message
    pub patient_id: String,
    /// How often the activation command is resent
    pub resend_interval: Duration,
}

/// Internal state for the gateway actor
struct GatewayState {
    codec: FrameCodec,
    ventilator: VentilatorState,
    patient_id: String,
}

/// Run the gateway actor.
///
/// Processes serial data into observation messages until `cmd_rx` closes
/// or [`GatewayCommand::Shutdown`] arrives. Outbound activation commands
/// are sent through `serial_tx`; all observable activity is emitted on
/// `event_tx`.
pub async fn run_gateway(
    mut cmd_rx: mpsc::Receiver<GatewayCommand>,
    event_tx: mpsc::Sender<GatewayEvent>,
    serial_tx: mpsc::Sender<Vec<u8>>,
    mut sink: Box<dyn MessageSink>,
    options: GatewayOptions,
) {
    let mut state = GatewayState {
        codec: FrameCodec::new(),
        ventilator: VentilatorState::new(),
        patient_id: options.patient_id,
    };

    info!("gateway actor started");

    // First tick fires immediately, activating the ventilator on connect
    let mut resend_timer = interval(options.resend_interval);
    resend_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(GatewayCommand::SerialData { data }) => {
                        state.codec.push_bytes(&data);
                        while let Some(frame) = state.codec.next_frame() {
                            process_frame(&mut state, &event_tx, &mut sink, &frame).await;
                        }
                    }
                    Some(GatewayCommand::Shutdown) | None => {
                        info!("gateway actor shutting down");
                        break;
                    }
                }
            }
            _ = resend_timer.tick() => {
                let command = build_activation_command();
                info!("sending activation command: {:02X?}", command);
                if serial_tx.send(command).await.is_err() {
                    info!("serial connection gone, gateway actor stopping");
                    break;
                }
            }
        }
    }

    info!("gateway actor stopped");
}

/// Validate, decode and merge one extracted frame, emitting an
/// observation message when it completes a breath boundary.
///
/// All failure modes are local to the frame: the stream continues.
async fn process_frame(
    state: &mut GatewayState,
    event_tx: &mpsc::Sender<GatewayEvent>,
    sink: &mut Box<dyn MessageSink>,
    frame: &[u8],
) {
    let payload = match validate_frame(frame) {
        Ok(payload) => payload,
        Err(e @ FrameError::ChecksumMismatch { .. }) => {
            error!("discarding frame {:02X?}: {}", frame, e);
            return;
        }
        Err(e) => {
            warn!("discarding frame {:02X?}: {}", frame, e);
            return;
        }
    };

    let Some(readings) = decode_parameters(payload) else {
        debug!("ignoring reply to another command class");
        return;
    };

    let Some(breath_number) = state.ventilator.merge(&readings) else {
        return;
    };

    info!("new breath detected (no. {})", breath_number);
    let _ = event_tx
        .send(GatewayEvent::BreathDetected {
            breath_number: breath_number.clone(),
        })
        .await;

    let snapshot = state.ventilator.snapshot();
    let message = match build_message(&snapshot, &state.patient_id, Local::now()) {
        Ok(message) => message,
        Err(MessageError::EmptySnapshot) => {
            warn!("no data to generate observation message");
            return;
        }
    };

    match sink.deliver(&message) {
        Ok(()) => {
            let _ = event_tx
                .send(GatewayEvent::MessageEmitted {
                    filename: message.filename.clone(),
                })
                .await;
        }
        Err(e) => {
            error!("failed to deliver observation message: {}", e);
            let _ = event_tx
                .send(GatewayEvent::Error {
                    source: "Sink".to_string(),
                    message: e.to_string(),
                })
                .await;
        }
    }
}
