//! VentLink Gateway Binary
//!
//! Connects to a Hamilton ventilator over a serial port and writes one
//! HL7 observation message per breath cycle. Reconnects with a configured
//! delay when the port fails; shuts down cleanly on ctrl-c.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vent_gateway::{
    run_gateway, FileSink, GatewayCommand, GatewayConfig, GatewayError, GatewayEvent,
    GatewayOptions, SerialConnection,
};

/// How one gateway session ended
enum SessionEnd {
    /// Operator requested shutdown
    Shutdown,
    /// Transport closed or failed; caller should reconnect
    Disconnected,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ventlink=info,vent_gateway=info,vent_protocol=info,vent_hl7=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("ventlink.json"));
    let config = GatewayConfig::load(&config_path);

    info!(
        "starting VentLink gateway on {} at {} baud",
        config.port, config.baud_rate
    );

    loop {
        match run_session(&config).await {
            Ok(SessionEnd::Shutdown) => {
                info!("shutdown requested, exiting");
                break;
            }
            Ok(SessionEnd::Disconnected) => {
                info!(
                    "connection lost, retrying in {}s",
                    config.reconnect_delay_secs
                );
            }
            Err(e) => {
                error!(
                    "could not open {}: {}, retrying in {}s",
                    config.port, e, config.reconnect_delay_secs
                );
            }
        }
        tokio::time::sleep(Duration::from_secs(config.reconnect_delay_secs)).await;
    }
}

/// Run one connect-process-disconnect session
async fn run_session(config: &GatewayConfig) -> Result<SessionEnd, GatewayError> {
    let (cmd_tx, cmd_rx) = mpsc::channel(256);
    let (event_tx, mut event_rx) = mpsc::channel(256);
    let (serial_tx, serial_rx) = mpsc::channel(32);

    let connection = SerialConnection::connect(
        &config.port,
        config.baud_rate,
        Duration::from_millis(config.read_timeout_ms),
        cmd_tx.clone(),
        event_tx.clone(),
    )?;

    let io_task = tokio::spawn(connection.run_io_loop(serial_rx));
    let actor_task = tokio::spawn(run_gateway(
        cmd_rx,
        event_tx,
        serial_tx,
        Box::new(FileSink::new(&config.output_dir)),
        GatewayOptions {
            patient_id: config.patient_id.clone(),
            resend_interval: Duration::from_secs(config.resend_interval_secs),
        },
    ));

    let outcome = loop {
        tokio::select! {
            event = event_rx.recv() => {
                match event {
                    Some(GatewayEvent::SerialConnected { port }) => {
                        info!("connected to {}", port);
                    }
                    Some(GatewayEvent::BreathDetected { breath_number }) => {
                        info!("breath {} started", breath_number);
                    }
                    Some(GatewayEvent::MessageEmitted { filename }) => {
                        info!("observation message written: {}", filename);
                    }
                    Some(GatewayEvent::Error { source, message }) => {
                        error!("{}: {}", source, message);
                    }
                    Some(GatewayEvent::SerialDisconnected) | None => {
                        break SessionEnd::Disconnected;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break SessionEnd::Shutdown;
            }
        }
    };

    // Stop the actor; its serial sender drops and the I/O loop follows
    let _ = cmd_tx.send(GatewayCommand::Shutdown).await;
    let _ = actor_task.await;
    let _ = io_task.await;

    Ok(outcome)
}
