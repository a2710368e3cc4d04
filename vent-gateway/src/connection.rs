//! Async serial I/O for the ventilator connection
//!
//! Non-blocking serial communication using tokio_serial. The connection
//! runs in its own task: inbound bytes are forwarded to the gateway actor
//! as [`GatewayCommand::SerialData`], outbound byte buffers arrive on a
//! channel and are written to the port.
//!
//! The connection is generic over its I/O type so tests and the simulator
//! can substitute `DuplexStream` from `tokio::io::duplex()` for a real
//! port.

use std::io::ErrorKind;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info, warn};

use crate::actor::GatewayCommand;
use crate::events::GatewayEvent;

/// Async connection to the ventilator's byte channel
pub struct SerialConnection<T> {
    port_name: String,
    io: T,
    read_timeout: Duration,
    cmd_tx: mpsc::Sender<GatewayCommand>,
    event_tx: mpsc::Sender<GatewayEvent>,
    buffer: Vec<u8>,
}

impl SerialConnection<SerialStream> {
    /// Open a serial port connection
    pub fn connect(
        port_name: &str,
        baud_rate: u32,
        read_timeout: Duration,
        cmd_tx: mpsc::Sender<GatewayCommand>,
        event_tx: mpsc::Sender<GatewayEvent>,
    ) -> Result<Self, tokio_serial::Error> {
        let stream = tokio_serial::new(port_name, baud_rate)
            .timeout(Duration::from_millis(100))
            .open_native_async()?;

        Ok(Self::new(
            port_name.to_string(),
            stream,
            read_timeout,
            cmd_tx,
            event_tx,
        ))
    }
}

impl<T> SerialConnection<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Create a connection over a custom I/O type
    ///
    /// For tests, use `DuplexStream` from `tokio::io::duplex()`.
    pub fn new(
        port_name: String,
        io: T,
        read_timeout: Duration,
        cmd_tx: mpsc::Sender<GatewayCommand>,
        event_tx: mpsc::Sender<GatewayEvent>,
    ) -> Self {
        Self {
            port_name,
            io,
            read_timeout,
            cmd_tx,
            event_tx,
            buffer: vec![0u8; 1024],
        }
    }

    /// Drive the connection until the port fails or `data_rx` closes.
    ///
    /// Outbound buffers received on `data_rx` are written to the port;
    /// inbound bytes are forwarded to the gateway actor. The underlying
    /// stream is dropped on every exit path, and
    /// [`GatewayEvent::SerialDisconnected`] is emitted when the loop ends.
    pub async fn run_io_loop(mut self, mut data_rx: mpsc::Receiver<Vec<u8>>) {
        info!("serial I/O loop started on {}", self.port_name);

        let _ = self
            .event_tx
            .send(GatewayEvent::SerialConnected {
                port: self.port_name.clone(),
            })
            .await;

        loop {
            tokio::select! {
                outbound = data_rx.recv() => {
                    let Some(data) = outbound else {
                        debug!("outbound channel closed, stopping I/O loop");
                        break;
                    };
                    if let Err(e) = self.write(&data).await {
                        warn!("write error on {}: {}", self.port_name, e);
                        let _ = self.event_tx.send(GatewayEvent::Error {
                            source: "Serial".to_string(),
                            message: format!("Write failed: {}", e),
                        }).await;
                        break;
                    }
                }

                result = tokio::time::timeout(
                    self.read_timeout,
                    self.io.read(&mut self.buffer)
                ) => {
                    match result {
                        Ok(Ok(0)) => {
                            debug!("{} reached end of stream", self.port_name);
                            break;
                        }
                        Ok(Ok(n)) => {
                            let data = &self.buffer[..n];
                            debug!("read {} bytes from {}: {:02X?}", n, self.port_name, data);

                            if self.cmd_tx.send(GatewayCommand::SerialData {
                                data: data.to_vec(),
                            }).await.is_err() {
                                debug!("gateway actor gone, stopping I/O loop");
                                break;
                            }
                        }
                        Ok(Err(e)) => {
                            if e.kind() == ErrorKind::WouldBlock {
                                continue;
                            }
                            warn!("read error on {}: {}", self.port_name, e);
                            let _ = self.event_tx.send(GatewayEvent::Error {
                                source: "Serial".to_string(),
                                message: format!("Read error: {}", e),
                            }).await;
                            break;
                        }
                        Err(_) => {} // read timeout, poll again
                    }
                }
            }
        }

        info!("serial I/O loop ended on {}", self.port_name);
        let _ = self.event_tx.send(GatewayEvent::SerialDisconnected).await;
    }

    async fn write(&mut self, data: &[u8]) -> Result<(), std::io::Error> {
        self.io.write_all(data).await?;
        self.io.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_inbound_bytes_reach_the_actor_channel() {
        let (cmd_tx, mut cmd_rx) = mpsc::channel(16);
        let (event_tx, mut event_rx) = mpsc::channel(16);
        let (gateway_io, mut device_io) = tokio::io::duplex(256);

        let connection = SerialConnection::new(
            "duplex".to_string(),
            gateway_io,
            Duration::from_millis(10),
            cmd_tx,
            event_tx,
        );
        let (_data_tx, data_rx) = mpsc::channel(4);
        let io_task = tokio::spawn(connection.run_io_loop(data_rx));

        assert!(matches!(
            event_rx.recv().await,
            Some(GatewayEvent::SerialConnected { .. })
        ));

        device_io.write_all(&[0x02, 0x31, 0x03]).await.unwrap();

        match cmd_rx.recv().await {
            Some(GatewayCommand::SerialData { data }) => {
                assert_eq!(data, vec![0x02, 0x31, 0x03]);
            }
            other => panic!("expected SerialData, got {:?}", other),
        }

        drop(device_io);
        io_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_outbound_bytes_reach_the_device() {
        let (cmd_tx, _cmd_rx) = mpsc::channel(16);
        let (event_tx, _event_rx) = mpsc::channel(16);
        let (gateway_io, mut device_io) = tokio::io::duplex(256);

        let connection = SerialConnection::new(
            "duplex".to_string(),
            gateway_io,
            Duration::from_millis(10),
            cmd_tx,
            event_tx,
        );
        let (data_tx, data_rx) = mpsc::channel(4);
        let io_task = tokio::spawn(connection.run_io_loop(data_rx));

        data_tx.send(vec![0xAB, 0xCD]).await.unwrap();

        let mut buf = [0u8; 2];
        device_io.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf, [0xAB, 0xCD]);

        drop(data_tx);
        io_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_disconnect_event_when_peer_closes() {
        let (cmd_tx, _cmd_rx) = mpsc::channel(16);
        let (event_tx, mut event_rx) = mpsc::channel(16);
        let (gateway_io, device_io) = tokio::io::duplex(256);

        let connection = SerialConnection::new(
            "duplex".to_string(),
            gateway_io,
            Duration::from_millis(10),
            cmd_tx,
            event_tx,
        );
        let (_data_tx, data_rx) = mpsc::channel(4);
        let io_task = tokio::spawn(connection.run_io_loop(data_rx));

        drop(device_io);

        let mut saw_disconnect = false;
        while let Some(event) = event_rx.recv().await {
            if matches!(event, GatewayEvent::SerialDisconnected) {
                saw_disconnect = true;
                break;
            }
        }
        assert!(saw_disconnect);
        io_task.await.unwrap();
    }
}
