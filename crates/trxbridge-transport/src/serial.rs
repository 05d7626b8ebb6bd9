//! Serial port transport for the transceiver and the virtual endpoint.
//!
//! This module provides [`SerialTransport`], which implements the [`Transport`]
//! trait on top of `tokio-serial`, and [`SerialConnector`], which reopens it
//! after a connection loss.
//!
//! Two kinds of device go through here:
//! - the physical transceiver port (9600 baud 8N1, DTR keys the transmitter,
//!   DCD reports the squelch)
//! - the PTY slave the control application talks to. A PTY is a terminal
//!   device too, so it is opened the same way; it has no modem control
//!   lines, so the connector leaves them alone.
//!
//! # Example
//!
//! ```no_run
//! use trxbridge_transport::SerialTransport;
//! use trxbridge_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> trxbridge_core::Result<()> {
//! let mut transport = SerialTransport::open("/dev/ttyUSB0", 9600).await?;
//!
//! transport.send(b"RFQ 145500\n").await?;
//! let squelch_open = transport.carrier_detect().await?;
//!
//! let mut buf = [0u8; 256];
//! let n = transport.receive(&mut buf, Duration::from_millis(10)).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{
    DataBits, FlowControl, Parity, SerialPort, SerialPortBuilderExt, SerialStream, StopBits,
};
use trxbridge_core::error::{Error, Result};
use trxbridge_core::transport::{Connector, Transport};

/// Serial port configuration.
///
/// Defaults match the transceiver: 9600 baud, 8 data bits, 1 stop bit,
/// no parity, no flow control, modem control lines released on open.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
    pub flow_control: FlowControl,
    /// De-assert DTR and RTS right after opening. Off for PTYs.
    pub release_control_lines: bool,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
            flow_control: FlowControl::None,
            release_control_lines: true,
        }
    }
}

impl SerialConfig {
    /// Configuration for a PTY slave: raw 8N1, modem lines untouched.
    pub fn pty() -> Self {
        Self {
            release_control_lines: false,
            ..Default::default()
        }
    }
}

/// Map an I/O error from the port to a transport error.
///
/// A pty whose master went away reports `EIO`; a yanked USB adapter
/// reports broken pipe or similar. All of them mean the connection is gone.
fn map_io_error(e: std::io::Error) -> Error {
    match e.kind() {
        std::io::ErrorKind::BrokenPipe
        | std::io::ErrorKind::NotConnected
        | std::io::ErrorKind::UnexpectedEof => Error::ConnectionLost,
        _ => Error::Io(e),
    }
}

/// Serial port transport.
pub struct SerialTransport {
    /// The underlying serial port stream
    port: Option<SerialStream>,
    /// Port name for logging/debugging
    port_name: String,
}

impl SerialTransport {
    /// Open a serial port with the given baud rate and default settings.
    ///
    /// # Arguments
    ///
    /// * `port` - Serial port path (e.g., "/dev/ttyUSB0")
    /// * `baud_rate` - Baud rate (e.g., 9600)
    pub async fn open(port: &str, baud_rate: u32) -> Result<Self> {
        let config = SerialConfig {
            baud_rate,
            ..Default::default()
        };
        Self::open_with_config(port, config).await
    }

    /// Open a serial port with full configuration control.
    pub async fn open_with_config(port: &str, config: SerialConfig) -> Result<Self> {
        tracing::debug!(
            port = %port,
            baud_rate = config.baud_rate,
            data_bits = ?config.data_bits,
            stop_bits = ?config.stop_bits,
            parity = ?config.parity,
            flow_control = ?config.flow_control,
            "Opening serial port"
        );

        let mut serial_stream = tokio_serial::new(port, config.baud_rate)
            .data_bits(config.data_bits)
            .stop_bits(config.stop_bits)
            .parity(config.parity)
            .flow_control(config.flow_control)
            .open_native_async()
            .map_err(|e| {
                Error::Transport(format!("failed to open serial port {}: {}", port, e))
            })?;

        // The transceiver keys its transmitter on DTR. Release the lines so
        // that opening the port never puts the radio on the air; the driver
        // re-asserts the commanded state right after.
        if config.release_control_lines {
            if let Err(e) = serial_stream.write_data_terminal_ready(false) {
                tracing::warn!(port = %port, error = %e, "Failed to de-assert DTR");
            }
            if let Err(e) = serial_stream.write_request_to_send(false) {
                tracing::warn!(port = %port, error = %e, "Failed to de-assert RTS");
            }
        }

        tracing::info!(port = %port, baud_rate = config.baud_rate, "Serial port opened");

        Ok(Self {
            port: Some(serial_stream),
            port_name: port.to_string(),
        })
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        tracing::trace!(
            port = %self.port_name,
            bytes = data.len(),
            data = ?data,
            "Sending data"
        );

        port.write_all(data).await.map_err(map_io_error)?;
        port.flush().await.map_err(map_io_error)?;

        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        match tokio::time::timeout(timeout, port.read(buf)).await {
            Ok(Ok(n)) => {
                tracing::trace!(
                    port = %self.port_name,
                    bytes = n,
                    data = ?&buf[..n],
                    "Received data"
                );
                Ok(n)
            }
            Ok(Err(e)) => Err(map_io_error(e)),
            Err(_) => Err(Error::Timeout),
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut port) = self.port.take() {
            if let Err(e) = port.flush().await {
                tracing::debug!(
                    port = %self.port_name,
                    error = %e,
                    "Failed to flush before closing (continuing anyway)"
                );
            }
            tracing::info!(port = %self.port_name, "Serial port closed");
        }

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    async fn set_dtr(&mut self, on: bool) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;
        port.write_data_terminal_ready(on)
            .map_err(|e| Error::Transport(format!("failed to set DTR: {e}")))
    }

    async fn carrier_detect(&mut self) -> Result<bool> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;
        port.read_carrier_detect()
            .map_err(|e| Error::Transport(format!("failed to read DCD: {e}")))
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        if self.port.is_some() {
            tracing::debug!(port = %self.port_name, "SerialTransport dropped, closing port");
        }
    }
}

/// Opens [`SerialTransport`]s to one device path with a fixed configuration.
#[derive(Debug, Clone)]
pub struct SerialConnector {
    path: String,
    config: SerialConfig,
}

impl SerialConnector {
    /// Connector for a physical serial port.
    pub fn new(path: &str, config: SerialConfig) -> Self {
        SerialConnector {
            path: path.to_string(),
            config,
        }
    }

    /// Connector for a PTY slave (see [`SerialConfig::pty`]).
    pub fn pty(path: &str) -> Self {
        Self::new(path, SerialConfig::pty())
    }

    /// The configuration used for every open.
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }
}

#[async_trait]
impl Connector for SerialConnector {
    async fn connect(&self) -> Result<Box<dyn Transport>> {
        let transport = SerialTransport::open_with_config(&self.path, self.config.clone()).await?;
        Ok(Box::new(transport))
    }

    fn name(&self) -> &str {
        &self.path
    }
}
