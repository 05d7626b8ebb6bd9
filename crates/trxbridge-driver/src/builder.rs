//! TransceiverBuilder -- fluent builder for constructing [`TransceiverDriver`]
//! instances.
//!
//! Separates configuration from construction so that callers can set the
//! serial port parameters and the initial radio configuration before the
//! first open attempt.
//!
//! # Example
//!
//! ```no_run
//! use trxbridge_driver::TransceiverBuilder;
//!
//! # async fn example() -> trxbridge_core::Result<()> {
//! let driver = TransceiverBuilder::new()
//!     .serial_port("/dev/ttyUSB0")
//!     .rx_freq(145_500_000)
//!     .tx_power(2)
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use trxbridge_core::error::{Error, Result};
use trxbridge_core::transport::Connector;
use trxbridge_core::types::{DEFAULT_RX_FREQ_HZ, DEFAULT_TX_POWER, TransceiverState};
use trxbridge_transport::{SerialConfig, SerialConnector};

use crate::driver::TransceiverDriver;

/// Fluent builder for [`TransceiverDriver`].
pub struct TransceiverBuilder {
    serial_port: Option<String>,
    baud_rate: u32,
    connector: Option<Box<dyn Connector>>,
    rx_freq_hz: u64,
    tx_freq_hz: Option<u64>,
    tx_power: u32,
}

impl TransceiverBuilder {
    /// Create a builder with the transceiver defaults.
    pub fn new() -> Self {
        TransceiverBuilder {
            serial_port: None,
            baud_rate: SerialConfig::default().baud_rate,
            connector: None,
            rx_freq_hz: DEFAULT_RX_FREQ_HZ,
            tx_freq_hz: None,
            tx_power: DEFAULT_TX_POWER,
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Override the default baud rate (9600).
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = baud;
        self
    }

    /// Use a custom connector instead of a serial port.
    ///
    /// Takes precedence over [`serial_port`](Self::serial_port). Mostly
    /// useful for tests with the mocks from `trxbridge-test-harness`.
    pub fn connector(mut self, connector: Box<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Initial receive frequency in hertz (default 145.500 MHz).
    pub fn rx_freq(mut self, freq_hz: u64) -> Self {
        self.rx_freq_hz = freq_hz;
        self
    }

    /// Initial transmit frequency in hertz (default: the receive frequency).
    pub fn tx_freq(mut self, freq_hz: u64) -> Self {
        self.tx_freq_hz = Some(freq_hz);
        self
    }

    /// Initial transmit power level (default 0).
    pub fn tx_power(mut self, level: u32) -> Self {
        self.tx_power = level;
        self
    }

    /// Build the driver and make the first open attempt.
    ///
    /// A device that cannot be opened is not an error here: the driver
    /// starts disconnected with a reopen scheduled. Errors are returned only
    /// for an invalid configuration.
    pub async fn build(self) -> Result<TransceiverDriver> {
        let tx_freq_hz = self.tx_freq_hz.unwrap_or(self.rx_freq_hz);
        if self.rx_freq_hz == 0 || tx_freq_hz == 0 {
            return Err(Error::InvalidParameter(
                "frequencies must be positive".into(),
            ));
        }

        let connector: Box<dyn Connector> = match (self.connector, self.serial_port) {
            (Some(connector), _) => connector,
            (None, Some(port)) => {
                let config = SerialConfig {
                    baud_rate: self.baud_rate,
                    ..Default::default()
                };
                Box::new(SerialConnector::new(&port, config))
            }
            (None, None) => {
                return Err(Error::InvalidParameter(
                    "serial port path is required".into(),
                ));
            }
        };

        let state = TransceiverState {
            rx_freq_hz: self.rx_freq_hz,
            tx_freq_hz,
            tx_power: self.tx_power,
            ..Default::default()
        };

        let mut driver = TransceiverDriver::new(connector, state);
        driver.open().await;
        Ok(driver)
    }
}

impl Default for TransceiverBuilder {
    fn default() -> Self {
        Self::new()
    }
}
