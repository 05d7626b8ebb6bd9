//! TransceiverDriver -- the [`Transceiver`] implementation for the physical
//! radio.
//!
//! The driver owns the serial connection exclusively. Radio operations are
//! remembered in a [`TransceiverState`] and, while the port is open, written
//! out as wire lines (see [`commands`]) or applied to the modem lines:
//! DTR keys the transmitter and DCD reports the squelch.
//!
//! Every device I/O call is wrapped: a failure is logged and turned into a
//! reopen with backoff, so no error ever leaves the driver. When the port
//! comes back, the last commanded transmitter state, power, and frequencies
//! are re-asserted so the radio resumes where it was.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use trxbridge_core::backoff::ReconnectBackoff;
use trxbridge_core::error::Error;
use trxbridge_core::transceiver::Transceiver;
use trxbridge_core::transport::{Connector, Transport};
use trxbridge_core::types::{Modulation, TransceiverState};
use trxbridge_core::{REOPEN_BACKOFF_TICKS, format_freq_mhz};

use crate::commands;
use crate::protocol::{LineBuffer, LineEvent};

/// The only modulation this transceiver can do, on either side.
pub const SUPPORTED_MODULATION: Modulation = Modulation::FM;

/// Driver for a transceiver controlled over the ASCII line protocol.
///
/// Constructed via [`TransceiverBuilder`](crate::builder::TransceiverBuilder).
pub struct TransceiverDriver {
    connector: Box<dyn Connector>,
    transport: Option<Box<dyn Transport>>,
    backoff: ReconnectBackoff,
    state: TransceiverState,
    /// Partial telemetry line from the transceiver.
    line_buf: LineBuffer,
}

impl TransceiverDriver {
    /// Create a driver without touching the device.
    ///
    /// Called by the builder, which opens the port right after.
    pub(crate) fn new(connector: Box<dyn Connector>, state: TransceiverState) -> Self {
        TransceiverDriver {
            connector,
            transport: None,
            backoff: ReconnectBackoff::new(),
            state,
            line_buf: LineBuffer::new(),
        }
    }

    /// Device name (the serial port path) for logging.
    pub fn name(&self) -> &str {
        self.connector.name()
    }

    /// Whether the serial connection is currently held.
    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// The reopen countdown.
    pub fn backoff(&self) -> &ReconnectBackoff {
        &self.backoff
    }

    /// Try to acquire the serial device.
    ///
    /// On success the full commanded state is re-asserted on the device. On
    /// failure the connection stays unset and a reopen is scheduled
    /// [`REOPEN_BACKOFF_TICKS`] ticks from now.
    pub async fn open(&mut self) {
        self.close().await;

        match self.connector.connect().await {
            Ok(transport) => {
                info!(port = %self.connector.name(), "transceiver connected");
                self.transport = Some(transport);
                self.backoff.clear();
                self.line_buf.clear();
                self.reassert_state().await;
            }
            Err(e) => {
                warn!(
                    port = %self.connector.name(),
                    error = %e,
                    retry_ticks = REOPEN_BACKOFF_TICKS,
                    "could not open serial port"
                );
                self.backoff.schedule();
            }
        }
    }

    /// Release the device if held. Idempotent.
    pub async fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            self.line_buf.clear();
            if let Err(e) = transport.close().await {
                debug!(port = %self.connector.name(), error = %e, "error while closing serial port");
            }
        }
    }

    /// Force a close and schedule a fresh backoff cycle.
    ///
    /// The countdown is armed before the close is awaited, so dropping this
    /// future part way still leaves the driver retrying.
    pub async fn reopen(&mut self) {
        self.backoff.schedule();
        self.close().await;
    }

    /// Advance the reopen countdown; opens the device when it is due.
    ///
    /// No-op while connected.
    pub async fn tick(&mut self) {
        if self.transport.is_none() && self.backoff.tick() {
            debug!(port = %self.connector.name(), "reopening serial port");
            self.open().await;
        }
    }

    /// Wait up to `timeout` for telemetry from the transceiver.
    ///
    /// Returns the number of bytes placed in `buf`, or `None` when nothing
    /// arrived. Read failures and end-of-file are handled here as a
    /// connection loss. Without a connection this just waits out the
    /// timeout. Cancel-safe.
    pub async fn poll_input(&mut self, buf: &mut [u8], timeout: Duration) -> Option<usize> {
        let Some(transport) = self.transport.as_mut() else {
            tokio::time::sleep(timeout).await;
            return None;
        };

        let result = transport.receive(buf, timeout).await;
        match result {
            Ok(0) => {
                self.handle_io_error("read", Error::PeerDisconnected).await;
                None
            }
            Ok(n) => Some(n),
            Err(Error::Timeout) => None,
            Err(e) => {
                self.handle_io_error("read", e).await;
                None
            }
        }
    }

    /// Consume telemetry bytes read from the transceiver.
    ///
    /// Lines are only echoed to the log; they carry nothing the bridge acts on.
    pub async fn handle_input(&mut self, data: &[u8]) {
        for event in self.line_buf.push(data) {
            match event {
                LineEvent::Line(line) => {
                    debug!(port = %self.connector.name(), "<{line}");
                }
                LineEvent::Overflow(dropped) => {
                    warn!(
                        port = %self.connector.name(),
                        dropped,
                        "over-long line from transceiver discarded"
                    );
                }
            }
        }
    }

    /// Write the commanded state back onto a freshly opened device.
    async fn reassert_state(&mut self) {
        let state = self.state.clone();
        self.write_tx_on(state.tx_on).await;
        self.write_line(commands::cmd_set_tx_power(state.tx_power)).await;
        self.write_line(commands::cmd_set_rx_freq(state.rx_freq_hz)).await;
        self.write_line(commands::cmd_set_tx_freq(state.tx_freq_hz)).await;
    }

    /// Send one wire line if connected.
    async fn write_line(&mut self, line: Vec<u8>) {
        let Some(transport) = self.transport.as_mut() else {
            return;
        };
        debug!(
            port = %self.connector.name(),
            ">{}",
            String::from_utf8_lossy(&line).trim_end()
        );
        let result = transport.send(&line).await;
        if let Err(e) = result {
            self.handle_io_error("write", e).await;
        }
    }

    /// Drive the transmitter keying line if connected.
    async fn write_tx_on(&mut self, on: bool) {
        let Some(transport) = self.transport.as_mut() else {
            return;
        };
        let result = transport.set_dtr(on).await;
        if let Err(e) = result {
            self.handle_io_error("set DTR", e).await;
        }
    }

    /// Absorb a device I/O failure.
    ///
    /// Connection errors close the port and schedule a reopen; anything else
    /// is only logged.
    async fn handle_io_error(&mut self, op: &str, e: Error) {
        if e.is_connection_error() {
            warn!(
                port = %self.connector.name(),
                op,
                error = %e,
                retry_ticks = REOPEN_BACKOFF_TICKS,
                "lost serial port connection"
            );
            self.reopen().await;
        } else {
            warn!(port = %self.connector.name(), op, error = %e, "serial port operation failed");
        }
    }
}

/// Validate a modulation token for one side of the radio.
fn check_modulation(side: &str, token: &str) -> Result<Modulation, Error> {
    match token.parse::<Modulation>() {
        Ok(m) if m == SUPPORTED_MODULATION => Ok(m),
        _ => Err(Error::Protocol(format!(
            "this {side} can only handle {SUPPORTED_MODULATION} modulation, not {token}"
        ))),
    }
}

#[async_trait]
impl Transceiver for TransceiverDriver {
    fn state(&self) -> &TransceiverState {
        &self.state
    }

    async fn set_rx_freq(&mut self, freq_hz: u64) {
        if freq_hz == 0 {
            warn!("ignoring receive frequency of 0 Hz");
            return;
        }
        info!(freq = %format_freq_mhz(freq_hz), "set RX frequency");
        self.state.rx_freq_hz = freq_hz;
        self.write_line(commands::cmd_set_rx_freq(freq_hz)).await;
    }

    async fn set_tx_freq(&mut self, freq_hz: u64) {
        if freq_hz == 0 {
            warn!("ignoring transmit frequency of 0 Hz");
            return;
        }
        info!(freq = %format_freq_mhz(freq_hz), "set TX frequency");
        self.state.tx_freq_hz = freq_hz;
        self.write_line(commands::cmd_set_tx_freq(freq_hz)).await;
    }

    async fn set_tx_power(&mut self, level: u32) {
        info!(level, "set TX power");
        self.state.tx_power = level;
        self.write_line(commands::cmd_set_tx_power(level)).await;
    }

    async fn set_rx_mod(&mut self, token: &str) {
        match check_modulation("receiver", token) {
            Ok(m) => {
                info!(modulation = %m, "set RX modulation");
                self.state.rx_mod = m;
            }
            Err(e) => warn!(port = %self.connector.name(), error = %e, "RX modulation ignored"),
        }
    }

    async fn set_tx_mod(&mut self, token: &str) {
        match check_modulation("transmitter", token) {
            Ok(m) => {
                info!(modulation = %m, "set TX modulation");
                self.state.tx_mod = m;
            }
            Err(e) => warn!(port = %self.connector.name(), error = %e, "TX modulation ignored"),
        }
    }

    async fn set_tx_on(&mut self, on: bool) {
        info!("turning transmitter {}", if on { "ON" } else { "OFF" });
        self.state.tx_on = on;
        self.write_tx_on(on).await;
    }

    async fn squelch_open(&mut self) -> bool {
        let result = match self.transport.as_mut() {
            Some(transport) => transport.carrier_detect().await,
            None => {
                self.state.squelch_open = false;
                return false;
            }
        };

        match result {
            Ok(open) => {
                self.state.squelch_open = open;
                open
            }
            Err(e) => {
                let previous = self.state.squelch_open;
                self.handle_io_error("read DCD", e).await;
                previous
            }
        }
    }
}
