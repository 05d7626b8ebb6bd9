//! PtyBridge -- the virtual serial endpoint facing the control application.
//!
//! The bridge owns the PTY connection. Bytes read from it go through a
//! [`CommandParser`] and become calls on a [`Transceiver`]; every tick it
//! samples the transceiver's squelch and reports each change as one
//! telemetry byte (`O` or `Z`).
//!
//! Connection handling mirrors the transceiver driver: failures and a
//! closed peer are logged, the endpoint is closed, and a reopen is tried
//! again after a fixed backoff.

use std::time::Duration;

use tracing::{debug, info, trace, warn};

use trxbridge_core::backoff::ReconnectBackoff;
use trxbridge_core::error::Error;
use trxbridge_core::transceiver::Transceiver;
use trxbridge_core::transport::{Connector, Transport};
use trxbridge_core::{REOPEN_BACKOFF_TICKS, format_freq_mhz};

use crate::parser::{Command, CommandParser};
use crate::protocol::{SQUELCH_CLOSED, squelch_byte};

/// Bridge between the virtual serial endpoint and a [`Transceiver`].
///
/// Constructed via [`PtyBridgeBuilder`](crate::builder::PtyBridgeBuilder).
pub struct PtyBridge {
    connector: Box<dyn Connector>,
    transport: Option<Box<dyn Transport>>,
    backoff: ReconnectBackoff,
    parser: CommandParser,
    /// Squelch state last reported to the control application.
    squelch_open: bool,
}

impl PtyBridge {
    pub(crate) fn new(connector: Box<dyn Connector>) -> Self {
        PtyBridge {
            connector,
            transport: None,
            backoff: ReconnectBackoff::new(),
            parser: CommandParser::new(),
            squelch_open: false,
        }
    }

    /// PTY path, for logging.
    pub fn name(&self) -> &str {
        self.connector.name()
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    pub fn backoff(&self) -> &ReconnectBackoff {
        &self.backoff
    }

    pub fn parser(&self) -> &CommandParser {
        &self.parser
    }

    /// Squelch state last reported on the endpoint.
    pub fn squelch_open(&self) -> bool {
        self.squelch_open
    }

    /// (Re)acquire the endpoint.
    ///
    /// If the endpoint is held and the control application was last told the
    /// squelch is open, a closing `Z` is sent before letting go. The parser
    /// and the reported squelch state always start over.
    pub async fn open(&mut self) {
        if self.transport.is_some() && self.squelch_open {
            self.write_byte(SQUELCH_CLOSED).await;
        }
        self.close().await;
        self.parser.reset();
        self.squelch_open = false;

        match self.connector.connect().await {
            Ok(transport) => {
                info!(pty = %self.connector.name(), "PTY connected");
                self.transport = Some(transport);
                self.backoff.clear();
            }
            Err(e) => {
                warn!(
                    pty = %self.connector.name(),
                    error = %e,
                    retry_ticks = REOPEN_BACKOFF_TICKS,
                    "could not open PTY"
                );
                self.backoff.schedule();
            }
        }
    }

    /// Release the endpoint if held. Idempotent.
    pub async fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            if let Err(e) = transport.close().await {
                debug!(pty = %self.connector.name(), error = %e, "error while closing PTY");
            }
            info!(pty = %self.connector.name(), "PTY closed");
        }
    }

    /// Force a close and schedule a fresh backoff cycle.
    pub async fn reopen(&mut self) {
        self.backoff.schedule();
        self.close().await;
    }

    /// Periodic work: advance the reopen countdown, then sample the squelch
    /// and report a change.
    pub async fn tick(&mut self, trx: &mut dyn Transceiver) {
        if self.transport.is_none() && self.backoff.tick() {
            debug!(pty = %self.connector.name(), "reopening PTY");
            self.open().await;
        }

        let open = trx.squelch_open().await;
        if open == self.squelch_open || self.transport.is_none() {
            return;
        }
        self.squelch_open = open;
        info!("the squelch is {}", if open { "OPEN" } else { "CLOSED" });
        self.write_byte(squelch_byte(open)).await;
    }

    /// Wait up to `timeout` for bytes from the control application.
    ///
    /// `Some(0)` means the peer closed its side; pass it on to
    /// [`handle_input`](Self::handle_input) like any other read. Read
    /// failures are handled here. Cancel-safe.
    pub async fn poll_input(&mut self, buf: &mut [u8], timeout: Duration) -> Option<usize> {
        let Some(transport) = self.transport.as_mut() else {
            tokio::time::sleep(timeout).await;
            return None;
        };

        let result = transport.receive(buf, timeout).await;
        match result {
            Ok(n) => Some(n),
            Err(Error::Timeout) => None,
            Err(e) => {
                self.handle_io_error("read", e).await;
                None
            }
        }
    }

    /// Decode bytes read from the endpoint and drive the transceiver.
    ///
    /// An empty slice is a zero-length read: the peer is gone, so the
    /// endpoint is closed and a reopen scheduled.
    pub async fn handle_input(&mut self, data: &[u8], trx: &mut dyn Transceiver) {
        if data.is_empty() {
            self.handle_io_error("read", Error::PeerDisconnected).await;
            return;
        }
        trace!(pty = %self.connector.name(), bytes = ?data, "PTY input");

        for &byte in data {
            match self.parser.feed(byte) {
                Ok(Some(command)) => dispatch(command, trx).await,
                Ok(None) => {}
                Err(e) => {
                    warn!(pty = %self.connector.name(), error = %e, "dropping PTY command");
                }
            }
        }
    }

    async fn write_byte(&mut self, byte: u8) {
        let Some(transport) = self.transport.as_mut() else {
            return;
        };
        trace!(pty = %self.connector.name(), byte = %char::from(byte), "PTY output");
        let result = transport.send(&[byte]).await;
        if let Err(e) = result {
            self.handle_io_error("write", e).await;
        }
    }

    /// Absorb an endpoint I/O failure.
    async fn handle_io_error(&mut self, op: &str, e: Error) {
        if e.is_connection_error() {
            warn!(
                pty = %self.connector.name(),
                op,
                error = %e,
                retry_ticks = REOPEN_BACKOFF_TICKS,
                "PTY not connected"
            );
            self.reopen().await;
        } else {
            warn!(pty = %self.connector.name(), op, error = %e, "PTY operation failed");
        }
    }
}

async fn dispatch(command: Command, trx: &mut dyn Transceiver) {
    debug!(?command, "PTY command");
    match command {
        Command::TxOn => trx.set_tx_on(true).await,
        Command::TxOff => trx.set_tx_on(false).await,
        Command::SetTxFreq(hz) => {
            debug!(freq = %format_freq_mhz(hz), "TX frequency requested");
            trx.set_tx_freq(hz).await;
        }
        Command::SetRxFreq(hz) => {
            debug!(freq = %format_freq_mhz(hz), "RX frequency requested");
            trx.set_rx_freq(hz).await;
        }
        Command::SetTxMod(token) => trx.set_tx_mod(&token).await,
        Command::SetRxMod(token) => trx.set_rx_mod(&token).await,
    }
}
