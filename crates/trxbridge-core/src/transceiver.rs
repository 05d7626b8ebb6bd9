//! The `Transceiver` trait -- the radio operations the PTY bridge drives.
//!
//! The bridge programs against `dyn Transceiver` so that it does not depend
//! on a particular wire protocol. Implementations own their device
//! connection and absorb every connection failure themselves (logging it and
//! scheduling a reconnect), which is why none of these methods return a
//! `Result`: from the caller's point of view a radio operation always
//! "succeeds", and the commanded value is remembered and re-applied once the
//! device is reachable again.

use async_trait::async_trait;

use crate::types::TransceiverState;

/// Radio operations on a single transceiver.
#[async_trait]
pub trait Transceiver: Send {
    /// Last commanded configuration and last sampled squelch state.
    fn state(&self) -> &TransceiverState;

    /// Set the receive frequency in hertz.
    async fn set_rx_freq(&mut self, freq_hz: u64);

    /// Set the transmit frequency in hertz.
    async fn set_tx_freq(&mut self, freq_hz: u64);

    /// Set the transmit power level (device-defined unit, passed through
    /// unchanged).
    async fn set_tx_power(&mut self, level: u32);

    /// Set the receive modulation from a protocol token such as `"FM"`.
    ///
    /// Unsupported tokens are logged and ignored.
    async fn set_rx_mod(&mut self, token: &str);

    /// Set the transmit modulation from a protocol token such as `"FM"`.
    ///
    /// Unsupported tokens are logged and ignored.
    async fn set_tx_mod(&mut self, token: &str);

    /// Key (`true`) or unkey (`false`) the transmitter.
    async fn set_tx_on(&mut self, on: bool);

    /// Sample the squelch. Returns `true` while a signal is received.
    async fn squelch_open(&mut self) -> bool;
}
