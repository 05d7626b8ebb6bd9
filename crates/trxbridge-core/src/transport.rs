//! Transport and connector traits for device communication.
//!
//! The [`Transport`] trait abstracts over an open byte channel to a device:
//! the physical transceiver's serial port or the virtual serial endpoint
//! (PTY) used by the control application. The [`Connector`] trait knows how
//! to (re)open such a channel, which is what the reconnect-with-backoff
//! logic in the driver and the PTY bridge needs.
//!
//! Both the driver and the bridge operate on these traits rather than on a
//! serial port directly, which allows deterministic testing with the mocks
//! from the `trxbridge-test-harness` crate.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{Error, Result};

/// Asynchronous byte-level transport to a device.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes to the device.
    ///
    /// Implementations should not return until all bytes have been written
    /// and flushed.
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes from the device into the provided buffer.
    ///
    /// Waits up to `timeout` for data. Returns the number of bytes read;
    /// `Ok(0)` means the peer closed its end. Returns
    /// [`Error::Timeout`] if nothing arrived within the deadline.
    ///
    /// Implementations must be cancel-safe: dropping the future before it
    /// completes must not lose data.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Close the transport connection.
    ///
    /// After calling `close()`, subsequent calls should return
    /// [`Error::NotConnected`].
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;

    /// Assert or release the DTR control line.
    async fn set_dtr(&mut self, _on: bool) -> Result<()> {
        Err(Error::Unsupported("DTR control line".into()))
    }

    /// Sample the carrier-detect (DCD) status line.
    async fn carrier_detect(&mut self) -> Result<bool> {
        Err(Error::Unsupported("carrier detect status line".into()))
    }
}

/// Opens fresh [`Transport`]s to one particular device.
///
/// The owner of a connection keeps its connector for the lifetime of the
/// process and asks it for a new transport after every connection loss.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Try to open the device.
    async fn connect(&self) -> Result<Box<dyn Transport>>;

    /// Human-readable device name (usually the device path) for logging.
    fn name(&self) -> &str;
}
