//! trxbridge-test-harness: Test utilities and mock devices for trxbridge.
//!
//! This crate provides [`MockTransport`] and [`MockConnector`] for
//! deterministic unit testing of the transceiver driver, the PTY bridge,
//! and the event loop without real serial hardware.

pub mod mock_serial;

pub use mock_serial::{MockConnector, MockTransport};
