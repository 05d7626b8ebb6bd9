//! trxbridge-core: Core traits, types, and error definitions for trxbridge.
//!
//! This crate defines the abstractions shared by the transceiver driver and
//! the PTY bridge, without pulling in any serial port implementation.
//!
//! # Key types
//!
//! - [`Transceiver`] -- radio operations driven by the bridge
//! - [`Transport`] / [`Connector`] -- byte-level device channel and how to open it
//! - [`ReconnectBackoff`] -- tick-counted reopen cooldown
//! - [`TransceiverState`] -- last commanded radio configuration
//! - [`Error`] / [`Result`] -- error handling

pub mod backoff;
pub mod error;
pub mod helpers;
pub mod transceiver;
pub mod transport;
pub mod types;

pub use backoff::{REOPEN_BACKOFF_TICKS, ReconnectBackoff};
pub use error::{Error, Result};
pub use helpers::{format_freq_mhz, hz_to_khz_rounded};
pub use transceiver::Transceiver;
pub use transport::{Connector, Transport};
pub use types::*;
