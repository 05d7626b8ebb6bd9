//! trxbridge-driver: driver for a transceiver controlled by ASCII lines.
//!
//! The transceiver takes newline-terminated commands on its serial port
//! (`RFQ`, `TFQ`, `PWR`), keys its transmitter on DTR, and signals an open
//! squelch on DCD.
//!
//! # Modules
//!
//! - [`protocol`] -- line encoding and inbound line splitting
//! - [`commands`] -- pure builders for each wire command
//! - [`driver`] -- [`TransceiverDriver`], connection lifecycle and radio operations
//! - [`builder`] -- [`TransceiverBuilder`]

pub mod builder;
pub mod commands;
pub mod driver;
pub mod protocol;

pub use builder::TransceiverBuilder;
pub use driver::{SUPPORTED_MODULATION, TransceiverDriver};
