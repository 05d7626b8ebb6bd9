//! Transceiver command builders.
//!
//! Pure functions producing the exact bytes for each wire command. No I/O
//! happens here; the driver sends the result over its transport.
//!
//! # Command reference
//!
//! | Command | Argument | Meaning |
//! |---|---|---|
//! | `RFQ` | kHz, integer | receive frequency |
//! | `TFQ` | kHz, integer | transmit frequency |
//! | `PWR` | integer | transmit power level |
//!
//! Frequencies are kept in hertz everywhere else and converted to whole
//! kilohertz (rounded, not truncated) only here. Transmitter keying and
//! squelch are not commands: they use the DTR and DCD modem lines.

use trxbridge_core::hz_to_khz_rounded;

use crate::protocol::encode_command;

/// Receive frequency command mnemonic.
pub const CMD_RX_FREQ: &str = "RFQ";
/// Transmit frequency command mnemonic.
pub const CMD_TX_FREQ: &str = "TFQ";
/// Transmit power command mnemonic.
pub const CMD_TX_POWER: &str = "PWR";

/// Build a "set receive frequency" command (`RFQ <kHz>\n`).
///
/// # Arguments
///
/// * `freq_hz` - Frequency in hertz (e.g. `145_500_000` for 145.500 MHz).
pub fn cmd_set_rx_freq(freq_hz: u64) -> Vec<u8> {
    encode_command(CMD_RX_FREQ, &hz_to_khz_rounded(freq_hz).to_string())
}

/// Build a "set transmit frequency" command (`TFQ <kHz>\n`).
pub fn cmd_set_tx_freq(freq_hz: u64) -> Vec<u8> {
    encode_command(CMD_TX_FREQ, &hz_to_khz_rounded(freq_hz).to_string())
}

/// Build a "set transmit power" command (`PWR <level>\n`).
///
/// The level is passed through unchanged.
pub fn cmd_set_tx_power(level: u32) -> Vec<u8> {
    encode_command(CMD_TX_POWER, &level.to_string())
}
