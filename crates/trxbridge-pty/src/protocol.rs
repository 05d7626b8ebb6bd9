//! Byte values of the virtual-endpoint protocol.
//!
//! Commands from the control application are single bytes. The four
//! argument-carrying commands collect characters up to [`TERMINATOR`].
//! Telemetry to the control application is a single byte per squelch
//! transition.

/// Key the transmitter.
pub const CMD_TX_ON: u8 = b'T';

/// Unkey the transmitter.
pub const CMD_TX_OFF: u8 = b'R';

/// Start of a transmit frequency in Hz, e.g. `F145000000;`.
pub const CMD_TX_FREQ: u8 = b'F';

/// Start of a receive frequency in Hz, e.g. `f145000000;`.
pub const CMD_RX_FREQ: u8 = b'f';

/// Start of a transmit modulation token, e.g. `MFM;`.
pub const CMD_TX_MOD: u8 = b'M';

/// Start of a receive modulation token, e.g. `mFM;`.
pub const CMD_RX_MOD: u8 = b'm';

/// Ends an argument.
pub const TERMINATOR: u8 = b';';

/// Telemetry: the squelch opened.
pub const SQUELCH_OPEN: u8 = b'O';

/// Telemetry: the squelch closed.
pub const SQUELCH_CLOSED: u8 = b'Z';

/// The telemetry byte for a squelch level.
pub fn squelch_byte(open: bool) -> u8 {
    if open { SQUELCH_OPEN } else { SQUELCH_CLOSED }
}
