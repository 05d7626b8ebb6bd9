//! Core types shared by the transceiver driver and the PTY bridge.

use std::fmt;
use std::str::FromStr;

/// Default receive frequency after startup: 145.500 MHz.
pub const DEFAULT_RX_FREQ_HZ: u64 = 145_500_000;

/// Default transmit frequency after startup (simplex on the receive frequency).
pub const DEFAULT_TX_FREQ_HZ: u64 = DEFAULT_RX_FREQ_HZ;

/// Default transmit power level.
pub const DEFAULT_TX_POWER: u32 = 0;

/// Modulation of the receiver or transmitter.
///
/// The bridged transceiver is FM-only, so that is the one modulation a
/// token can name. Any other token is rejected by [`FromStr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Modulation {
    /// Frequency modulation.
    #[default]
    FM,
}

impl fmt::Display for Modulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modulation::FM => write!(f, "FM"),
        }
    }
}

/// Error returned when a token cannot be parsed into a [`Modulation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseModulationError(String);

impl fmt::Display for ParseModulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown modulation: {}", self.0)
    }
}

impl std::error::Error for ParseModulationError {}

impl FromStr for Modulation {
    type Err = ParseModulationError;

    /// Parse a modulation token exactly as sent by the control application.
    ///
    /// Matching is case-sensitive: the control protocol only ever sends
    /// upper-case tokens.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "FM" => Ok(Modulation::FM),
            _ => Err(ParseModulationError(s.to_string())),
        }
    }
}

/// Last commanded configuration of a transceiver plus its last sampled
/// squelch state.
///
/// Owned and mutated only by the transceiver driver. The commanded fields
/// survive connection loss so that a reopened connection can resume the
/// last configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransceiverState {
    /// Receive frequency in hertz. Always positive.
    pub rx_freq_hz: u64,
    /// Transmit frequency in hertz. Always positive.
    pub tx_freq_hz: u64,
    /// Transmit power level, in a device-defined unit.
    pub tx_power: u32,
    /// Whether the transmitter is keyed.
    pub tx_on: bool,
    /// Receive modulation.
    pub rx_mod: Modulation,
    /// Transmit modulation.
    pub tx_mod: Modulation,
    /// Whether the squelch was open at the last sample.
    pub squelch_open: bool,
}

impl Default for TransceiverState {
    fn default() -> Self {
        TransceiverState {
            rx_freq_hz: DEFAULT_RX_FREQ_HZ,
            tx_freq_hz: DEFAULT_TX_FREQ_HZ,
            tx_power: DEFAULT_TX_POWER,
            tx_on: false,
            rx_mod: Modulation::FM,
            tx_mod: Modulation::FM,
            squelch_open: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modulation_display_roundtrip() {
        let m = Modulation::FM;
        assert_eq!(m.to_string().parse::<Modulation>().unwrap(), m);
    }

    #[test]
    fn other_modulations_are_rejected() {
        for token in ["AM", "USB", "LSB", "CW", ""] {
            assert!(token.parse::<Modulation>().is_err(), "accepted {token:?}");
        }
    }

    #[test]
    fn modulation_parse_is_case_sensitive() {
        assert!("fm".parse::<Modulation>().is_err());
        assert_eq!("FM".parse::<Modulation>().unwrap(), Modulation::FM);
    }

    #[test]
    fn modulation_parse_unknown() {
        let err = "WFM".parse::<Modulation>().unwrap_err();
        assert_eq!(err.to_string(), "unknown modulation: WFM");
    }

    #[test]
    fn default_state() {
        let state = TransceiverState::default();
        assert_eq!(state.rx_freq_hz, 145_500_000);
        assert_eq!(state.tx_freq_hz, state.rx_freq_hz);
        assert_eq!(state.tx_power, 0);
        assert!(!state.tx_on);
        assert!(!state.squelch_open);
        assert_eq!(state.rx_mod, Modulation::FM);
        assert_eq!(state.tx_mod, Modulation::FM);
    }
}
