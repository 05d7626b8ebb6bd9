//! CommandParser -- byte-at-a-time decoder for the virtual-endpoint
//! command protocol.
//!
//! # Command format
//!
//! ```text
//! T                  transmitter on
//! R                  transmitter off
//! F<digits>;         transmit frequency, Hz
//! f<digits>;         receive frequency, Hz
//! M<token>;          transmit modulation
//! m<token>;          receive modulation
//! ```
//!
//! Outside an argument, any other byte is ignored. Inside an argument every
//! byte up to `;` is collected verbatim; the argument is validated only when
//! the terminator arrives. The parser never holds more than
//! [`MAX_COMMAND_LEN`] argument characters; the rest of an over-long
//! argument, up to and including its `;`, is skipped rather than read as
//! commands.

use thiserror::Error;

use crate::protocol::{
    CMD_RX_FREQ, CMD_RX_MOD, CMD_TX_FREQ, CMD_TX_MOD, CMD_TX_OFF, CMD_TX_ON, TERMINATOR,
};

/// Longest argument accepted before the command is abandoned.
pub const MAX_COMMAND_LEN: usize = 32;

/// Where the parser is within a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserState {
    /// Waiting for a command byte.
    #[default]
    Idle,
    /// Collecting the digits of a transmit frequency.
    CollectingTxFreq,
    /// Collecting the digits of a receive frequency.
    CollectingRxFreq,
    /// Collecting a transmit modulation token.
    CollectingTxMod,
    /// Collecting a receive modulation token.
    CollectingRxMod,
}

/// A fully decoded command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    TxOn,
    TxOff,
    /// Transmit frequency in hertz.
    SetTxFreq(u64),
    /// Receive frequency in hertz.
    SetRxFreq(u64),
    /// Transmit modulation token, unvalidated.
    SetTxMod(String),
    /// Receive modulation token, unvalidated.
    SetRxMod(String),
}

/// A command that was received but could not be decoded.
///
/// The parser is back in [`ParserState::Idle`] whenever one of these is
/// returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid frequency {0:?}: expected decimal digits")]
    InvalidFrequency(String),

    #[error("frequency must be greater than 0 Hz")]
    ZeroFrequency,

    #[error("empty argument")]
    EmptyArgument,

    #[error("argument longer than {limit} characters discarded")]
    Overflow { limit: usize },
}

/// Incremental decoder for the command byte stream.
#[derive(Debug, Default)]
pub struct CommandParser {
    state: ParserState,
    buf: String,
    /// Skipping the tail of an over-long argument.
    discarding: bool,
}

impl CommandParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Argument characters collected so far.
    pub fn pending(&self) -> &str {
        &self.buf
    }

    /// Drop any partial command and go back to Idle.
    pub fn reset(&mut self) {
        self.state = ParserState::Idle;
        self.buf.clear();
        self.discarding = false;
    }

    /// Feed one byte.
    ///
    /// Returns `Ok(Some(_))` when the byte completes a command, `Ok(None)`
    /// when more bytes are needed (or the byte was ignored), and `Err(_)`
    /// when a command had to be dropped.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Command>, ParseError> {
        if self.discarding {
            self.discarding = byte != TERMINATOR;
            return Ok(None);
        }
        if self.state == ParserState::Idle {
            return Ok(self.start(byte));
        }

        if byte == TERMINATOR {
            let state = self.state;
            let arg = std::mem::take(&mut self.buf);
            self.state = ParserState::Idle;
            return finish(state, arg).map(Some);
        }

        if self.buf.len() >= MAX_COMMAND_LEN {
            self.reset();
            self.discarding = true;
            return Err(ParseError::Overflow {
                limit: MAX_COMMAND_LEN,
            });
        }
        self.buf.push(char::from(byte));
        Ok(None)
    }

    fn start(&mut self, byte: u8) -> Option<Command> {
        self.state = match byte {
            CMD_TX_ON => return Some(Command::TxOn),
            CMD_TX_OFF => return Some(Command::TxOff),
            CMD_TX_FREQ => ParserState::CollectingTxFreq,
            CMD_RX_FREQ => ParserState::CollectingRxFreq,
            CMD_TX_MOD => ParserState::CollectingTxMod,
            CMD_RX_MOD => ParserState::CollectingRxMod,
            _ => return None,
        };
        self.buf.clear();
        None
    }
}

/// Turn a terminated argument into a command.
fn finish(state: ParserState, arg: String) -> Result<Command, ParseError> {
    match state {
        ParserState::CollectingTxFreq => parse_freq(&arg).map(Command::SetTxFreq),
        ParserState::CollectingRxFreq => parse_freq(&arg).map(Command::SetRxFreq),
        ParserState::CollectingTxMod => parse_token(arg).map(Command::SetTxMod),
        ParserState::CollectingRxMod => parse_token(arg).map(Command::SetRxMod),
        ParserState::Idle => unreachable!("terminator is only handled inside an argument"),
    }
}

fn parse_freq(arg: &str) -> Result<u64, ParseError> {
    if arg.is_empty() {
        return Err(ParseError::EmptyArgument);
    }
    // u64::from_str would also take a leading '+'.
    if !arg.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidFrequency(arg.to_string()));
    }
    match arg.parse::<u64>() {
        Ok(0) => Err(ParseError::ZeroFrequency),
        Ok(hz) => Ok(hz),
        Err(_) => Err(ParseError::InvalidFrequency(arg.to_string())),
    }
}

fn parse_token(arg: String) -> Result<String, ParseError> {
    if arg.is_empty() {
        Err(ParseError::EmptyArgument)
    } else {
        Ok(arg)
    }
}
