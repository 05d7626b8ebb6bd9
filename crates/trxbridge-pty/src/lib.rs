//! trxbridge-pty: the virtual serial endpoint side of the bridge.
//!
//! A control application talks to the bridge through a PTY using a
//! single-byte command protocol (see [`protocol`]). [`CommandParser`]
//! decodes that stream, and [`PtyBridge`] applies the decoded commands to a
//! [`Transceiver`](trxbridge_core::Transceiver) while mirroring the squelch
//! back as `O`/`Z` bytes.

pub mod bridge;
pub mod builder;
pub mod parser;
pub mod protocol;

pub use bridge::PtyBridge;
pub use builder::PtyBridgeBuilder;
pub use parser::{Command, CommandParser, MAX_COMMAND_LEN, ParseError, ParserState};
