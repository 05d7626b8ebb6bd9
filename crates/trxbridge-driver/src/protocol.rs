//! Transceiver ASCII line protocol encoder/decoder.
//!
//! The transceiver speaks newline-terminated ASCII over its serial link:
//!
//! ```text
//! <command> <argument>\n
//! ```
//!
//! - `command`: a three-letter upper-case mnemonic (`RFQ`, `TFQ`, `PWR`).
//! - `argument`: a decimal integer.
//! - Terminator: `\n` (0x0A).
//!
//! In the other direction the transceiver emits free-form status lines,
//! also `\n`-terminated. These are only echoed to the log, so decoding is
//! limited to splitting complete lines out of a byte stream that may arrive
//! in arbitrary fragments.

use bytes::{BufMut, BytesMut};

/// Line terminator byte.
pub const TERMINATOR: u8 = b'\n';

/// Longest inbound line kept before it is discarded as garbage.
pub const MAX_LINE_LEN: usize = 256;

/// Encode a command line: `<command> <argument>\n`.
///
/// # Example
///
/// ```
/// use trxbridge_driver::protocol::encode_command;
///
/// assert_eq!(encode_command("PWR", "5"), b"PWR 5\n");
/// ```
pub fn encode_command(command: &str, argument: &str) -> Vec<u8> {
    let capacity = command.len() + 1 + argument.len() + 1;
    let mut buf = BytesMut::with_capacity(capacity);
    buf.put_slice(command.as_bytes());
    buf.put_u8(b' ');
    buf.put_slice(argument.as_bytes());
    buf.put_u8(TERMINATOR);
    buf.to_vec()
}

/// Result of feeding bytes into a [`LineBuffer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// A complete line, without its terminator (and without a trailing `\r`).
    Line(String),
    /// An over-long line was dropped; carries the number of bytes discarded.
    Overflow(usize),
}

/// Accumulates a fragmented byte stream into complete lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: BytesMut,
}

impl LineBuffer {
    pub fn new() -> Self {
        LineBuffer {
            buf: BytesMut::with_capacity(MAX_LINE_LEN),
        }
    }

    /// Append received bytes and return every line they complete.
    pub fn push(&mut self, data: &[u8]) -> Vec<LineEvent> {
        let mut events = Vec::new();
        for &b in data {
            if b == TERMINATOR {
                let line = self.buf.split();
                let text = String::from_utf8_lossy(&line);
                events.push(LineEvent::Line(text.trim_end_matches('\r').to_string()));
            } else if self.buf.len() >= MAX_LINE_LEN {
                // No terminator in sight; drop what we have and start over.
                events.push(LineEvent::Overflow(self.buf.len() + 1));
                self.buf.clear();
            } else {
                self.buf.put_u8(b);
            }
        }
        events
    }

    /// Bytes of an incomplete line held so far.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Drop any partial line (used when the connection is reset).
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_frequency_line() {
        assert_eq!(encode_command("RFQ", "145500"), b"RFQ 145500\n");
    }

    #[test]
    fn encode_empty_argument() {
        assert_eq!(encode_command("PWR", ""), b"PWR \n");
    }

    #[test]
    fn line_buffer_single_line() {
        let mut lb = LineBuffer::new();
        assert_eq!(lb.push(b"OK\n"), vec![LineEvent::Line("OK".into())]);
        assert_eq!(lb.pending(), 0);
    }

    #[test]
    fn line_buffer_fragmented_input() {
        let mut lb = LineBuffer::new();
        assert!(lb.push(b"RF").is_empty());
        assert!(lb.push(b"Q 14").is_empty());
        assert_eq!(lb.pending(), 6);
        assert_eq!(
            lb.push(b"5500\r\nPW"),
            vec![LineEvent::Line("RFQ 145500".into())]
        );
        assert_eq!(lb.pending(), 2);
    }

    #[test]
    fn line_buffer_multiple_lines_in_one_read() {
        let mut lb = LineBuffer::new();
        assert_eq!(
            lb.push(b"A\nB\n\n"),
            vec![
                LineEvent::Line("A".into()),
                LineEvent::Line("B".into()),
                LineEvent::Line(String::new()),
            ]
        );
    }

    #[test]
    fn line_buffer_overflow_discards_and_resyncs() {
        let mut lb = LineBuffer::new();
        let garbage = vec![b'x'; MAX_LINE_LEN];
        assert!(lb.push(&garbage).is_empty());
        let events = lb.push(b"yz\nOK\n");
        assert_eq!(events[0], LineEvent::Overflow(MAX_LINE_LEN + 1));
        assert_eq!(
            &events[1..],
            &[LineEvent::Line("z".into()), LineEvent::Line("OK".into())]
        );
    }

    #[test]
    fn line_buffer_clear() {
        let mut lb = LineBuffer::new();
        lb.push(b"partial");
        lb.clear();
        assert_eq!(lb.push(b"\n"), vec![LineEvent::Line(String::new())]);
    }
}
