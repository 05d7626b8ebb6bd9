//! # trxbridge -- PTY to transceiver bridge
//!
//! `trxbridge` connects a control application that speaks a single-byte
//! command protocol over a pseudo-terminal to a physical transceiver driven
//! over a serial port with ASCII command lines and modem control lines.
//!
//! ```no_run
//! use tokio_util::sync::CancellationToken;
//! use trxbridge::{BridgeContext, EventLoop, PtyBridgeBuilder, TransceiverBuilder};
//!
//! # async fn example() -> trxbridge::Result<()> {
//! let driver = TransceiverBuilder::new()
//!     .serial_port("/dev/ttyUSB0")
//!     .build()
//!     .await?;
//! let bridge = PtyBridgeBuilder::new()
//!     .pty_path("/tmp/remotetrx-trx2")
//!     .build()
//!     .await?;
//!
//! let mut ctx = BridgeContext::new(driver, bridge);
//! EventLoop::new(CancellationToken::new()).run(&mut ctx).await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! | Crate                    | Purpose                                          |
//! |--------------------------|--------------------------------------------------|
//! | `trxbridge-core`         | Traits, state types, errors, reconnect backoff   |
//! | `trxbridge-transport`    | Serial/PTY transport on tokio-serial             |
//! | `trxbridge-driver`       | Transceiver wire protocol and connection handling |
//! | `trxbridge-pty`          | PTY command parser and squelch telemetry         |
//! | **`trxbridge`**          | This facade crate, plus the event loop           |
//!
//! Neither connection ever fails the loop: both sides log their I/O errors,
//! close, and retry after [`REOPEN_BACKOFF_TICKS`] iterations.

pub mod event_loop;

pub use event_loop::{BridgeContext, EventLoop, POLL_INTERVAL};

pub use trxbridge_core::{
    Connector, DEFAULT_RX_FREQ_HZ, DEFAULT_TX_FREQ_HZ, DEFAULT_TX_POWER, Error, Modulation,
    REOPEN_BACKOFF_TICKS, ReconnectBackoff, Result, Transceiver, TransceiverState, Transport,
};
pub use trxbridge_driver::{TransceiverBuilder, TransceiverDriver};
pub use trxbridge_pty::{Command, CommandParser, ParseError, PtyBridge, PtyBridgeBuilder};
pub use trxbridge_transport::{SerialConfig, SerialConnector, SerialTransport};

/// The transceiver wire protocol.
pub mod driver {
    pub use trxbridge_driver::*;
}

/// The PTY command and telemetry protocol.
pub mod pty {
    pub use trxbridge_pty::*;
}
