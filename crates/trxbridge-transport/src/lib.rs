//! Transport implementations for trxbridge.
//!
//! Provides a concrete [`Transport`](trxbridge_core::Transport) and
//! [`Connector`](trxbridge_core::Connector) over `tokio-serial`, used for
//! both the physical transceiver port and the virtual serial endpoint (PTY).
//!
//! # Example
//!
//! ```no_run
//! use trxbridge_transport::SerialConnector;
//! use trxbridge_core::Connector;
//!
//! # async fn example() -> trxbridge_core::Result<()> {
//! let pty = SerialConnector::pty("/tmp/remotetrx-trx2");
//! let transport = pty.connect().await?;
//! # Ok(())
//! # }
//! ```

pub mod serial;

pub use serial::{SerialConfig, SerialConnector, SerialTransport};
pub use tokio_serial::{DataBits, FlowControl, Parity, StopBits};
