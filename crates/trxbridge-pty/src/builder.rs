//! PtyBridgeBuilder -- fluent builder for [`PtyBridge`].

use trxbridge_core::error::{Error, Result};
use trxbridge_core::transport::Connector;
use trxbridge_transport::SerialConnector;

use crate::bridge::PtyBridge;

/// Fluent builder for [`PtyBridge`].
///
/// # Example
///
/// ```no_run
/// use trxbridge_pty::PtyBridgeBuilder;
///
/// # async fn example() -> trxbridge_core::Result<()> {
/// let bridge = PtyBridgeBuilder::new()
///     .pty_path("/tmp/remotetrx-trx2")
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct PtyBridgeBuilder {
    pty_path: Option<String>,
    connector: Option<Box<dyn Connector>>,
}

impl PtyBridgeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the PTY slave (or its symlink) to open.
    pub fn pty_path(mut self, path: &str) -> Self {
        self.pty_path = Some(path.to_string());
        self
    }

    /// Use a custom connector instead of opening a PTY path.
    pub fn connector(mut self, connector: Box<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Build the bridge and make the first open attempt.
    ///
    /// An endpoint that cannot be opened yet is not an error; the bridge
    /// keeps retrying from its tick.
    pub async fn build(self) -> Result<PtyBridge> {
        let connector: Box<dyn Connector> = match (self.connector, self.pty_path) {
            (Some(connector), _) => connector,
            (None, Some(path)) if !path.is_empty() => Box::new(SerialConnector::pty(&path)),
            _ => {
                return Err(Error::InvalidParameter("PTY path is required".into()));
            }
        };

        let mut bridge = PtyBridge::new(connector);
        bridge.open().await;
        Ok(bridge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trxbridge_test_harness::{MockConnector, MockTransport};

    #[tokio::test]
    async fn path_is_required() {
        let result = PtyBridgeBuilder::new().build().await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));

        let result = PtyBridgeBuilder::new().pty_path("").build().await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn build_opens_the_endpoint() {
        let bridge = PtyBridgeBuilder::new()
            .connector(Box::new(MockConnector::with_transport(
                "/tmp/pty",
                MockTransport::new(),
            )))
            .build()
            .await
            .unwrap();
        assert!(bridge.is_connected());
        assert_eq!(bridge.name(), "/tmp/pty");
        assert!(!bridge.backoff().is_scheduled());
    }

    #[tokio::test]
    async fn missing_pty_schedules_retry() {
        let bridge = PtyBridgeBuilder::new()
            .pty_path("/tmp/trxbridge-no-such-pty")
            .build()
            .await
            .unwrap();
        assert!(!bridge.is_connected());
        assert_eq!(bridge.backoff().remaining(), 100);
    }
}
