//! The bridge's main loop.
//!
//! One iteration:
//!
//! 1. wait up to [`POLL_INTERVAL`] for bytes on either connection; once one
//!    side has something, check the other side once without waiting,
//! 2. tick the [`PtyBridge`] (reopen countdown, squelch telemetry) and then
//!    the [`TransceiverDriver`] (reopen countdown),
//! 3. hand whatever was read in step 1 to its owner, serial side first.
//!
//! A connection that always has data therefore never starves the other.
//!
//! Because the ticks run before dispatch, a connection reopened in step 2
//! is already in place when its input is handled. The loop runs until its
//! [`CancellationToken`] is cancelled, and then releases the PTY and the
//! serial port, in that order.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use trxbridge_driver::TransceiverDriver;
use trxbridge_pty::PtyBridge;

/// Upper bound on the wait for input in each iteration.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Size of each per-connection read buffer.
const READ_BUF_SIZE: usize = 1024;

/// The two connection owners, created by the entry point and lent to the
/// loop.
pub struct BridgeContext {
    pub driver: TransceiverDriver,
    pub bridge: PtyBridge,
}

impl BridgeContext {
    pub fn new(driver: TransceiverDriver, bridge: PtyBridge) -> Self {
        BridgeContext { driver, bridge }
    }

    /// Release both devices: the PTY first, then the serial port.
    pub async fn close(&mut self) {
        self.bridge.close().await;
        self.driver.close().await;
    }
}

/// Which wait finished first during the poll phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum First {
    Serial(Option<usize>),
    Pty(Option<usize>),
}

/// Single-threaded readiness loop over the serial port and the PTY.
pub struct EventLoop {
    cancel: CancellationToken,
    serial_buf: Vec<u8>,
    pty_buf: Vec<u8>,
}

impl EventLoop {
    pub fn new(cancel: CancellationToken) -> Self {
        EventLoop {
            cancel,
            serial_buf: vec![0; READ_BUF_SIZE],
            pty_buf: vec![0; READ_BUF_SIZE],
        }
    }

    /// Token that stops [`run`](Self::run).
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Run iterations until cancelled, then close both devices.
    pub async fn run(&mut self, ctx: &mut BridgeContext) {
        info!(
            serial = %ctx.driver.name(),
            pty = %ctx.bridge.name(),
            "bridge running"
        );
        while self.run_once(ctx).await {}
        debug!("event loop cancelled");
        ctx.close().await;
        info!("bridge stopped");
    }

    /// One poll / tick / dispatch iteration.
    ///
    /// Returns `false`, without ticking, when the loop has been cancelled.
    pub async fn run_once(&mut self, ctx: &mut BridgeContext) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }

        let first = tokio::select! {
            biased;

            _ = self.cancel.cancelled() => return false,

            n = ctx.driver.poll_input(&mut self.serial_buf, POLL_INTERVAL) => First::Serial(n),

            n = ctx.bridge.poll_input(&mut self.pty_buf, POLL_INTERVAL) => First::Pty(n),
        };

        let (serial, pty) = match first {
            First::Serial(serial) => {
                let pty = ctx.bridge.poll_input(&mut self.pty_buf, Duration::ZERO).await;
                (serial, pty)
            }
            First::Pty(pty) => {
                let serial = ctx
                    .driver
                    .poll_input(&mut self.serial_buf, Duration::ZERO)
                    .await;
                (serial, pty)
            }
        };

        ctx.bridge.tick(&mut ctx.driver).await;
        ctx.driver.tick().await;

        if let Some(n) = serial {
            ctx.driver.handle_input(&self.serial_buf[..n]).await;
        }
        if let Some(n) = pty {
            ctx.bridge
                .handle_input(&self.pty_buf[..n], &mut ctx.driver)
                .await;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trxbridge_core::Transceiver;
    use trxbridge_driver::TransceiverBuilder;
    use trxbridge_pty::PtyBridgeBuilder;
    use trxbridge_test_harness::{MockConnector, MockTransport};

    struct Harness {
        ctx: BridgeContext,
        serial: MockTransport,
        serial_connector: MockConnector,
        pty: MockTransport,
        pty_connector: MockConnector,
    }

    async fn harness() -> Harness {
        let serial = MockTransport::new();
        let serial_connector = MockConnector::with_transport("/dev/ttyMOCK0", serial.clone());
        let pty = MockTransport::new();
        let pty_connector = MockConnector::with_transport("/tmp/pty-mock", pty.clone());

        let driver = TransceiverBuilder::new()
            .connector(Box::new(serial_connector.clone()))
            .build()
            .await
            .unwrap();
        let bridge = PtyBridgeBuilder::new()
            .connector(Box::new(pty_connector.clone()))
            .build()
            .await
            .unwrap();
        serial.clear_sent();

        Harness {
            ctx: BridgeContext::new(driver, bridge),
            serial,
            serial_connector,
            pty,
            pty_connector,
        }
    }

    #[tokio::test]
    async fn pty_command_reaches_the_transceiver() {
        let mut h = harness().await;
        let mut event_loop = EventLoop::new(CancellationToken::new());
        h.pty.push_input(b"F145000;");

        assert!(event_loop.run_once(&mut h.ctx).await);
        assert_eq!(h.serial.sent_strings(), vec!["TFQ 145\n"]);
        assert_eq!(h.ctx.driver.state().tx_freq_hz, 145_000);
    }

    #[tokio::test]
    async fn both_sides_dispatched_in_one_iteration() {
        let mut h = harness().await;
        let mut event_loop = EventLoop::new(CancellationToken::new());
        h.serial.push_input(b"STATUS\n");
        h.pty.push_input(b"F145000;");

        assert!(event_loop.run_once(&mut h.ctx).await);
        assert_eq!(h.ctx.driver.state().tx_freq_hz, 145_000);
        assert_eq!(h.serial.sent_strings(), vec!["TFQ 145\n"]);
    }

    #[tokio::test]
    async fn serial_chatter_does_not_starve_pty_commands() {
        let mut h = harness().await;
        let mut event_loop = EventLoop::new(CancellationToken::new());
        for _ in 0..200 {
            h.serial.push_input(b"STATUS OK\n");
        }
        h.pty.push_input(b"T");

        assert!(event_loop.run_once(&mut h.ctx).await);
        assert!(h.ctx.driver.state().tx_on);
        assert_eq!(h.serial.dtr_log(), vec![false, true]);

        h.pty.push_input(b"R");
        assert!(event_loop.run_once(&mut h.ctx).await);
        assert!(!h.ctx.driver.state().tx_on);
        assert_eq!(h.serial.dtr_log(), vec![false, true, false]);
    }

    #[tokio::test]
    async fn idle_iteration_still_samples_squelch() {
        let mut h = harness().await;
        let mut event_loop = EventLoop::new(CancellationToken::new());
        h.serial.push_carrier_detect(&[true, true, false]);

        for _ in 0..3 {
            assert!(event_loop.run_once(&mut h.ctx).await);
        }
        assert_eq!(h.pty.sent_bytes(), b"OZ");
    }

    #[tokio::test]
    async fn serial_telemetry_is_consumed() {
        let mut h = harness().await;
        let mut event_loop = EventLoop::new(CancellationToken::new());
        h.serial.push_input(b"OK\n");

        assert!(event_loop.run_once(&mut h.ctx).await);
        assert!(h.ctx.driver.is_connected());
        assert!(h.serial.sent_data().is_empty());
    }

    #[tokio::test]
    async fn pty_hangup_is_retried_after_backoff() {
        let mut h = harness().await;
        let mut event_loop = EventLoop::new(CancellationToken::new());
        h.pty.push_input(b"");

        assert!(event_loop.run_once(&mut h.ctx).await);
        assert!(!h.ctx.bridge.is_connected());
        assert_eq!(h.ctx.bridge.backoff().remaining(), 100);

        h.pty_connector.push_open(h.pty.clone());
        for _ in 0..100 {
            event_loop.run_once(&mut h.ctx).await;
        }
        assert!(h.ctx.bridge.is_connected());
        assert_eq!(h.pty_connector.attempts(), 2);
    }

    #[tokio::test]
    async fn serial_loss_reasserts_state_on_reconnect() {
        let mut h = harness().await;
        let mut event_loop = EventLoop::new(CancellationToken::new());
        h.pty.push_input(b"Tf433500000;");
        event_loop.run_once(&mut h.ctx).await;

        h.serial.fail_next_receives(1);
        event_loop.run_once(&mut h.ctx).await;
        assert!(!h.ctx.driver.is_connected());

        let fresh = MockTransport::new();
        h.serial_connector.push_open(fresh.clone());
        for _ in 0..100 {
            event_loop.run_once(&mut h.ctx).await;
        }
        assert!(h.ctx.driver.is_connected());
        assert_eq!(fresh.dtr_log(), vec![true]);
        assert_eq!(
            fresh.sent_strings(),
            vec!["PWR 0\n", "RFQ 433500\n", "TFQ 145500\n"]
        );
    }

    #[tokio::test]
    async fn cancelled_loop_does_not_tick() {
        let mut h = harness().await;
        let cancel = CancellationToken::new();
        let mut event_loop = EventLoop::new(cancel.clone());
        h.serial.set_carrier_detect(true);
        cancel.cancel();

        assert!(!event_loop.run_once(&mut h.ctx).await);
        assert!(h.pty.sent_bytes().is_empty());
    }

    #[tokio::test]
    async fn run_closes_pty_then_serial_on_cancel() {
        let mut h = harness().await;
        let cancel = CancellationToken::new();
        let mut event_loop = EventLoop::new(cancel.clone());

        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            stopper.cancel();
        });
        event_loop.run(&mut h.ctx).await;

        assert!(!h.ctx.bridge.is_connected());
        assert!(!h.ctx.driver.is_connected());
        assert_eq!(h.pty.close_count(), 1);
        assert_eq!(h.serial.close_count(), 1);
    }

    #[tokio::test]
    async fn run_exits_with_devices_unavailable() {
        let driver = TransceiverBuilder::new()
            .connector(Box::new(MockConnector::new("/dev/ttyMOCK0")))
            .build()
            .await
            .unwrap();
        let bridge = PtyBridgeBuilder::new()
            .connector(Box::new(MockConnector::new("/tmp/pty-mock")))
            .build()
            .await
            .unwrap();
        let mut ctx = BridgeContext::new(driver, bridge);
        let cancel = CancellationToken::new();
        let mut event_loop = EventLoop::new(cancel.clone());

        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            stopper.cancel();
        });
        event_loop.run(&mut ctx).await;
        assert!(!ctx.driver.is_connected());
        assert!(!ctx.bridge.is_connected());
    }
}
