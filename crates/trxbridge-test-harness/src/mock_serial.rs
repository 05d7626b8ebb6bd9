//! Mock transport and connector for deterministic testing.
//!
//! [`MockTransport`] implements the [`Transport`] trait against an in-memory
//! device model. Clones share that model, so a test keeps one clone to
//! inspect and script while the code under test owns the other inside a
//! `Box<dyn Transport>`.
//!
//! # Example
//!
//! ```
//! use trxbridge_test_harness::MockTransport;
//!
//! let mock = MockTransport::new();
//! let handle = mock.clone();
//! // Queue bytes the "device" sends and carrier-detect samples it reports.
//! handle.push_input(b"F145000;");
//! handle.push_carrier_detect(&[true, true, false]);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use trxbridge_core::error::{Error, Result};
use trxbridge_core::transport::{Connector, Transport};

/// Shared, scriptable device model behind a [`MockTransport`].
#[derive(Debug, Default)]
struct MockState {
    /// Whether the transport is "connected".
    connected: bool,
    /// Log of all bytes sent through this transport, one entry per `send()`.
    sent_log: Vec<Vec<u8>>,
    /// Inbound chunks; each `receive()` returns at most one chunk.
    /// An empty chunk is delivered as a zero-length read.
    inbound: VecDeque<Vec<u8>>,
    /// Scripted carrier-detect samples, consumed one per call.
    carrier_script: VecDeque<bool>,
    /// Value reported once the script is exhausted.
    carrier_level: bool,
    /// Every DTR level written, in order.
    dtr_log: Vec<bool>,
    /// Fail the next N `send()` calls with a connection error.
    fail_sends: usize,
    /// Fail the next N `set_dtr()` calls with a connection error.
    fail_dtr: usize,
    /// Fail the next N `carrier_detect()` calls with a connection error.
    fail_carrier: usize,
    /// Fail the next N `receive()` calls with a connection error.
    fail_receives: usize,
    /// Number of `close()` calls.
    close_count: usize,
}

/// A mock [`Transport`] for testing without hardware.
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a new mock transport in the connected state.
    pub fn new() -> Self {
        MockTransport {
            state: Arc::new(Mutex::new(MockState {
                connected: true,
                ..Default::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread poisons the lock; the data is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue one chunk of inbound data.
    ///
    /// Pass an empty slice to simulate the peer closing its end.
    pub fn push_input(&self, data: &[u8]) {
        self.lock().inbound.push_back(data.to_vec());
    }

    /// Queue carrier-detect samples, consumed in order.
    pub fn push_carrier_detect(&self, samples: &[bool]) {
        self.lock().carrier_script.extend(samples.iter().copied());
    }

    /// Set the carrier-detect level reported when no samples are queued.
    pub fn set_carrier_detect(&self, level: bool) {
        self.lock().carrier_level = level;
    }

    /// Return every chunk sent through this transport.
    pub fn sent_data(&self) -> Vec<Vec<u8>> {
        self.lock().sent_log.clone()
    }

    /// Return all sent bytes concatenated.
    pub fn sent_bytes(&self) -> Vec<u8> {
        self.lock().sent_log.concat()
    }

    /// Return every chunk sent, decoded as UTF-8 (lossy).
    pub fn sent_strings(&self) -> Vec<String> {
        self.lock()
            .sent_log
            .iter()
            .map(|c| String::from_utf8_lossy(c).into_owned())
            .collect()
    }

    /// Forget everything sent so far.
    pub fn clear_sent(&self) {
        self.lock().sent_log.clear();
    }

    /// Return every DTR level written, in order.
    pub fn dtr_log(&self) -> Vec<bool> {
        self.lock().dtr_log.clone()
    }

    /// Make the next `n` sends fail with [`Error::ConnectionLost`].
    pub fn fail_next_sends(&self, n: usize) {
        self.lock().fail_sends = n;
    }

    /// Make the next `n` DTR writes fail.
    pub fn fail_next_dtr(&self, n: usize) {
        self.lock().fail_dtr = n;
    }

    /// Make the next `n` carrier-detect samples fail.
    pub fn fail_next_carrier_detect(&self, n: usize) {
        self.lock().fail_carrier = n;
    }

    /// Make the next `n` receives fail with [`Error::ConnectionLost`].
    pub fn fail_next_receives(&self, n: usize) {
        self.lock().fail_receives = n;
    }

    /// Number of times `close()` was called.
    pub fn close_count(&self) -> usize {
        self.lock().close_count
    }

    /// Set the connected state of the mock transport.
    pub fn set_connected(&self, connected: bool) {
        self.lock().connected = connected;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let mut state = self.lock();
        if !state.connected {
            return Err(Error::NotConnected);
        }
        if state.fail_sends > 0 {
            state.fail_sends -= 1;
            return Err(Error::ConnectionLost);
        }
        state.sent_log.push(data.to_vec());
        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        {
            let mut state = self.lock();
            if !state.connected {
                return Err(Error::NotConnected);
            }
            if state.fail_receives > 0 {
                state.fail_receives -= 1;
                return Err(Error::ConnectionLost);
            }
            if let Some(mut chunk) = state.inbound.pop_front() {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    state.inbound.push_front(chunk.split_off(n));
                }
                return Ok(n);
            }
        }
        // Nothing queued: behave like an idle line.
        tokio::time::sleep(timeout).await;
        Err(Error::Timeout)
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = self.lock();
        state.connected = false;
        state.close_count += 1;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.lock().connected
    }

    async fn set_dtr(&mut self, on: bool) -> Result<()> {
        let mut state = self.lock();
        if !state.connected {
            return Err(Error::NotConnected);
        }
        if state.fail_dtr > 0 {
            state.fail_dtr -= 1;
            return Err(Error::Transport("failed to set DTR: EIO".into()));
        }
        state.dtr_log.push(on);
        Ok(())
    }

    async fn carrier_detect(&mut self) -> Result<bool> {
        let mut state = self.lock();
        if !state.connected {
            return Err(Error::NotConnected);
        }
        if state.fail_carrier > 0 {
            state.fail_carrier -= 1;
            return Err(Error::Transport("failed to read DCD: EIO".into()));
        }
        let level = state.carrier_level;
        Ok(state.carrier_script.pop_front().unwrap_or(level))
    }
}

/// One scripted outcome of [`MockConnector::connect`].
#[derive(Debug)]
enum Outcome {
    Open(MockTransport),
    Fail,
}

/// A mock [`Connector`] with scripted open outcomes.
///
/// Outcomes are consumed in order. When the script is exhausted, every
/// further attempt fails, like a device that is unplugged.
#[derive(Debug, Clone)]
pub struct MockConnector {
    name: String,
    outcomes: Arc<Mutex<VecDeque<Outcome>>>,
    attempts: Arc<Mutex<usize>>,
}

impl MockConnector {
    /// Create a connector with an empty script.
    pub fn new(name: &str) -> Self {
        MockConnector {
            name: name.to_string(),
            outcomes: Arc::new(Mutex::new(VecDeque::new())),
            attempts: Arc::new(Mutex::new(0)),
        }
    }

    /// Create a connector whose first attempt yields `transport`.
    pub fn with_transport(name: &str, transport: MockTransport) -> Self {
        let connector = Self::new(name);
        connector.push_open(transport);
        connector
    }

    /// Script a successful open returning (a clone of) `transport`.
    pub fn push_open(&self, transport: MockTransport) {
        transport.set_connected(true);
        self.outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Outcome::Open(transport));
    }

    /// Script a failed open.
    pub fn push_failure(&self) {
        self.outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Outcome::Fail);
    }

    /// Number of `connect()` calls so far.
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self) -> Result<Box<dyn Transport>> {
        *self.attempts.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        let outcome = self
            .outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match outcome {
            Some(Outcome::Open(transport)) => {
                transport.set_connected(true);
                Ok(Box::new(transport))
            }
            Some(Outcome::Fail) | None => Err(Error::Transport(format!(
                "failed to open {}: no such device",
                self.name
            ))),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_transport_records_sent_data() {
        let mut mock = MockTransport::new();
        let handle = mock.clone();

        mock.send(b"RFQ 145500\n").await.unwrap();
        mock.send(b"PWR 0\n").await.unwrap();

        assert_eq!(handle.sent_strings(), vec!["RFQ 145500\n", "PWR 0\n"]);
        assert_eq!(handle.sent_bytes(), b"RFQ 145500\nPWR 0\n");
    }

    #[tokio::test]
    async fn mock_transport_delivers_queued_input() {
        let mut mock = MockTransport::new();
        mock.push_input(b"OK\n");

        let mut buf = [0u8; 64];
        let n = mock
            .receive(&mut buf, Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(&buf[..n], b"OK\n");
    }

    #[tokio::test]
    async fn mock_transport_partial_receive() {
        let mut mock = MockTransport::new();
        mock.push_input(&[0xAA, 0xBB, 0xCC, 0xDD]);

        let mut buf = [0u8; 2];
        let n = mock.receive(&mut buf, Duration::from_millis(10)).await.unwrap();
        assert_eq!(&buf[..n], &[0xAA, 0xBB]);
        let n = mock.receive(&mut buf, Duration::from_millis(10)).await.unwrap();
        assert_eq!(&buf[..n], &[0xCC, 0xDD]);
    }

    #[tokio::test]
    async fn mock_transport_empty_chunk_is_eof() {
        let mut mock = MockTransport::new();
        mock.push_input(b"");

        let mut buf = [0u8; 8];
        let n = mock.receive(&mut buf, Duration::from_millis(10)).await.unwrap();
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn mock_transport_idle_receive_times_out() {
        let mut mock = MockTransport::new();
        let mut buf = [0u8; 8];
        let result = mock.receive(&mut buf, Duration::from_millis(5)).await;
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn mock_transport_carrier_script_then_level() {
        let mut mock = MockTransport::new();
        mock.push_carrier_detect(&[true, false]);
        mock.set_carrier_detect(true);

        assert!(mock.carrier_detect().await.unwrap());
        assert!(!mock.carrier_detect().await.unwrap());
        assert!(mock.carrier_detect().await.unwrap());
        assert!(mock.carrier_detect().await.unwrap());
    }

    #[tokio::test]
    async fn mock_transport_injected_failures() {
        let mut mock = MockTransport::new();
        mock.fail_next_sends(1);
        mock.fail_next_dtr(1);
        mock.fail_next_carrier_detect(1);

        assert!(matches!(mock.send(b"x").await, Err(Error::ConnectionLost)));
        assert!(mock.send(b"x").await.is_ok());
        assert!(mock.set_dtr(true).await.is_err());
        assert!(mock.set_dtr(true).await.is_ok());
        assert!(mock.carrier_detect().await.is_err());
        assert!(mock.carrier_detect().await.is_ok());
        assert_eq!(mock.dtr_log(), vec![true]);
    }

    #[tokio::test]
    async fn mock_transport_close() {
        let mut mock = MockTransport::new();
        let handle = mock.clone();
        mock.close().await.unwrap();

        assert!(!handle.is_connected());
        assert_eq!(handle.close_count(), 1);
        assert!(matches!(mock.send(b"x").await, Err(Error::NotConnected)));
        assert!(matches!(mock.set_dtr(true).await, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn mock_connector_follows_script() {
        let connector = MockConnector::new("/dev/ttyMOCK0");
        connector.push_failure();
        connector.push_open(MockTransport::new());

        assert!(connector.connect().await.is_err());
        let transport = connector.connect().await.unwrap();
        assert!(transport.is_connected());
        assert!(connector.connect().await.is_err());
        assert_eq!(connector.attempts(), 3);
        assert_eq!(connector.name(), "/dev/ttyMOCK0");
    }

    #[tokio::test]
    async fn mock_connector_reconnects_closed_transport() {
        let mock = MockTransport::new();
        let connector = MockConnector::with_transport("pty", mock.clone());
        mock.set_connected(false);
        connector.push_open(mock.clone());

        let mut first = connector.connect().await.unwrap();
        first.close().await.unwrap();
        let second = connector.connect().await.unwrap();
        assert!(second.is_connected());
    }
}
