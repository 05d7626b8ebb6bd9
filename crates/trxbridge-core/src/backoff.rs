//! Tick-counted reconnect backoff.
//!
//! Both device connections (serial and PTY) use the same scheme: when a
//! connection fails or is lost, a counter is loaded with
//! [`REOPEN_BACKOFF_TICKS`] and decremented once per event-loop tick. The
//! reopen attempt is made on the tick that finds the counter at 1, so there
//! is always a full cooldown between attempts instead of a retry storm.
//!
//! Counter values: 0 = nothing scheduled, >1 = counting down, 1 = retry due.

/// Number of ticks between a connection failure and the next open attempt.
pub const REOPEN_BACKOFF_TICKS: u32 = 100;

/// Reopen countdown for one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconnectBackoff {
    remaining: u32,
}

impl ReconnectBackoff {
    /// A backoff with nothing scheduled.
    pub fn new() -> Self {
        ReconnectBackoff { remaining: 0 }
    }

    /// Schedule a reopen attempt [`REOPEN_BACKOFF_TICKS`] ticks from now.
    ///
    /// Rescheduling while a countdown is running restarts it.
    pub fn schedule(&mut self) {
        self.remaining = REOPEN_BACKOFF_TICKS;
    }

    /// Cancel any scheduled attempt (used after a successful open).
    pub fn clear(&mut self) {
        self.remaining = 0;
    }

    /// Advance the countdown by one tick.
    ///
    /// Returns `true` exactly when the attempt is due, in which case the
    /// counter is reset to 0 and the caller is expected to try opening.
    pub fn tick(&mut self) -> bool {
        match self.remaining {
            0 => false,
            1 => {
                self.remaining = 0;
                true
            }
            _ => {
                self.remaining -= 1;
                false
            }
        }
    }

    /// Ticks left on the counter.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Whether a reopen attempt is scheduled.
    pub fn is_scheduled(&self) -> bool {
        self.remaining > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_backoff_never_fires() {
        let mut b = ReconnectBackoff::new();
        for _ in 0..500 {
            assert!(!b.tick());
        }
        assert_eq!(b.remaining(), 0);
        assert!(!b.is_scheduled());
    }

    #[test]
    fn countdown_is_monotonic() {
        let mut b = ReconnectBackoff::new();
        b.schedule();
        assert_eq!(b.remaining(), 100);
        for n in 1..100 {
            assert!(!b.tick());
            assert_eq!(b.remaining(), 100 - n);
        }
        assert_eq!(b.remaining(), 1);
    }

    #[test]
    fn fires_on_the_hundredth_tick_only_once() {
        let mut b = ReconnectBackoff::new();
        b.schedule();
        let fired: Vec<u32> = (1..=300).filter(|_| b.tick()).collect();
        assert_eq!(fired, vec![100]);
        assert!(!b.is_scheduled());
    }

    #[test]
    fn reschedule_restarts_countdown() {
        let mut b = ReconnectBackoff::new();
        b.schedule();
        for _ in 0..50 {
            b.tick();
        }
        b.schedule();
        assert_eq!(b.remaining(), 100);
    }

    #[test]
    fn clear_cancels() {
        let mut b = ReconnectBackoff::new();
        b.schedule();
        b.clear();
        assert!(!b.tick());
        assert_eq!(b.remaining(), 0);
    }
}
