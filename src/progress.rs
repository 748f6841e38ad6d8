//! Cosmetic progress indicator for long-running actions.
//!
//! The value advances on a fixed timer, stalls below 100 and is snapped to 100
//! only when the caller reports completion. It carries no information about
//! the real request.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressProfile {
    pub start: u8,
    pub step: u8,
    pub interval: Duration,
    pub cap: u8,
}

impl ProgressProfile {
    pub const SCAN: ProgressProfile = ProgressProfile {
        start: 5,
        step: 5,
        interval: Duration::from_millis(300),
        cap: 95,
    };

    pub const PEN_TEST: ProgressProfile = ProgressProfile {
        start: 5,
        step: 2,
        interval: Duration::from_millis(600),
        cap: 95,
    };

    /// Next displayed value. Increments only while below the cap and never reaches 100.
    pub fn advance(&self, current: u8) -> u8 {
        if current >= self.cap {
            return current;
        }
        current.saturating_add(self.step).min(99)
    }
}

/// Timer-driven progress value published on a `watch` channel.
pub struct ProgressSimulator {
    tx: watch::Sender<u8>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ProgressSimulator {
    /// Start ticking. Must be called from within a tokio runtime.
    pub fn start(profile: ProgressProfile) -> Self {
        let (tx, _rx) = watch::channel(profile.start);
        let cancel = CancellationToken::new();

        let ticker_tx = tx.clone();
        let ticker_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(profile.interval);
            // First tick completes immediately.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = ticker_cancel.cancelled() => break,
                    _ = interval.tick() => {
                        let current = *ticker_tx.borrow();
                        let next = profile.advance(current);
                        if next == current {
                            // Stalled at the cap; wait for finish/abort.
                            ticker_cancel.cancelled().await;
                            break;
                        }
                        ticker_tx.send_replace(next);
                    }
                }
            }
        });

        Self { tx, cancel, task }
    }

    pub fn subscribe(&self) -> watch::Receiver<u8> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> u8 {
        *self.tx.borrow()
    }

    /// Request resolved successfully: snap to 100 and stop.
    pub fn finish(self) -> u8 {
        self.stop(100)
    }

    /// Request failed: reset to 0 and stop.
    pub fn abort(self) -> u8 {
        self.stop(0)
    }

    fn stop(&self, value: u8) -> u8 {
        self.halt();
        self.tx.send_replace(value);
        value
    }

    fn halt(&self) {
        self.cancel.cancel();
        self.task.abort();
    }
}

impl Drop for ProgressSimulator {
    fn drop(&mut self) {
        self.halt();
    }
}
