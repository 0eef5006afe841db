//! Fixed-period scheduling for evaluation ticks.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Calls a closure at a fixed rate on the current thread.
///
/// Missed deadlines are skipped rather than replayed in a burst.
#[derive(Debug, Clone)]
pub struct Ticker {
    period: Duration,
    cancelled: Arc<AtomicBool>,
}

impl Ticker {
    /// Creates a ticker with the given period.
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that stops `run` at the next tick when set.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Tick period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Runs `on_tick` until it breaks or the ticker is cancelled.
    /// Returns the number of ticks run.
    pub fn run<F>(&self, mut on_tick: F) -> u64
    where
        F: FnMut() -> ControlFlow<()>,
    {
        let mut ticks = 0;
        let mut deadline = Instant::now();

        while !self.cancelled.load(Ordering::Acquire) {
            ticks += 1;
            if on_tick().is_break() {
                break;
            }

            deadline += self.period;
            let now = Instant::now();
            if deadline > now {
                std::thread::sleep(deadline - now);
            } else {
                deadline = now;
            }
        }
        ticks
    }
}
