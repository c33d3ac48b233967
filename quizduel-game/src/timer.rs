//! Host-owned execution countdown.
//!
//! [`Countdown`] is the logical clock the host controller consults; it never
//! touches the runtime. [`Ticker`] is the scheduled task that drives it, owned
//! by the session. Both halves cancel idempotently, and ticks carry the epoch
//! of the countdown they were scheduled for so a late tick from an earlier
//! round cannot move the current one.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Tick for a countdown that is no longer running
    Stale,
    Running(u32),
    /// Reached zero; the countdown has stopped itself
    Expired,
}

#[derive(Debug, Default)]
pub struct Countdown {
    epoch: u64,
    remaining: u32,
    running: bool,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh countdown and return the epoch its ticks must carry
    pub fn start(&mut self, seconds: u32) -> u64 {
        self.epoch += 1;
        self.remaining = seconds;
        self.running = true;
        self.epoch
    }

    pub fn tick(&mut self, epoch: u64) -> TickOutcome {
        if !self.running || epoch != self.epoch {
            return TickOutcome::Stale;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            TickOutcome::Expired
        } else {
            TickOutcome::Running(self.remaining)
        }
    }

    /// Stop the countdown. Returns whether it was running; calling it again is a no-op.
    pub fn cancel(&mut self) -> bool {
        std::mem::replace(&mut self.running, false)
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

/// Background task that emits `ticks` epoch-tagged ticks, one per `period`
#[derive(Debug, Default)]
pub struct Ticker {
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any ticker still running
    pub fn start(
        &mut self,
        epoch: u64,
        ticks: u32,
        period: Duration,
        tx: mpsc::UnboundedSender<u64>,
    ) {
        self.cancel();

        self.handle = Some(tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            for _ in 0..ticks {
                interval.tick().await;
                if tx.send(epoch).is_err() {
                    break;
                }
            }
        }));
        tracing::debug!("Ticker started: epoch {}, {} ticks", epoch, ticks);
    }

    pub fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}
