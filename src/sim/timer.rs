//! Time gating for the game loop
//!
//! [`FixedStep`] turns variable frame times into a whole number of logic
//! ticks. [`Timers`] holds short fire-and-forget delays (UI feedback) that are
//! advanced by the same elapsed time and can all be released at once.

use std::time::Duration;

/// Fixed-interval accumulator
#[derive(Debug, Clone)]
pub struct FixedStep {
    interval: Duration,
    accumulator: Duration,
    max_substeps: u32,
}

impl FixedStep {
    pub fn new(interval: Duration, max_substeps: u32) -> Self {
        Self {
            interval,
            accumulator: Duration::ZERO,
            max_substeps: max_substeps.max(1),
        }
    }

    /// Add elapsed time and return how many ticks are due.
    ///
    /// At most `max_substeps` ticks run per call; lag beyond that is dropped.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        if self.interval.is_zero() {
            return 0;
        }
        self.accumulator = self.accumulator.saturating_add(elapsed);

        let mut ticks = 0;
        while self.accumulator >= self.interval && ticks < self.max_substeps {
            self.accumulator -= self.interval;
            ticks += 1;
        }
        if ticks == self.max_substeps && self.accumulator >= self.interval {
            log::debug!("Dropping {:?} of lag", self.accumulator);
            self.accumulator = Duration::ZERO;
        }
        ticks
    }

    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
    }

    /// Time banked toward the next tick
    pub fn lag(&self) -> Duration {
        self.accumulator
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Handle returned by [`Timers::schedule`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// What a fired timer asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    ClearWrongFlash,
}

#[derive(Debug, Clone)]
struct Pending {
    id: TimerId,
    remaining: Duration,
    action: TimerAction,
}

/// Cancellable one-shot timers
#[derive(Debug, Clone, Default)]
pub struct Timers {
    pending: Vec<Pending>,
    next_id: u64,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, delay: Duration, action: TimerAction) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            id,
            remaining: delay,
            action,
        });
        id
    }

    /// Returns false if the timer already fired or was cancelled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        self.pending.len() != before
    }

    /// Count down by `elapsed` and return the actions that came due, in
    /// scheduling order
    pub fn advance(&mut self, elapsed: Duration) -> Vec<TimerAction> {
        let mut fired = Vec::new();
        self.pending.retain_mut(|p| {
            p.remaining = p.remaining.saturating_sub(elapsed);
            if p.remaining.is_zero() {
                fired.push(p.action);
                false
            } else {
                true
            }
        });
        fired
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}
