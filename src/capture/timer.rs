use std::time::{Duration, Instant};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Fixed-interval capture schedule. The existence of a timer is what marks
/// the capture loop as running.
///
/// Cycles are serialized: if a cycle overruns one or more deadlines, those
/// ticks are coalesced into the next due tick and reported as missed. The
/// schedule keeps its original phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureTimer {
    interval: Duration,
    next_due: Instant,
}

impl CaptureTimer {
    /// First tick is due one interval after `now`.
    pub fn start(interval: Duration, now: Instant) -> Self {
        let interval = interval.max(MIN_INTERVAL);
        Self {
            interval,
            next_due: now + interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn next_due(&self) -> Instant {
        self.next_due
    }

    /// Returns `Some(missed)` when a tick is due at `now`, where `missed` is
    /// the number of earlier deadlines folded into this tick.
    pub fn poll(&mut self, now: Instant) -> Option<u64> {
        if now < self.next_due {
            return None;
        }
        let late = now.duration_since(self.next_due);
        let missed = (late.as_nanos() / self.interval.as_nanos()) as u64;
        let steps = u32::try_from(missed + 1).unwrap_or(u32::MAX);
        self.next_due += self.interval.saturating_mul(steps);
        Some(missed)
    }
}
