//! Time based rate limiting of adjustments.

use std::time::{Duration, Instant};

/// Whether an adjustment at `now` is still inside the cooldown of the previous one.
///
/// A `now` before `last_adjustment` counts as zero time elapsed.
pub fn is_blocked(now: Instant, last_adjustment: Instant, period: Duration) -> bool {
    now.saturating_duration_since(last_adjustment) < period
}

/// Rate limiter shared by the increase and decrease paths.
#[derive(Debug, Clone)]
pub(crate) struct CooldownGate {
    period: Duration,
    last_adjustment: Option<Instant>,
}

impl CooldownGate {
    pub fn new(period: Duration) -> Self {
        CooldownGate {
            period,
            last_adjustment: None,
        }
    }

    pub fn is_blocked(&self, now: Instant) -> bool {
        let Some(last) = self.last_adjustment else {
            return false;
        };
        is_blocked(now, last, self.period)
    }

    /// Must only be called when an adjustment was actually emitted.
    pub fn record(&mut self, now: Instant) {
        self.last_adjustment = Some(now);
    }

    pub fn last_adjustment(&self) -> Option<Instant> {
        self.last_adjustment
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn never_adjusted_is_open() {
        let gate = CooldownGate::new(Duration::from_secs(3));
        assert!(!gate.is_blocked(Instant::now()));
    }

    #[test]
    fn blocked_within_period() {
        let now = Instant::now();
        let mut gate = CooldownGate::new(Duration::from_secs(3));
        gate.record(now);

        assert!(gate.is_blocked(now));
        assert!(gate.is_blocked(now + Duration::from_millis(2999)));
        assert!(!gate.is_blocked(now + Duration::from_secs(3)));
        assert!(!gate.is_blocked(now + Duration::from_secs(10)));
    }

    #[test]
    fn time_going_backwards_is_blocked() {
        let now = Instant::now() + Duration::from_secs(60);
        assert!(is_blocked(
            now - Duration::from_secs(1),
            now,
            Duration::from_secs(3)
        ));
    }

    #[test]
    fn zero_period_never_blocks() {
        let now = Instant::now();
        assert!(!is_blocked(now, now, Duration::ZERO));
    }
}
