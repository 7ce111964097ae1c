use std::time::Duration;

/// Cool-down applied after failed connection attempts.
///
/// With the default (disabled) policy a failed attempt is retried as soon as
/// the next caller asks for a connection. When enabled, callers arriving
/// within the window after a failure are refused without touching the
/// network; the window grows by `multiplier` with each consecutive failure up
/// to `max_backoff` and resets on success.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}

impl ReconnectPolicy {
    pub fn disabled() -> Self {
        Self {
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }

    pub fn exponential(initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            initial_backoff,
            max_backoff,
            multiplier: 2.0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.initial_backoff.is_zero()
    }

    /// Cool-down after `consecutive_failures` failed attempts in a row, or `None` when disabled.
    pub fn delay_after(&self, consecutive_failures: u32) -> Option<Duration> {
        if !self.is_enabled() || consecutive_failures == 0 {
            return None;
        }
        let exponent = consecutive_failures.saturating_sub(1).min(31) as i32;
        let factor = self.multiplier.max(1.0).powi(exponent);
        let millis = (self.initial_backoff.as_millis() as f64 * factor).min(self.max_backoff.as_millis() as f64);
        Some(Duration::from_millis(millis as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_policy_never_delays() {
        let policy = ReconnectPolicy::default();
        assert!(!policy.is_enabled());
        assert_eq!(policy.delay_after(1), None);
        assert_eq!(policy.delay_after(10), None);
    }

    #[test]
    fn delay_grows_and_caps() {
        let policy = ReconnectPolicy::exponential(Duration::from_millis(100), Duration::from_millis(500));
        assert_eq!(policy.delay_after(0), None);
        assert_eq!(policy.delay_after(1), Some(Duration::from_millis(100)));
        assert_eq!(policy.delay_after(2), Some(Duration::from_millis(200)));
        assert_eq!(policy.delay_after(3), Some(Duration::from_millis(400)));
        assert_eq!(policy.delay_after(4), Some(Duration::from_millis(500)));
        assert_eq!(policy.delay_after(40), Some(Duration::from_millis(500)));
    }
}
