use std::time::Duration;

/// Counts events over a fixed window and reports the rate once per window.
#[derive(Debug, Clone)]
pub struct RateMeter {
    window: Duration,
    elapsed: Duration,
    count: u32,
}

impl RateMeter {
    pub fn new(window: Duration) -> Self {
        debug_assert!(!window.is_zero());
        Self {
            window,
            elapsed: Duration::ZERO,
            count: 0,
        }
    }

    /// Records one event that took `dt`.
    ///
    /// Returns events per second whenever a full window has elapsed, then
    /// starts a new window.
    pub fn record(&mut self, dt: Duration) -> Option<f64> {
        self.elapsed += dt;
        self.count += 1;

        if self.elapsed < self.window {
            return None;
        }

        let rate = self.count as f64 / self.elapsed.as_secs_f64();
        self.elapsed = Duration::ZERO;
        self.count = 0;
        Some(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_once_per_window() {
        let mut meter = RateMeter::new(Duration::from_secs(1));
        let dt = Duration::from_millis(250);
        assert_eq!(meter.record(dt), None);
        assert_eq!(meter.record(dt), None);
        assert_eq!(meter.record(dt), None);
        let rate = meter.record(dt).unwrap();
        assert!((rate - 4.0).abs() < 1e-9);
        assert_eq!(meter.record(dt), None);
    }
}
