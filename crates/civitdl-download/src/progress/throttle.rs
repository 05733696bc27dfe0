//! Time-based throttle for `Progress` events.
//!
//! A transfer can produce thousands of chunks per second; sinks only need a
//! handful of updates. The engine always sends a final event regardless of
//! the throttle.

use std::time::{Duration, Instant};

/// Default spacing between two progress events of the same transfer.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Rate-limiter for progress updates.
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    last_emit: Option<Instant>,
    min_interval: Duration,
}

impl ProgressThrottle {
    /// Create a throttle that lets one update through per `min_interval`.
    pub const fn new(min_interval: Duration) -> Self {
        Self {
            last_emit: None,
            min_interval,
        }
    }

    /// Whether an update may be emitted now. Records the emission if so.
    pub fn should_emit(&mut self) -> bool {
        let now = Instant::now();
        match self.last_emit {
            Some(last) if now.duration_since(last) < self.min_interval => false,
            _ => {
                self.last_emit = Some(now);
                true
            }
        }
    }
}

impl Default for ProgressThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRESS_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_check_emits() {
        let mut throttle = ProgressThrottle::default();
        assert!(throttle.should_emit());
    }

    #[test]
    fn test_suppresses_within_interval() {
        let mut throttle = ProgressThrottle::new(Duration::from_millis(50));
        assert!(throttle.should_emit());
        assert!(!throttle.should_emit());

        std::thread::sleep(Duration::from_millis(60));
        assert!(throttle.should_emit());
    }

    #[test]
    fn test_zero_interval_never_suppresses() {
        let mut throttle = ProgressThrottle::new(Duration::ZERO);
        for _ in 0..5 {
            assert!(throttle.should_emit());
        }
    }
}
