//! Injected time source.
//!
//! Stores that assign ids or compute idle times read the current time through
//! [`Clock`] so tests can pin or advance it.

use chrono::{DateTime, Utc};

/// Clock trait for time operations
///
/// Allows tests to control time deterministically.
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;

    /// Current time as milliseconds since the Unix epoch, clamped at zero.
    fn now_millis(&self) -> u64 {
        u64::try_from(self.now().timestamp_millis()).unwrap_or(0)
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_reports_positive_millis() {
        assert!(SystemClock.now_millis() > 1_600_000_000_000);
    }
}
