//! # Streamgate Testing
//!
//! Testing utilities for code built on the Streamgate gateway.
//!
//! This crate provides:
//! - [`InMemoryLogStore`]: a `LogStore` with full consumer-group semantics
//! - Deterministic clocks ([`FixedClock`], [`ManualClock`])
//! - Tracing setup for tests
//! - proptest strategies for stream and consumer names and payloads
//!
//! ## Example
//!
//! ```
//! use std::time::Duration;
//! use streamgate_core::{Gateway, StartId};
//! use streamgate_testing::{InMemoryLogStore, ManualClock, test_clock};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let clock = ManualClock::new(test_clock().now_utc());
//! let gateway = Gateway::with_defaults(InMemoryLogStore::with_clock(clock.clone()));
//!
//! gateway.ensure_group("orders", StartId::Latest, false).await?;
//! gateway.produce("orders", b"order1", None, true).await?;
//! gateway.consume("orders", "worker-1", None).await?;
//!
//! clock.advance(Duration::from_secs(60));
//! assert!(gateway.reclaim_one("orders", "worker-2", Duration::from_secs(30)).await?);
//! # Ok(())
//! # }
//! ```

mod log_store;

pub use log_store::{InMemoryLogStore, ReadCall};

use chrono::{DateTime, Utc};
use streamgate_core::environment::Clock;

/// Mock implementations of [`Clock`].
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use streamgate_testing::mocks::FixedClock;
    /// use streamgate_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }

        /// The time this clock reports.
        #[must_use]
        pub const fn now_utc(&self) -> DateTime<Utc> {
            self.time
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when told to.
    ///
    /// Clones share the same time, so a test can keep one handle and give
    /// another to a store.
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use streamgate_testing::mocks::ManualClock;
    /// use streamgate_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = ManualClock::new(Utc::now());
    /// let before = clock.now_millis();
    /// clock.advance(Duration::from_millis(250));
    /// assert_eq!(clock.now_millis(), before + 250);
    /// ```
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Create a clock stopped at `time`.
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(time)),
            }
        }

        /// Move the clock forward.
        ///
        /// # Panics
        ///
        /// Panics if `by` does not fit a `chrono` duration or the lock is
        /// poisoned.
        #[allow(clippy::expect_used)]
        pub fn advance(&self, by: Duration) {
            let by = chrono::Duration::from_std(by).expect("advance fits a chrono duration");
            *self.time.lock().expect("clock lock poisoned") += by;
        }

        /// Jump to `time`, which may lie in the past.
        ///
        /// # Panics
        ///
        /// Panics if the lock is poisoned.
        #[allow(clippy::expect_used)]
        pub fn set(&self, time: DateTime<Utc>) {
            *self.time.lock().expect("clock lock poisoned") = time;
        }
    }

    impl Clock for ManualClock {
        #[allow(clippy::expect_used)]
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().expect("clock lock poisoned")
        }
    }

    /// Create a default fixed clock for tests (2023-11-14 22:13:20 UTC,
    /// epoch millis `1700000000000`)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp is out of range,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::from_timestamp_millis(1_700_000_000_000)
                .expect("hardcoded timestamp should always be in range"),
        )
    }
}

/// Test helpers and utilities.
pub mod helpers {
    /// Initialize test logging; safe to call from every test.
    ///
    /// Honors `RUST_LOG` and defaults to `streamgate=debug`. Output goes
    /// through the test writer, so it only shows for failing tests.
    ///
    /// # Panics
    ///
    /// Panics if the built-in directive fails to parse, which should never
    /// happen in practice.
    #[allow(clippy::expect_used)]
    pub fn init_test_tracing() {
        use tracing_subscriber::{EnvFilter, fmt};

        let _ = fmt()
            .with_env_filter(
                EnvFilter::from_default_env()
                    .add_directive("streamgate_core=debug".parse().expect("valid directive")),
            )
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;

    /// Stream names: short, lowercase, optionally namespaced with `:`.
    pub fn stream_name() -> impl Strategy<Value = String> {
        "[a-z]{1,8}(:[a-z0-9]{1,6})?"
    }

    /// Consumer names like `worker-3`.
    pub fn consumer_name() -> impl Strategy<Value = String> {
        (0_u8..16).prop_map(|n| format!("worker-{n}"))
    }

    /// Arbitrary binary payloads, including empty ones.
    pub fn payload() -> impl Strategy<Value = Vec<u8>> {
        proptest::collection::vec(any::<u8>(), 0..64)
    }

    /// Clock moves between appends in milliseconds; negative values move the
    /// clock backwards.
    pub fn clock_steps() -> impl Strategy<Value = Vec<i64>> {
        proptest::collection::vec(-50_i64..50, 1..40)
    }
}

// Re-export commonly used items
pub use helpers::init_test_tracing;
pub use mocks::{FixedClock, ManualClock, test_clock};

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
        assert_eq!(clock.now_millis(), 1_700_000_000_000);
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(test_clock().now_utc());
        let handle = clock.clone();

        handle.advance(Duration::from_secs(2));
        assert_eq!(clock.now_millis(), 1_700_000_002_000);

        handle.set(test_clock().now_utc());
        assert_eq!(clock.now_millis(), 1_700_000_000_000);
    }
}
