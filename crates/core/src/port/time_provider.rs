// Time Provider Port (for testability)

use chrono::{DateTime, NaiveDate, Utc};

/// Time provider interface (allows fixed clocks in tests)
pub trait TimeProvider: Send + Sync {
    /// Get current time in milliseconds since epoch
    fn now_millis(&self) -> i64;

    /// Current UTC calendar date
    fn today(&self) -> NaiveDate {
        DateTime::<Utc>::from_timestamp_millis(self.now_millis())
            .map(|dt| dt.date_naive())
            .unwrap_or_default()
    }
}

/// System time provider (production)
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Fixed clock for tests and replays
pub struct FixedTimeProvider {
    now_millis: i64,
}

impl FixedTimeProvider {
    pub fn new(now_millis: i64) -> Self {
        Self { now_millis }
    }

    /// Clock pinned to midnight UTC of `date`
    pub fn at_date(date: NaiveDate) -> Self {
        let millis = date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis())
            .unwrap_or_default();
        Self::new(millis)
    }
}

impl TimeProvider for FixedTimeProvider {
    fn now_millis(&self) -> i64 {
        self.now_millis
    }
}

/// Adjustable clock for tests
pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    pub struct MockTimeProvider {
        now_millis: AtomicI64,
    }

    impl MockTimeProvider {
        pub fn at_date(date: NaiveDate) -> Self {
            Self {
                now_millis: AtomicI64::new(FixedTimeProvider::at_date(date).now_millis()),
            }
        }

        pub fn advance_millis(&self, millis: i64) {
            self.now_millis.fetch_add(millis, Ordering::SeqCst);
        }
    }

    impl TimeProvider for MockTimeProvider {
        fn now_millis(&self) -> i64 {
            self.now_millis.load(Ordering::SeqCst)
        }
    }
}
