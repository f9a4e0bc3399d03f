//! Wall-clock abstraction
//!
//! Token expiry and the CSRF reload guard both compare against wall-clock
//! time. Routing that through [`Clock`] keeps those checks deterministic in
//! tests.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use feedwire_common::testing::{Clock, MockClock, SystemClock};
//!
//! let _now = SystemClock.unix_secs();
//!
//! let mock = MockClock::at_unix_secs(1_700_000_000);
//! mock.advance(Duration::from_secs(5));
//! assert_eq!(mock.unix_secs(), 1_700_000_005);
//! ```

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

/// Source of wall-clock time.
pub trait Clock: Send + Sync {
    fn system_time(&self) -> SystemTime;

    /// Milliseconds since the UNIX epoch
    fn millis_since_epoch(&self) -> u64 {
        let millis = self.system_time().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        u64::try_from(millis).unwrap_or(u64::MAX)
    }

    /// Whole seconds since the UNIX epoch, the unit of JWT `exp`
    fn unix_secs(&self) -> i64 {
        let secs = self.system_time().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
        i64::try_from(secs).unwrap_or(i64::MAX)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Manually driven clock.
///
/// Clones share one reading, so a clock handed to a component can still be
/// moved from the test body.
#[derive(Debug, Clone)]
pub struct MockClock {
    current: Arc<Mutex<SystemTime>>,
}

impl MockClock {
    /// Clock reading `secs` after the epoch
    #[must_use]
    pub fn at_unix_secs(secs: u64) -> Self {
        Self { current: Arc::new(Mutex::new(UNIX_EPOCH + Duration::from_secs(secs))) }
    }

    pub fn advance(&self, by: Duration) {
        *self.current.lock() += by;
    }

    /// Move the clock backwards, e.g. to simulate a wall-clock correction.
    pub fn rewind(&self, by: Duration) {
        let mut current = self.current.lock();
        *current = current.checked_sub(by).unwrap_or(UNIX_EPOCH);
    }
}

impl Clock for MockClock {
    fn system_time(&self) -> SystemTime {
        *self.current.lock()
    }
}
