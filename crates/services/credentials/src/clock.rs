//! Time source for token issuance and expiry checks.

use chrono::{DateTime, Utc};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Current UTC time. Injected so expiry can be tested without sleeping.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
