//! Time source for stamping and validating entries.

use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::lock::mutex_lock;

pub trait Clock: Send + Sync + fmt::Debug {
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

/// A clock that only moves when told to. Lets TTL boundaries be checked
/// exactly instead of by sleeping.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn starting_now() -> Self {
        Self::new(Utc::now())
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(by) = chrono::Duration::from_std(by) {
            let mut now = mutex_lock(&self.now, "clock.advance");
            *now += by;
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *mutex_lock(&self.now, "clock.set") = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *mutex_lock(&self.now, "clock.now")
    }
}
