//! System clock implementation.

use chrono::{DateTime, Utc};

use crate::infrastructure::ports::ClockPort;

/// Wall-clock time for production use.
pub struct SystemClock;

impl ClockPort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
