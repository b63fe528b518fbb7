//! Time source used when measuring how long ago an item was created.

use chrono::{DateTime, Utc};

/// Supply the current instant.
///
/// Handlers read the clock once per item so that popularity decays
/// continuously with wall-clock time. Tests substitute a fixed instant.
pub trait Clock: Send + Sync {
    /// Current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time from the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
