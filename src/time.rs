use chrono::{Local, NaiveDate};

/// Clock abstracts access to the current date so aggregation stays
/// deterministic in tests.
pub trait Clock: Send + Sync {
    /// Returns the current calendar day in the user's local time zone.
    fn today(&self) -> NaiveDate;
}

/// Clock backed by the operating system's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to a single day.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
