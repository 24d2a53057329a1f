//! Ledger state, period windows, aggregation and calendar bucketing.

pub mod aggregate;
pub mod cache;
pub mod calendar;
pub mod period;

pub use aggregate::{aggregate, round_half_up, window_total, CategoryShare, PeriodStats};
pub use cache::{LedgerCache, LedgerSnapshot, LoadReport};
pub use calendar::{
    bucket, calendar_grid, CalendarMonth, DayBucket, Intensity, IntensityThresholds,
};
pub use period::{
    current_window, previous_window, start_of_week, DisplayedMonth, Period, PeriodWindow,
};
