//! Per-day grouping of a month and the month grid used by calendar views.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::expense::Expense;
use crate::errors::LedgerError;

use super::period::DisplayedMonth;

pub const DEFAULT_MEDIUM_THRESHOLD: f64 = 1500.0;
pub const DEFAULT_HIGH_THRESHOLD: f64 = 3000.0;

/// Daily totals above `medium` are medium intensity, above `high` high.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct IntensityThresholds {
    pub medium: f64,
    pub high: f64,
}

impl Default for IntensityThresholds {
    fn default() -> Self {
        Self {
            medium: DEFAULT_MEDIUM_THRESHOLD,
            high: DEFAULT_HIGH_THRESHOLD,
        }
    }
}

impl IntensityThresholds {
    pub fn new(medium: f64, high: f64) -> Result<Self, LedgerError> {
        let thresholds = Self { medium, high };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if !self.medium.is_finite() || self.medium <= 0.0 {
            return Err(LedgerError::Validation(format!(
                "medium threshold must be positive (got {})",
                self.medium
            )));
        }
        if !self.high.is_finite() || self.high <= self.medium {
            return Err(LedgerError::Validation(format!(
                "high threshold ({}) must exceed the medium threshold ({})",
                self.high, self.medium
            )));
        }
        Ok(())
    }

    pub fn classify(&self, total: f64) -> Intensity {
        if total > self.high {
            Intensity::High
        } else if total > self.medium {
            Intensity::Medium
        } else {
            Intensity::Low
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Low,
    Medium,
    High,
}

impl Intensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intensity::Low => "low",
            Intensity::Medium => "medium",
            Intensity::High => "high",
        }
    }
}

/// Expenses of a single day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayBucket {
    pub expenses: Vec<Expense>,
    pub total: f64,
    pub intensity: Intensity,
}

/// Groups the expenses of `displayed` by exact date. Within a bucket entries
/// keep their ledger order.
pub fn bucket(
    expenses: &[Expense],
    displayed: DisplayedMonth,
    thresholds: &IntensityThresholds,
) -> BTreeMap<NaiveDate, DayBucket> {
    let mut days: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();
    for expense in expenses.iter().filter(|e| displayed.contains(e.date)) {
        let bucket = days.entry(expense.date).or_insert_with(|| DayBucket {
            expenses: Vec::new(),
            total: 0.0,
            intensity: Intensity::Low,
        });
        bucket.total += expense.amount;
        bucket.expenses.push(expense.clone());
    }
    for bucket in days.values_mut() {
        bucket.intensity = thresholds.classify(bucket.total);
    }
    days
}

/// Month grid cells: one `None` per weekday before day 1 (Sunday first),
/// followed by every day number.
pub fn calendar_grid(displayed: DisplayedMonth) -> Vec<Option<u32>> {
    let offset = displayed.first_day().weekday().num_days_from_sunday() as usize;
    let days = displayed.days_in_month();
    let mut cells = Vec::with_capacity(offset + days as usize);
    cells.resize(offset, None);
    cells.extend((1..=days).map(Some));
    cells
}

/// Everything a month view needs in one value.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarMonth {
    pub month: DisplayedMonth,
    pub cells: Vec<Option<u32>>,
    pub days: BTreeMap<NaiveDate, DayBucket>,
    pub month_total: f64,
}

impl CalendarMonth {
    pub fn build(
        expenses: &[Expense],
        displayed: DisplayedMonth,
        thresholds: &IntensityThresholds,
    ) -> Self {
        let days = bucket(expenses, displayed, thresholds);
        let month_total = days.values().map(|day| day.total).sum();
        Self {
            month: displayed,
            cells: calendar_grid(displayed),
            days,
            month_total,
        }
    }

    /// Rows of seven cells; the last row may be shorter.
    pub fn weeks(&self) -> impl Iterator<Item = &[Option<u32>]> {
        self.cells.chunks(7)
    }

    pub fn day(&self, day: u32) -> Option<&DayBucket> {
        let date = self.month.date(day)?;
        self.days.get(&date)
    }

    pub fn busiest_day(&self) -> Option<(NaiveDate, &DayBucket)> {
        self.days
            .iter()
            .max_by(|a, b| {
                a.1.total
                    .partial_cmp(&b.1.total)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(date, bucket)| (*date, bucket))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::expense::ExpenseDraft;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn expense(id: &str, amount: f64, on: NaiveDate) -> Expense {
        Expense::from_draft(id, ExpenseDraft::new(amount, "food", on))
    }

    #[test]
    fn grid_offsets_by_weekday_of_first_day() {
        // 2024-03-01 is a Friday.
        let grid = calendar_grid(DisplayedMonth::new(2024, 3).unwrap());
        assert_eq!(grid.len(), 5 + 31);
        assert!(grid[..5].iter().all(Option::is_none));
        assert_eq!(grid[5], Some(1));
        assert_eq!(grid.last(), Some(&Some(31)));

        // 2023-10-01 is a Sunday.
        let grid = calendar_grid(DisplayedMonth::new(2023, 10).unwrap());
        assert_eq!(grid[0], Some(1));
    }

    #[test]
    fn intensity_tiers_use_strict_thresholds() {
        let thresholds = IntensityThresholds::default();
        assert_eq!(thresholds.classify(1500.0), Intensity::Low);
        assert_eq!(thresholds.classify(1500.01), Intensity::Medium);
        assert_eq!(thresholds.classify(3000.0), Intensity::Medium);
        assert_eq!(thresholds.classify(3200.0), Intensity::High);
    }

    #[test]
    fn buckets_only_cover_displayed_month() {
        let expenses = vec![
            expense("1", 1000.0, date(2024, 3, 2)),
            expense("2", 900.0, date(2024, 3, 2)),
            expense("3", 40.0, date(2024, 3, 9)),
            expense("4", 70.0, date(2024, 4, 1)),
        ];
        let days = bucket(
            &expenses,
            DisplayedMonth::new(2024, 3).unwrap(),
            &IntensityThresholds::default(),
        );
        assert_eq!(days.len(), 2);
        let busy = &days[&date(2024, 3, 2)];
        assert_eq!(busy.total, 1900.0);
        assert_eq!(busy.intensity, Intensity::Medium);
        assert_eq!(busy.expenses[0].id, "1");
        assert_eq!(days[&date(2024, 3, 9)].intensity, Intensity::Low);
    }

    #[test]
    fn calendar_month_bundles_grid_and_totals() {
        let expenses = vec![
            expense("1", 3500.0, date(2024, 2, 29)),
            expense("2", 20.0, date(2024, 2, 1)),
        ];
        let month = CalendarMonth::build(
            &expenses,
            DisplayedMonth::new(2024, 2).unwrap(),
            &IntensityThresholds::default(),
        );
        assert_eq!(month.month_total, 3520.0);
        assert_eq!(month.day(29).unwrap().intensity, Intensity::High);
        assert!(month.day(30).is_none());
        assert!(month.day(15).is_none());
        assert!(month.weeks().all(|week| week.len() <= 7));
        assert_eq!(month.busiest_day().unwrap().0, date(2024, 2, 29));
    }

    #[test]
    fn thresholds_must_be_ordered() {
        assert!(IntensityThresholds::new(1500.0, 3000.0).is_ok());
        assert!(IntensityThresholds::new(3000.0, 1500.0).is_err());
        assert!(IntensityThresholds::new(0.0, 10.0).is_err());
    }
}
