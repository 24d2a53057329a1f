//! Period selectors, the navigable displayed month, and window arithmetic.

use std::{fmt, str::FromStr};

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::LedgerError;

/// Granularity of an aggregation window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    Month,
    Year,
}

impl Period {
    pub const ALL: [Period; 4] = [Period::Day, Period::Week, Period::Month, Period::Year];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        }
    }

    /// Short label of the window the current one is compared against.
    pub fn previous_label(&self) -> &'static str {
        match self {
            Period::Day => "yesterday",
            Period::Week => "last week",
            Period::Month => "last month",
            Period::Year => "last year",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = LedgerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" | "today" | "dia" => Ok(Period::Day),
            "week" | "semana" => Ok(Period::Week),
            "month" | "mes" => Ok(Period::Month),
            "year" | "anio" => Ok(Period::Year),
            other => Err(LedgerError::Validation(format!(
                "unknown period `{}` (expected day, week, month or year)",
                other
            ))),
        }
    }
}

/// Month the user is currently looking at. Navigable independently of the
/// real current month.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DisplayedMonth {
    year: i32,
    month: u32,
}

impl DisplayedMonth {
    /// `month` is 1-based.
    pub fn new(year: i32, month: u32) -> Result<Self, LedgerError> {
        if !(1..=12).contains(&month) {
            return Err(LedgerError::Validation(format!(
                "month must be between 1 and 12 (got {})",
                month
            )));
        }
        if !(1..=9999).contains(&year) {
            return Err(LedgerError::Validation(format!(
                "year must be between 1 and 9999 (got {})",
                year
            )));
        }
        Ok(Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next()
            .first_day()
            .pred_opt()
            .unwrap_or_else(|| self.first_day())
    }

    pub fn days_in_month(&self) -> u32 {
        self.last_day().day()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn date(&self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }
}

impl fmt::Display for DisplayedMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for DisplayedMonth {
    type Err = LedgerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || LedgerError::Validation(format!("`{}` is not a YYYY-MM month", value));
        let (year, month) = value.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeriodWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PeriodWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

impl fmt::Display for PeriodWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{} .. {}", self.start, self.end)
        }
    }
}

/// Most recent Sunday at or before `date`.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

/// Window selected by `period`. Day and week follow `reference`; month and
/// year follow the displayed month.
pub fn current_window(
    period: Period,
    reference: NaiveDate,
    displayed: DisplayedMonth,
) -> PeriodWindow {
    match period {
        Period::Day => PeriodWindow {
            start: reference,
            end: reference,
        },
        Period::Week => PeriodWindow {
            start: start_of_week(reference),
            end: reference,
        },
        Period::Month => PeriodWindow {
            start: displayed.first_day(),
            end: displayed.last_day(),
        },
        Period::Year => year_window(displayed.year()),
    }
}

/// Window of the same granularity immediately preceding the current one.
pub fn previous_window(
    period: Period,
    reference: NaiveDate,
    displayed: DisplayedMonth,
) -> PeriodWindow {
    match period {
        Period::Day => {
            let yesterday = reference - Duration::days(1);
            PeriodWindow {
                start: yesterday,
                end: yesterday,
            }
        }
        Period::Week => {
            let week_start = start_of_week(reference);
            PeriodWindow {
                start: week_start - Duration::days(7),
                end: week_start - Duration::days(1),
            }
        }
        Period::Month => {
            let previous = displayed.previous();
            PeriodWindow {
                start: previous.first_day(),
                end: previous.last_day(),
            }
        }
        Period::Year => year_window(displayed.year() - 1),
    }
}

fn year_window(year: i32) -> PeriodWindow {
    PeriodWindow {
        start: NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(NaiveDate::MIN),
        end: NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(NaiveDate::MAX),
    }
}
