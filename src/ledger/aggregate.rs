//! Time-windowed totals, per-category breakdowns and period-over-period
//! deltas.

use std::{cmp::Ordering, collections::BTreeMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::expense::Expense;

use super::period::{current_window, previous_window, DisplayedMonth, Period, PeriodWindow};

/// Share of one category within a window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryShare {
    pub category: String,
    pub amount: f64,
    pub percentage: i64,
}

/// Aggregated view of a period window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeriodStats {
    pub period: Period,
    pub window: PeriodWindow,
    pub previous_window: PeriodWindow,
    pub total: f64,
    pub by_category: Vec<CategoryShare>,
    pub previous_total: f64,
    /// Percent change against the previous window; `0` when the previous
    /// window is empty.
    pub change: i64,
}

impl PeriodStats {
    pub fn is_empty(&self) -> bool {
        self.by_category.is_empty()
    }
}

/// Rounds halves towards positive infinity, like `Math.round`.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Sum of amounts of the expenses dated inside `window`.
pub fn window_total(expenses: &[Expense], window: &PeriodWindow) -> f64 {
    expenses
        .iter()
        .filter(|expense| window.contains(expense.date))
        .map(|expense| expense.amount)
        .sum()
}

pub fn aggregate(
    expenses: &[Expense],
    period: Period,
    reference: NaiveDate,
    displayed: DisplayedMonth,
) -> PeriodStats {
    let window = current_window(period, reference, displayed);
    let previous = previous_window(period, reference, displayed);

    let mut per_category: BTreeMap<&str, f64> = BTreeMap::new();
    let mut total = 0.0;
    for expense in expenses.iter().filter(|e| window.contains(e.date)) {
        total += expense.amount;
        *per_category.entry(expense.category.as_str()).or_insert(0.0) += expense.amount;
    }

    let mut by_category: Vec<CategoryShare> = per_category
        .into_iter()
        .filter(|(_, amount)| *amount > 0.0)
        .map(|(category, amount)| CategoryShare {
            category: category.to_string(),
            amount,
            percentage: percentage_of(amount, total),
        })
        .collect();
    // Stable sort keeps ties in category id order.
    by_category.sort_by(|a, b| b.amount.partial_cmp(&a.amount).unwrap_or(Ordering::Equal));

    let previous_total = window_total(expenses, &previous);
    let change = if previous_total > 0.0 {
        round_half_up((total - previous_total) / previous_total * 100.0)
    } else {
        0
    };

    PeriodStats {
        period,
        window,
        previous_window: previous,
        total,
        by_category,
        previous_total,
        change,
    }
}

fn percentage_of(amount: f64, total: f64) -> i64 {
    if total > 0.0 {
        round_half_up(amount / total * 100.0)
    } else {
        0
    }
}
