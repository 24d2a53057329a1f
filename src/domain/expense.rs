//! Domain types representing recorded expenses.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::*;
use crate::errors::LedgerError;

const TEMPORARY_ID_PREFIX: &str = "tmp-";

/// A single cash outlay tagged with a category and a calendar date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    pub id: String,
    pub amount: f64,
    pub category: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
}

impl Expense {
    /// Builds the local, not yet confirmed entry for `draft`.
    pub fn provisional(draft: ExpenseDraft) -> Self {
        Self::from_draft(temporary_id(), draft)
    }

    pub fn from_draft(id: impl Into<String>, draft: ExpenseDraft) -> Self {
        Self {
            id: id.into(),
            amount: draft.amount,
            category: draft.category,
            date: draft.date,
            description: draft.description,
        }
    }

    /// True while the entry carries a local identifier awaiting confirmation.
    pub fn is_provisional(&self) -> bool {
        self.id.starts_with(TEMPORARY_ID_PREFIX)
    }

    /// Lexically sortable `YYYY-MM-DD` key.
    pub fn date_key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    pub fn to_draft(&self) -> ExpenseDraft {
        ExpenseDraft {
            amount: self.amount,
            category: self.category.clone(),
            date: self.date,
            description: self.description.clone(),
        }
    }
}

impl Identifiable for Expense {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Displayable for Expense {
    fn display_label(&self) -> String {
        if self.description.is_empty() {
            format!("{} {} {:.2}", self.date_key(), self.category, self.amount)
        } else {
            format!(
                "{} {} {:.2} ({})",
                self.date_key(),
                self.category,
                self.amount,
                self.description
            )
        }
    }
}

/// User input for creating or editing an expense.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpenseDraft {
    pub amount: f64,
    pub category: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
}

impl ExpenseDraft {
    pub fn new(amount: f64, category: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            amount,
            category: category.into(),
            date,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Rejects drafts that can never be committed.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(LedgerError::Validation(format!(
                "amount must be greater than zero (got {})",
                self.amount
            )));
        }
        if self.category.trim().is_empty() {
            return Err(LedgerError::Validation("category is required".into()));
        }
        Ok(())
    }
}

fn temporary_id() -> String {
    format!("{}{}", TEMPORARY_ID_PREFIX, Uuid::new_v4())
}

/// Parses a `YYYY-MM-DD` date key.
pub fn parse_date_key(value: &str) -> Result<NaiveDate, LedgerError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| LedgerError::Validation(format!("`{}` is not a YYYY-MM-DD date", value)))
}
