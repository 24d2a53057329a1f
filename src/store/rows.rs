//! Typed mapping between store rows and domain entities.
//!
//! Rows coming back from the store are untrusted: every field is checked here
//! before an entity can reach the ledger cache.

use serde_json::{json, Value};
use thiserror::Error;

use crate::domain::{
    category::{Category, CategoryOwner},
    expense::{Expense, ExpenseDraft},
};
use crate::identity::Identity;

use super::{Collection, Row, StoreError};

pub const FIELD_ID: &str = "id";
pub const FIELD_OWNER: &str = "user_id";

/// Reasons a row cannot be mapped onto a domain entity.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RowError {
    #[error("missing field `{0}`")]
    Missing(&'static str),
    #[error("field `{field}` is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl RowError {
    /// Wraps a mapping failure on a store response as a store rejection.
    pub fn into_store_error(self, collection: Collection) -> StoreError {
        StoreError::Rejected(format!("malformed {} row: {}", collection, self))
    }
}

pub fn expense_from_row(row: &Row) -> Result<Expense, RowError> {
    let id = read_id(row)?;
    let amount = read_amount(row)?;
    let category = read_string(row, "category")?;
    let raw_date = read_string(row, "date")?;
    let date = chrono::NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d").map_err(|err| {
        RowError::Invalid {
            field: "date",
            reason: format!("`{}`: {}", raw_date, err),
        }
    })?;
    let description = match row.get("description") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => {
            return Err(RowError::Invalid {
                field: "description",
                reason: format!("expected text, got {}", other),
            })
        }
    };
    Ok(Expense {
        id,
        amount,
        category,
        date,
        description,
    })
}

/// Payload for create and update calls. Identity scoping is added by the store.
pub fn expense_payload(draft: &ExpenseDraft) -> Row {
    let mut row = Row::new();
    row.insert("amount".into(), json!(draft.amount));
    row.insert("category".into(), json!(draft.category));
    row.insert("date".into(), json!(draft.date.format("%Y-%m-%d").to_string()));
    row.insert("description".into(), json!(draft.description));
    row
}

pub fn category_from_row(row: &Row) -> Result<Category, RowError> {
    let id = read_id(row)?;
    let label = read_string(row, "label")?;
    let emoji = read_string(row, "emoji")?;
    let color = read_string(row, "color")?;
    let owner = match row.get(FIELD_OWNER) {
        None | Some(Value::Null) => CategoryOwner::Shared,
        Some(Value::String(owner)) => CategoryOwner::Identity(Identity::new(owner.as_str())),
        Some(other) => {
            return Err(RowError::Invalid {
                field: FIELD_OWNER,
                reason: format!("expected text or null, got {}", other),
            })
        }
    };
    Ok(Category {
        id,
        label,
        emoji,
        color,
        owner,
    })
}

pub fn category_payload(category: &Category) -> Row {
    let mut row = Row::new();
    row.insert(FIELD_ID.into(), json!(category.id));
    row.insert("label".into(), json!(category.label));
    row.insert("emoji".into(), json!(category.emoji));
    row.insert("color".into(), json!(category.color));
    row
}

fn read_id(row: &Row) -> Result<String, RowError> {
    match row.get(FIELD_ID) {
        Some(Value::String(id)) if !id.trim().is_empty() => Ok(id.clone()),
        Some(Value::Number(id)) => Ok(id.to_string()),
        Some(other) => Err(RowError::Invalid {
            field: FIELD_ID,
            reason: format!("unusable identifier {}", other),
        }),
        None => Err(RowError::Missing(FIELD_ID)),
    }
}

fn read_string(row: &Row, field: &'static str) -> Result<String, RowError> {
    match row.get(field) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(other) => Err(RowError::Invalid {
            field,
            reason: format!("expected text, got {}", other),
        }),
        None => Err(RowError::Missing(field)),
    }
}

fn read_amount(row: &Row) -> Result<f64, RowError> {
    let amount = match row.get("amount") {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        Some(_) => None,
        None => return Err(RowError::Missing("amount")),
    };
    match amount {
        Some(value) if value.is_finite() && value > 0.0 => Ok(value),
        Some(value) => Err(RowError::Invalid {
            field: "amount",
            reason: format!("{} is not a positive amount", value),
        }),
        None => Err(RowError::Invalid {
            field: "amount",
            reason: "not numeric".into(),
        }),
    }
}
