//! Referential checks between expenses and categories.

use std::collections::BTreeMap;

use crate::domain::expense::Expense;
use crate::errors::LedgerError;
use crate::ledger::LedgerSnapshot;

/// Number of expenses tagged with `category_id`.
pub fn referencing_expenses(category_id: &str, expenses: &[Expense]) -> usize {
    expenses
        .iter()
        .filter(|expense| expense.category == category_id)
        .count()
}

pub fn can_delete_category(category_id: &str, expenses: &[Expense]) -> bool {
    referencing_expenses(category_id, expenses) == 0
}

pub fn ensure_category_deletable(category_id: &str, expenses: &[Expense]) -> Result<(), LedgerError> {
    match referencing_expenses(category_id, expenses) {
        0 => Ok(()),
        1 => Err(LedgerError::ConstraintViolation(format!(
            "category `{}` is used by 1 expense",
            category_id
        ))),
        count => Err(LedgerError::ConstraintViolation(format!(
            "category `{}` is used by {} expenses",
            category_id, count
        ))),
    }
}

/// Expenses pointing at categories missing from the snapshot, one line per
/// unknown category.
pub fn ledger_warnings(snapshot: &LedgerSnapshot) -> Vec<String> {
    let mut dangling: BTreeMap<&str, usize> = BTreeMap::new();
    for expense in snapshot.expenses() {
        if snapshot.category(&expense.category).is_none() {
            *dangling.entry(expense.category.as_str()).or_insert(0) += 1;
        }
    }
    dangling
        .into_iter()
        .map(|(category, count)| {
            format!(
                "{} expense(s) reference unknown category `{}`",
                count, category
            )
        })
        .collect()
}
