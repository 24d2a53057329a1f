//! Optimistic create, edit and delete of expenses.

use tracing::{debug, info, warn};

use crate::core::ledger_manager::LedgerManager;
use crate::domain::expense::{Expense, ExpenseDraft};
use crate::errors::LedgerError;
use crate::ledger::cache::{CacheState, EntityKey};
use crate::store::{
    rows::{expense_from_row, expense_payload},
    Collection, Row, StoreError,
};

use super::ServiceResult;

/// Applies expense changes to the cache first and mirrors them to the remote
/// store, rolling the cache back when the store refuses.
pub struct ExpenseService;

impl ExpenseService {
    /// Records a new expense and returns it with its definitive id.
    pub fn add(manager: &LedgerManager, draft: ExpenseDraft) -> ServiceResult<Expense> {
        draft.validate()?;
        let provisional = Expense::provisional(draft.clone());
        let temp_id = provisional.id.clone();
        let key = EntityKey::Expense(temp_id.clone());

        let (identity, generation) = manager.cache().write(|state| -> ServiceResult<_> {
            let identity = state
                .identity()
                .cloned()
                .ok_or(LedgerError::NoActiveIdentity)?;
            ensure_category_settled(state, &draft.category)?;
            state.begin(key.clone())?;
            state.insert(provisional);
            Ok((identity, state.generation()))
        })?;
        debug!(id = %temp_id, amount = draft.amount, "Applied optimistic expense");

        let outcome = manager
            .store()
            .create(Collection::Expenses, &identity, expense_payload(&draft))
            .and_then(|row| confirmed(&row));

        manager.cache().write(|state| {
            if state.generation() != generation {
                warn!(id = %temp_id, "Discarding expense confirmation from a previous session");
                return outcome.map_err(LedgerError::from);
            }
            state.finish(&key);
            match outcome {
                Ok(expense) => {
                    state.replace(&temp_id, expense.clone());
                    info!(id = %expense.id, amount = expense.amount, "Expense recorded");
                    Ok(expense)
                }
                Err(err) => {
                    state.remove(&temp_id);
                    warn!(error = %err, "Rolled back expense after failed create");
                    Err(LedgerError::Persistence(err))
                }
            }
        })
    }

    /// Replaces the fields of expense `id` with `draft`.
    pub fn update(manager: &LedgerManager, id: &str, draft: ExpenseDraft) -> ServiceResult<Expense> {
        draft.validate()?;
        let key = EntityKey::Expense(id.to_string());

        let (identity, generation, previous) = manager.cache().write(|state| -> ServiceResult<_> {
            let identity = state
                .identity()
                .cloned()
                .ok_or(LedgerError::NoActiveIdentity)?;
            if state.expense(id).is_none() {
                return Err(LedgerError::NotFound(format!("expense `{}`", id)));
            }
            ensure_category_settled(state, &draft.category)?;
            state.begin(key.clone())?;
            let previous = state
                .replace(id, Expense::from_draft(id, draft.clone()))
                .ok_or_else(|| LedgerError::NotFound(format!("expense `{}`", id)))?;
            state.pin_category(&previous.category);
            Ok((identity, state.generation(), previous))
        })?;
        debug!(id, "Applied optimistic expense edit");

        let outcome = manager
            .store()
            .update(Collection::Expenses, &identity, id, expense_payload(&draft))
            .and_then(|row| confirmed(&row));

        manager.cache().write(|state| {
            if state.generation() != generation {
                warn!(id, "Discarding expense edit from a previous session");
                return outcome.map_err(LedgerError::from);
            }
            state.finish(&key);
            state.unpin_category(&previous.category);
            match outcome {
                Ok(expense) => {
                    state.replace(id, expense.clone());
                    info!(id, "Expense updated");
                    Ok(expense)
                }
                Err(err) => {
                    state.replace(id, previous);
                    warn!(id, error = %err, "Restored expense after failed update");
                    Err(LedgerError::Persistence(err))
                }
            }
        })
    }

    /// Deletes expense `id` and returns the removed entry.
    pub fn remove(manager: &LedgerManager, id: &str) -> ServiceResult<Expense> {
        let key = EntityKey::Expense(id.to_string());

        let (identity, generation, position, removed) =
            manager.cache().write(|state| -> ServiceResult<_> {
                let identity = state
                    .identity()
                    .cloned()
                    .ok_or(LedgerError::NoActiveIdentity)?;
                if state.expense(id).is_none() {
                    return Err(LedgerError::NotFound(format!("expense `{}`", id)));
                }
                state.begin(key.clone())?;
                let (position, removed) = state
                    .remove(id)
                    .ok_or_else(|| LedgerError::NotFound(format!("expense `{}`", id)))?;
                state.pin_category(&removed.category);
                Ok((identity, state.generation(), position, removed))
            })?;
        debug!(id, position, "Applied optimistic expense removal");

        let outcome = manager.store().delete(Collection::Expenses, &identity, id);

        manager.cache().write(|state| {
            if state.generation() != generation {
                warn!(id, "Discarding expense removal from a previous session");
                return outcome.map(|_| removed).map_err(LedgerError::from);
            }
            state.finish(&key);
            state.unpin_category(&removed.category);
            match outcome {
                Ok(()) => {
                    info!(id, "Expense removed");
                    Ok(removed)
                }
                Err(err) => {
                    state.restore(position, removed);
                    warn!(id, error = %err, "Restored expense after failed delete");
                    Err(LedgerError::Persistence(err))
                }
            }
        })
    }

    /// Deletes every confirmed expense one at a time. Stops at the first
    /// failure, leaving the remaining entries in place.
    pub fn clear_all(manager: &LedgerManager) -> ServiceResult<usize> {
        let snapshot = manager.snapshot();
        if snapshot.identity().is_none() {
            return Err(LedgerError::NoActiveIdentity);
        }
        let ids: Vec<String> = snapshot
            .expenses()
            .iter()
            .filter(|expense| !expense.is_provisional())
            .map(|expense| expense.id.clone())
            .collect();
        let mut removed = 0;
        for id in ids {
            Self::remove(manager, &id)?;
            removed += 1;
        }
        info!(removed, "Cleared expenses");
        Ok(removed)
    }

    /// Expenses of the active ledger, most recent first.
    pub fn list(manager: &LedgerManager) -> Vec<Expense> {
        manager.snapshot().expenses().to_vec()
    }
}

fn ensure_category_settled(state: &CacheState, category: &str) -> Result<(), LedgerError> {
    if state.is_in_flight(&EntityKey::Category(category.to_string())) {
        return Err(LedgerError::Conflict(format!(
            "category `{}` is being deleted",
            category
        )));
    }
    Ok(())
}

fn confirmed(row: &Row) -> Result<Expense, StoreError> {
    expense_from_row(row).map_err(|err| err.into_store_error(Collection::Expenses))
}
