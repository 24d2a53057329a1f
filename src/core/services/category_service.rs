use tracing::{debug, info, warn};

use crate::core::{integrity, ledger_manager::LedgerManager};
use crate::domain::{
    category::{Category, CategoryDraft},
    common::Displayable,
};
use crate::errors::LedgerError;
use crate::ledger::{cache::EntityKey, LedgerSnapshot};
use crate::store::{
    rows::{category_from_row, category_payload},
    Collection,
};

use super::ServiceResult;

pub struct CategoryService;

impl CategoryService {
    /// Creates a category owned by the active identity. The cache is only
    /// touched once the store confirms.
    pub fn add(manager: &LedgerManager, draft: CategoryDraft) -> ServiceResult<Category> {
        let identity = manager.identity().ok_or(LedgerError::NoActiveIdentity)?;
        let category = Category::owned_by(&identity, draft)?;
        let key = EntityKey::Category(category.id.clone());

        let generation = manager.cache().write(|state| -> ServiceResult<_> {
            if state.identity() != Some(&identity) {
                return Err(LedgerError::NoActiveIdentity);
            }
            state.begin(key.clone())?;
            Ok(state.generation())
        })?;
        debug!(id = %category.id, "Creating category");

        let outcome = manager
            .store()
            .create(Collection::Categories, &identity, category_payload(&category))
            .and_then(|row| {
                category_from_row(&row).map_err(|err| err.into_store_error(Collection::Categories))
            });

        manager.cache().write(|state| {
            if state.generation() != generation {
                warn!(id = %category.id, "Discarding category confirmation from a previous session");
                return outcome.map_err(LedgerError::from);
            }
            state.finish(&key);
            match outcome {
                Ok(confirmed) => {
                    state.insert_category(confirmed.clone());
                    info!(id = %confirmed.id, label = %confirmed.label, "Category created");
                    Ok(confirmed)
                }
                Err(err) => {
                    warn!(id = %category.id, error = %err, "Category create failed");
                    Err(LedgerError::Persistence(err))
                }
            }
        })
    }

    /// Deletes category `id` unless an expense still references it.
    ///
    /// The reference check and the optimistic removal happen under one write
    /// lock, so an expense added concurrently is either seen by the check or
    /// rejected while the deletion is in flight. A category that a pending
    /// expense edit or delete could restore a reference to is a conflict.
    pub fn remove(manager: &LedgerManager, id: &str) -> ServiceResult<Category> {
        let key = EntityKey::Category(id.to_string());

        let (identity, generation, position, removed) =
            manager.cache().write(|state| -> ServiceResult<_> {
                let identity = state
                    .identity()
                    .cloned()
                    .ok_or(LedgerError::NoActiveIdentity)?;
                if state.category(id).is_none() {
                    return Err(LedgerError::NotFound(format!("category `{}`", id)));
                }
                if state.is_in_flight(&key) {
                    return Err(LedgerError::Conflict(format!(
                        "category `{}` has a pending change",
                        id
                    )));
                }
                if state.is_category_pinned(id) {
                    return Err(LedgerError::Conflict(format!(
                        "category `{}` is referenced by a pending expense change",
                        id
                    )));
                }
                integrity::ensure_category_deletable(id, state.snapshot().expenses())?;
                state.begin(key.clone())?;
                let (position, removed) = state
                    .remove_category(id)
                    .ok_or_else(|| LedgerError::NotFound(format!("category `{}`", id)))?;
                Ok((identity, state.generation(), position, removed))
            })?;
        debug!(id, "Applied optimistic category removal");

        let outcome = manager.store().delete(Collection::Categories, &identity, id);

        manager.cache().write(|state| {
            if state.generation() != generation {
                warn!(id, "Discarding category removal from a previous session");
                return outcome.map(|_| removed).map_err(LedgerError::from);
            }
            state.finish(&key);
            match outcome {
                Ok(()) => {
                    info!(id, "Category removed");
                    Ok(removed)
                }
                Err(err) => {
                    state.restore_category(position, removed);
                    warn!(id, error = %err, "Restored category after failed delete");
                    Err(LedgerError::Persistence(err))
                }
            }
        })
    }

    pub fn find<'a>(snapshot: &'a LedgerSnapshot, id: &str) -> Option<&'a Category> {
        snapshot.category(id)
    }

    /// Label shown for `id`; unknown ids are shown verbatim.
    pub fn label_for(snapshot: &LedgerSnapshot, id: &str) -> String {
        Self::find(snapshot, id)
            .map(Displayable::display_label)
            .unwrap_or_else(|| id.to_string())
    }

    pub fn list(snapshot: &LedgerSnapshot) -> Vec<&Category> {
        snapshot.categories().iter().collect()
    }
}
