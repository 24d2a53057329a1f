//! In-memory ledger for the active identity.
//!
//! Collections are held as `Arc<Vec<_>>` and replaced copy-on-write, so a
//! [`LedgerSnapshot`] is a couple of reference-count bumps and never observes
//! a half-applied mutation. All writes happen under the state's write lock;
//! remote calls never do.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{
    category::Category,
    common::{position_of, Identifiable},
    expense::Expense,
};
use crate::errors::LedgerError;
use crate::identity::Identity;
use crate::store::{
    rows::{category_from_row, expense_from_row},
    Collection, RemoteStore, Row, StoreError,
};

/// Immutable view of the ledger at one point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerSnapshot {
    identity: Option<Identity>,
    generation: u64,
    expenses: Arc<Vec<Expense>>,
    categories: Arc<Vec<Category>>,
}

impl LedgerSnapshot {
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Expenses, most recent first.
    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn expense(&self, id: &str) -> Option<&Expense> {
        self.expenses.iter().find(|expense| expense.id == id)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    /// Running total of every cached expense.
    pub fn total(&self) -> f64 {
        self.expenses.iter().map(|expense| expense.amount).sum()
    }

    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }

    /// True when `other` shares the exact same collection allocations.
    pub fn same_contents(&self, other: &LedgerSnapshot) -> bool {
        Arc::ptr_eq(&self.expenses, &other.expenses)
            && Arc::ptr_eq(&self.categories, &other.categories)
    }
}

/// Entity with a mutation awaiting the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum EntityKey {
    Expense(String),
    Category(String),
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKey::Expense(id) => write!(f, "expense:{}", id),
            EntityKey::Category(id) => write!(f, "category:{}", id),
        }
    }
}

/// Outcome of a load.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LoadReport {
    pub identity: Identity,
    pub expenses: usize,
    pub categories: usize,
    pub warnings: Vec<String>,
}

#[derive(Debug, Default)]
pub(crate) struct CacheState {
    identity: Option<Identity>,
    generation: u64,
    expenses: Arc<Vec<Expense>>,
    categories: Arc<Vec<Category>>,
    in_flight: HashSet<EntityKey>,
    /// Categories referenced by values a pending rollback could restore.
    pinned: HashMap<String, usize>,
}

impl CacheState {
    pub(crate) fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            identity: self.identity.clone(),
            generation: self.generation,
            expenses: Arc::clone(&self.expenses),
            categories: Arc::clone(&self.categories),
        }
    }

    pub(crate) fn expense(&self, id: &str) -> Option<&Expense> {
        self.expenses.iter().find(|expense| expense.id == id)
    }

    pub(crate) fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    /// Inserts at the front of the display order.
    pub(crate) fn insert(&mut self, expense: Expense) {
        Arc::make_mut(&mut self.expenses).insert(0, expense);
    }

    /// Swaps the entry `id` for `expense`, returning the previous value.
    pub(crate) fn replace(&mut self, id: &str, expense: Expense) -> Option<Expense> {
        let position = position_of(&self.expenses, id)?;
        let expenses = Arc::make_mut(&mut self.expenses);
        Some(std::mem::replace(&mut expenses[position], expense))
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<(usize, Expense)> {
        let position = position_of(&self.expenses, id)?;
        let removed = Arc::make_mut(&mut self.expenses).remove(position);
        Some((position, removed))
    }

    /// Puts `expense` back at `position`, clamped to the current length.
    pub(crate) fn restore(&mut self, position: usize, expense: Expense) {
        let expenses = Arc::make_mut(&mut self.expenses);
        let position = position.min(expenses.len());
        expenses.insert(position, expense);
    }

    /// Inserts or replaces by id.
    pub(crate) fn insert_category(&mut self, category: Category) {
        let categories = Arc::make_mut(&mut self.categories);
        match position_of(categories, category.id()) {
            Some(position) => categories[position] = category,
            None => categories.push(category),
        }
    }

    pub(crate) fn remove_category(&mut self, id: &str) -> Option<(usize, Category)> {
        let position = position_of(&self.categories, id)?;
        let removed = Arc::make_mut(&mut self.categories).remove(position);
        Some((position, removed))
    }

    pub(crate) fn restore_category(&mut self, position: usize, category: Category) {
        if position_of(&self.categories, category.id()).is_some() {
            self.insert_category(category);
            return;
        }
        let categories = Arc::make_mut(&mut self.categories);
        let position = position.min(categories.len());
        categories.insert(position, category);
    }

    /// Marks `key` as in flight, or reports a conflict if it already is.
    pub(crate) fn begin(&mut self, key: EntityKey) -> Result<(), LedgerError> {
        if self.in_flight.contains(&key) {
            return Err(LedgerError::Conflict(format!(
                "{} has a pending change",
                key
            )));
        }
        self.in_flight.insert(key);
        Ok(())
    }

    pub(crate) fn finish(&mut self, key: &EntityKey) {
        self.in_flight.remove(key);
    }

    pub(crate) fn is_in_flight(&self, key: &EntityKey) -> bool {
        self.in_flight.contains(key)
    }

    pub(crate) fn pin_category(&mut self, id: &str) {
        *self.pinned.entry(id.to_string()).or_insert(0) += 1;
    }

    pub(crate) fn unpin_category(&mut self, id: &str) {
        if let Some(count) = self.pinned.get_mut(id) {
            *count -= 1;
            if *count == 0 {
                self.pinned.remove(id);
            }
        }
    }

    pub(crate) fn is_category_pinned(&self, id: &str) -> bool {
        self.pinned.contains_key(id)
    }

    pub(crate) fn pending(&self) -> usize {
        self.in_flight.len()
    }

    /// Starts a new generation. Reconciliations started before are dropped.
    fn advance(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.in_flight.clear();
        self.pinned.clear();
    }

    fn reset(&mut self, identity: Option<Identity>) {
        self.advance();
        self.identity = identity;
        self.expenses = Arc::new(Vec::new());
        self.categories = Arc::new(Vec::new());
    }
}

/// Shared, lock-protected ledger state.
#[derive(Debug, Default)]
pub struct LedgerCache {
    state: RwLock<CacheState>,
}

impl LedgerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.read(CacheState::snapshot)
    }

    pub fn identity(&self) -> Option<Identity> {
        self.read(|state| state.identity().cloned())
    }

    pub fn generation(&self) -> u64 {
        self.read(CacheState::generation)
    }

    /// Number of entities with a mutation awaiting the store.
    pub fn pending_mutations(&self) -> usize {
        self.read(CacheState::pending)
    }

    /// Fetches both collections for `identity` and installs them.
    ///
    /// Fetches run without holding the lock. A collection whose fetch fails
    /// keeps its previous contents when `identity` is already loaded and
    /// stays empty otherwise. Fails only when both fetches fail.
    pub fn load(&self, store: &dyn RemoteStore, identity: &Identity) -> Result<LoadReport, LedgerError> {
        let expenses = fetch(store, identity, Collection::Expenses, expense_from_row);
        let categories = fetch(store, identity, Collection::Categories, category_from_row);

        let mut warnings = Vec::new();
        let mut failures: Vec<StoreError> = Vec::new();

        let (expense_count, category_count) = self.write(|state| {
            if state.identity() == Some(identity) {
                state.advance();
            } else {
                state.reset(Some(identity.clone()));
            }

            match expenses {
                Ok((mut loaded, skipped)) => {
                    loaded.sort_by(|a, b| b.date.cmp(&a.date));
                    state.expenses = Arc::new(loaded);
                    warnings.extend(skipped);
                }
                Err(err) => {
                    warn!(identity = %identity, error = %err, "Keeping cached expenses after failed fetch");
                    warnings.push(format!("expenses could not be loaded: {}", err));
                    failures.push(err);
                }
            }

            match categories {
                Ok((loaded, skipped)) => {
                    state.categories = Arc::new(dedupe_categories(loaded, &mut warnings));
                    warnings.extend(skipped);
                }
                Err(err) => {
                    warn!(identity = %identity, error = %err, "Keeping cached categories after failed fetch");
                    warnings.push(format!("categories could not be loaded: {}", err));
                    failures.push(err);
                }
            }

            (state.expenses.len(), state.categories.len())
        });

        if failures.len() == 2 {
            if let Some(err) = failures.into_iter().next() {
                return Err(LedgerError::Persistence(err));
            }
        }

        info!(
            identity = %identity,
            expenses = expense_count,
            categories = category_count,
            warnings = warnings.len(),
            "Ledger loaded"
        );
        Ok(LoadReport {
            identity: identity.clone(),
            expenses: expense_count,
            categories: category_count,
            warnings,
        })
    }

    /// Drops all state and starts a new generation.
    pub fn clear(&self) {
        self.write(|state| {
            if let Some(identity) = state.identity() {
                debug!(identity = %identity, "Clearing ledger cache");
            }
            state.reset(None);
        });
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&CacheState) -> R) -> R {
        let guard: RwLockReadGuard<'_, CacheState> =
            self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut CacheState) -> R) -> R {
        let mut guard: RwLockWriteGuard<'_, CacheState> =
            self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

type Fetched<T> = Result<(Vec<T>, Vec<String>), StoreError>;

fn fetch<T, E: fmt::Display>(
    store: &dyn RemoteStore,
    identity: &Identity,
    collection: Collection,
    map: impl Fn(&Row) -> Result<T, E>,
) -> Fetched<T> {
    let rows = store.list(collection, identity)?;
    let mut items = Vec::with_capacity(rows.len());
    let mut skipped = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        match map(row) {
            Ok(item) => items.push(item),
            Err(err) => {
                warn!(collection = %collection, index, error = %err, "Skipping malformed row");
                skipped.push(format!("skipped {} row {}: {}", collection, index, err));
            }
        }
    }
    Ok((items, skipped))
}

fn dedupe_categories(loaded: Vec<Category>, warnings: &mut Vec<String>) -> Vec<Category> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(loaded.len());
    for category in loaded {
        if seen.insert(category.id.clone()) {
            unique.push(category);
        } else {
            warnings.push(format!("duplicate category id `{}` ignored", category.id));
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{category::default_categories, expense::ExpenseDraft};
    use crate::store::{memory::InMemoryStore, StoreOp};
    use chrono::NaiveDate;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn expense(id: &str, amount: f64) -> Expense {
        Expense::from_draft(id, ExpenseDraft::new(amount, "food", date(2024, 3, 1)))
    }

    fn seeded_store(identity: &Identity) -> InMemoryStore {
        let store = InMemoryStore::with_default_categories();
        for (day, amount) in [(1, 10.0), (5, 20.0), (3, 30.0)] {
            let row = json!({"amount": amount, "category": "otros", "date": format!("2024-03-0{}", day)});
            store.seed(Collection::Expenses, Some(identity), row.as_object().cloned().unwrap());
        }
        store
    }

    #[test]
    fn snapshots_are_isolated_from_later_writes() {
        let cache = LedgerCache::new();
        cache.write(|state| state.insert(expense("1", 10.0)));
        let before = cache.snapshot();
        cache.write(|state| state.insert(expense("2", 5.0)));
        assert_eq!(before.len(), 1);
        assert_eq!(cache.snapshot().len(), 2);
        assert_eq!(cache.snapshot().expenses()[0].id, "2");
    }

    #[test]
    fn remove_and_restore_keep_position() {
        let cache = LedgerCache::new();
        cache.write(|state| {
            state.insert(expense("c", 3.0));
            state.insert(expense("b", 2.0));
            state.insert(expense("a", 1.0));
        });
        let before = cache.snapshot();
        let (position, removed) = cache.write(|state| state.remove("b")).unwrap();
        assert_eq!(position, 1);
        cache.write(|state| state.restore(position, removed));
        assert_eq!(cache.snapshot().expenses(), before.expenses());
    }

    #[test]
    fn in_flight_keys_conflict() {
        let cache = LedgerCache::new();
        let key = EntityKey::Expense("1".into());
        cache.write(|state| state.begin(key.clone())).unwrap();
        let err = cache.write(|state| state.begin(key.clone())).unwrap_err();
        assert!(matches!(err, LedgerError::Conflict(_)));
        cache.write(|state| state.finish(&key));
        assert_eq!(cache.pending_mutations(), 0);
    }

    #[test]
    fn category_pins_are_counted() {
        let cache = LedgerCache::new();
        cache.write(|state| {
            state.pin_category("food");
            state.pin_category("food");
            state.unpin_category("food");
        });
        assert!(cache.read(|state| state.is_category_pinned("food")));
        cache.write(|state| state.unpin_category("food"));
        assert!(!cache.read(|state| state.is_category_pinned("food")));
    }

    #[test]
    fn load_orders_expenses_by_date_descending() {
        let alice = Identity::new("alice");
        let store = seeded_store(&alice);
        let cache = LedgerCache::new();
        let report = cache.load(&store, &alice).unwrap();
        assert_eq!(report.expenses, 3);
        assert_eq!(report.categories, default_categories().len());
        let dates: Vec<u32> = cache
            .snapshot()
            .expenses()
            .iter()
            .map(|e| chrono::Datelike::day(&e.date))
            .collect();
        assert_eq!(dates, vec![5, 3, 1]);
    }

    #[test]
    fn failed_collection_keeps_previous_contents_for_same_identity() {
        let alice = Identity::new("alice");
        let store = seeded_store(&alice);
        let cache = LedgerCache::new();
        cache.load(&store, &alice).unwrap();
        let generation = cache.generation();

        store.fail_next(StoreOp::List);
        let report = cache.load(&store, &alice).unwrap();
        assert_eq!(report.expenses, 3);
        assert_eq!(report.warnings.len(), 1);
        assert!(cache.generation() > generation);
    }

    #[test]
    fn both_fetches_failing_is_an_error() {
        let alice = Identity::new("alice");
        let store = seeded_store(&alice);
        let cache = LedgerCache::new();
        store.set_offline(true);
        let err = cache.load(&store, &alice).unwrap_err();
        assert!(matches!(err, LedgerError::Persistence(_)));
        assert_eq!(cache.identity(), Some(alice));
        assert!(cache.snapshot().is_empty());
    }

    #[test]
    fn switching_identity_never_mixes_data() {
        let alice = Identity::new("alice");
        let bob = Identity::new("bob");
        let store = seeded_store(&alice);
        let cache = LedgerCache::new();
        cache.load(&store, &alice).unwrap();

        store.fail_next(StoreOp::List);
        cache.load(&store, &bob).unwrap();
        assert!(cache.snapshot().is_empty());
        assert_eq!(cache.identity(), Some(bob));
    }

    #[test]
    fn malformed_rows_are_reported_and_skipped() {
        let alice = Identity::new("alice");
        let store = seeded_store(&alice);
        let bad = json!({"amount": "lots", "category": "otros", "date": "2024-03-01"});
        store.seed(Collection::Expenses, Some(&alice), bad.as_object().cloned().unwrap());
        let cache = LedgerCache::new();
        let report = cache.load(&store, &alice).unwrap();
        assert_eq!(report.expenses, 3);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("amount"));
    }

    #[test]
    fn clear_resets_state_and_generation() {
        let alice = Identity::new("alice");
        let store = seeded_store(&alice);
        let cache = LedgerCache::new();
        cache.load(&store, &alice).unwrap();
        let generation = cache.generation();
        cache.clear();
        assert!(cache.identity().is_none());
        assert!(cache.snapshot().is_empty());
        assert!(cache.snapshot().categories().is_empty());
        assert!(cache.generation() > generation);
    }
}
