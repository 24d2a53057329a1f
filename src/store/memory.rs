//! Process-local store adapter with failure injection.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::domain::category::default_categories;
use crate::identity::Identity;

use super::{
    rows::{category_payload, FIELD_ID, FIELD_OWNER},
    Collection, RemoteStore, Row, StoreError, StoreOp, StoreResult,
};

#[derive(Default)]
struct MemoryState {
    tables: HashMap<Collection, Vec<Row>>,
    next_id: u64,
    pending_failures: HashMap<StoreOp, u32>,
    offline: bool,
    calls: HashMap<StoreOp, usize>,
}

impl MemoryState {
    fn begin(&mut self, op: StoreOp) -> StoreResult<()> {
        *self.calls.entry(op).or_insert(0) += 1;
        if self.offline {
            return Err(StoreError::Unavailable("store is offline".into()));
        }
        if let Some(remaining) = self.pending_failures.get_mut(&op) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(StoreError::Unavailable(format!(
                    "injected {:?} failure",
                    op
                )));
            }
        }
        Ok(())
    }

    fn table(&mut self, collection: Collection) -> &mut Vec<Row> {
        self.tables.entry(collection).or_default()
    }
}

/// Keeps rows in memory, behaving like the hosted backend: it assigns expense
/// ids, stamps ownership, rejects duplicate ids and normalizes amounts to
/// cents. Used by the shell, tests and benches.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the built-in shared categories.
    pub fn with_default_categories() -> Self {
        let store = Self::new();
        for category in default_categories() {
            store.seed(Collection::Categories, None, category_payload(category));
        }
        store
    }

    /// Inserts a row directly, bypassing call accounting. `owner: None` makes
    /// the row shared.
    pub fn seed(&self, collection: Collection, owner: Option<&Identity>, mut row: Row) {
        let mut state = self.lock();
        if !row.contains_key(FIELD_ID) {
            state.next_id += 1;
            let id = state.next_id.to_string();
            row.insert(FIELD_ID.into(), json!(id));
        }
        row.insert(
            FIELD_OWNER.into(),
            owner.map_or(Value::Null, |identity| json!(identity.as_str())),
        );
        state.table(collection).push(row);
    }

    /// Makes the next call of `op` fail with `Unavailable`.
    pub fn fail_next(&self, op: StoreOp) {
        self.fail_next_n(op, 1);
    }

    pub fn fail_next_n(&self, op: StoreOp, times: u32) {
        *self.lock().pending_failures.entry(op).or_insert(0) += times;
    }

    /// While offline every call fails.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    pub fn calls(&self, op: StoreOp) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Number of create, update and delete calls received so far.
    pub fn mutation_calls(&self) -> usize {
        [StoreOp::Create, StoreOp::Update, StoreOp::Delete]
            .iter()
            .map(|op| self.calls(*op))
            .sum()
    }

    /// Copy of every row of `collection`, regardless of owner.
    pub fn rows(&self, collection: Collection) -> Vec<Row> {
        self.lock().table(collection).clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RemoteStore for InMemoryStore {
    fn list(&self, collection: Collection, identity: &Identity) -> StoreResult<Vec<Row>> {
        let mut state = self.lock();
        state.begin(StoreOp::List)?;
        Ok(state
            .table(collection)
            .iter()
            .filter(|row| visible_to(row, identity))
            .cloned()
            .collect())
    }

    fn create(&self, collection: Collection, identity: &Identity, mut row: Row) -> StoreResult<Row> {
        let mut state = self.lock();
        state.begin(StoreOp::Create)?;
        normalize(&mut row);
        reject_non_positive_amount(&row)?;
        let id = match row.get(FIELD_ID).and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None if collection == Collection::Expenses => {
                state.next_id += 1;
                state.next_id.to_string()
            }
            None => {
                return Err(StoreError::Rejected(format!(
                    "{} rows require an id",
                    collection
                )))
            }
        };
        if state
            .table(collection)
            .iter()
            .any(|existing| existing.get(FIELD_ID).and_then(Value::as_str) == Some(id.as_str()))
        {
            return Err(StoreError::Conflict { collection, id });
        }
        row.insert(FIELD_ID.into(), json!(id));
        row.insert(FIELD_OWNER.into(), json!(identity.as_str()));
        row.insert(
            "created_at".into(),
            json!(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
        state.table(collection).push(row.clone());
        Ok(row)
    }

    fn update(
        &self,
        collection: Collection,
        identity: &Identity,
        id: &str,
        mut patch: Row,
    ) -> StoreResult<Row> {
        let mut state = self.lock();
        state.begin(StoreOp::Update)?;
        normalize(&mut patch);
        reject_non_positive_amount(&patch)?;
        let row = state
            .table(collection)
            .iter_mut()
            .find(|row| owned_by(row, identity) && row_id(row) == Some(id))
            .ok_or_else(|| StoreError::NotFound {
                collection,
                id: id.to_string(),
            })?;
        for (key, value) in patch {
            if key != FIELD_ID && key != FIELD_OWNER {
                row.insert(key, value);
            }
        }
        Ok(row.clone())
    }

    fn delete(&self, collection: Collection, identity: &Identity, id: &str) -> StoreResult<()> {
        let mut state = self.lock();
        state.begin(StoreOp::Delete)?;
        let table = state.table(collection);
        let position = table
            .iter()
            .position(|row| owned_by(row, identity) && row_id(row) == Some(id))
            .ok_or_else(|| StoreError::NotFound {
                collection,
                id: id.to_string(),
            })?;
        table.remove(position);
        Ok(())
    }
}

fn row_id(row: &Row) -> Option<&str> {
    row.get(FIELD_ID).and_then(Value::as_str)
}

fn owned_by(row: &Row, identity: &Identity) -> bool {
    row.get(FIELD_OWNER).and_then(Value::as_str) == Some(identity.as_str())
}

fn visible_to(row: &Row, identity: &Identity) -> bool {
    match row.get(FIELD_OWNER) {
        None | Some(Value::Null) => true,
        Some(_) => owned_by(row, identity),
    }
}

fn normalize(row: &mut Row) {
    if let Some(amount) = row.get("amount").and_then(Value::as_f64) {
        row.insert("amount".into(), json!((amount * 100.0).round() / 100.0));
    }
    if let Some(description) = row.get("description").and_then(Value::as_str) {
        let trimmed = description.trim().to_string();
        row.insert("description".into(), json!(trimmed));
    }
}

/// Amounts that round to zero cents are refused before anything is written.
fn reject_non_positive_amount(row: &Row) -> StoreResult<()> {
    match row.get("amount").and_then(Value::as_f64) {
        Some(amount) if amount <= 0.0 => Err(StoreError::Rejected(format!(
            "amount {} is not positive after rounding to cents",
            amount
        ))),
        _ => Ok(()),
    }
}
