#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Condvar, Mutex};

use chrono::NaiveDate;
use expense_core::{
    config::ConfigManager,
    core::LedgerManager,
    domain::expense::ExpenseDraft,
    identity::Identity,
    store::{Collection, InMemoryStore, RemoteStore, Row, StoreResult},
    time::FixedClock,
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn alice() -> Identity {
    Identity::new("alice")
}

/// Fresh data directory that outlives the calling test.
pub fn temp_base_dir() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

pub fn setup_config_manager() -> ConfigManager {
    ConfigManager::with_base_dir(temp_base_dir()).expect("create config manager for temp dir")
}

/// Manager logged in as `alice` over a store holding the default categories,
/// displaying the month of `today`.
pub fn setup_manager(today: NaiveDate) -> (Arc<LedgerManager>, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::with_default_categories());
    let manager = Arc::new(LedgerManager::with_clock(store.clone(), &FixedClock(today)));
    manager.init(alice()).expect("initial load");
    (manager, store)
}

/// Food and transport expenses spread over February and March 2024.
pub fn march_drafts() -> Vec<ExpenseDraft> {
    vec![
        ExpenseDraft::new(100.0, "food", date(2024, 3, 1)),
        ExpenseDraft::new(50.0, "food", date(2024, 3, 2)),
        ExpenseDraft::new(200.0, "transport", date(2024, 3, 2)),
        ExpenseDraft::new(1600.0, "rent", date(2024, 2, 10)),
    ]
}

#[derive(Default)]
struct Latch {
    open: Mutex<bool>,
    signal: Condvar,
}

impl Latch {
    fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.signal.notify_all();
    }

    fn wait_and_reset(&self) {
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.signal.wait(open).unwrap();
        }
        *open = false;
    }
}

/// Store wrapper that can hold the next mutating call until released, so a
/// test can observe the ledger while a remote call is outstanding.
#[derive(Default)]
pub struct GatedStore {
    pub inner: InMemoryStore,
    armed: Mutex<bool>,
    entered: Latch,
    released: Latch,
}

impl GatedStore {
    pub fn with_default_categories() -> Self {
        Self {
            inner: InMemoryStore::with_default_categories(),
            ..Self::default()
        }
    }

    /// The next create, update or delete blocks until [`GatedStore::release`].
    pub fn arm(&self) {
        *self.armed.lock().unwrap() = true;
    }

    /// Blocks until an armed call has reached the store.
    pub fn wait_until_entered(&self) {
        self.entered.wait_and_reset();
    }

    pub fn release(&self) {
        self.released.open();
    }

    fn pause_if_armed(&self) {
        let armed = std::mem::replace(&mut *self.armed.lock().unwrap(), false);
        if armed {
            self.entered.open();
            self.released.wait_and_reset();
        }
    }
}

impl RemoteStore for GatedStore {
    fn list(&self, collection: Collection, identity: &Identity) -> StoreResult<Vec<Row>> {
        self.inner.list(collection, identity)
    }

    fn create(&self, collection: Collection, identity: &Identity, row: Row) -> StoreResult<Row> {
        self.pause_if_armed();
        self.inner.create(collection, identity, row)
    }

    fn update(
        &self,
        collection: Collection,
        identity: &Identity,
        id: &str,
        patch: Row,
    ) -> StoreResult<Row> {
        self.pause_if_armed();
        self.inner.update(collection, identity, id, patch)
    }

    fn delete(&self, collection: Collection, identity: &Identity, id: &str) -> StoreResult<()> {
        self.pause_if_armed();
        self.inner.delete(collection, identity, id)
    }
}

pub fn setup_gated_manager(today: NaiveDate) -> (Arc<LedgerManager>, Arc<GatedStore>) {
    let store = Arc::new(GatedStore::with_default_categories());
    let manager = Arc::new(LedgerManager::with_clock(store.clone(), &FixedClock(today)));
    manager.init(alice()).expect("initial load");
    (manager, store)
}
