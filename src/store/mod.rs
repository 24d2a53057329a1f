//! Contract of the remote persistent store and the adapters shipped with the
//! crate.

pub mod memory;
pub mod rows;

use std::{fmt, str::FromStr};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::identity::Identity;

pub use memory::InMemoryStore;

/// Loosely typed record exchanged with the store.
pub type Row = Map<String, Value>;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Collections exposed by the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Expenses,
    Categories,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Expenses => "expenses",
            Collection::Categories => "categories",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store operations, used for failure injection and call accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    List,
    Create,
    Update,
    Delete,
}

impl StoreOp {
    pub const ALL: [StoreOp; 4] = [StoreOp::List, StoreOp::Create, StoreOp::Update, StoreOp::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreOp::List => "list",
            StoreOp::Create => "create",
            StoreOp::Update => "update",
            StoreOp::Delete => "delete",
        }
    }
}

impl FromStr for StoreOp {
    type Err = StoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        StoreOp::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| StoreError::Rejected(format!("unknown store operation `{}`", value)))
    }
}

/// Failures reported by a store adapter.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("{collection} row `{id}` not found")]
    NotFound { collection: Collection, id: String },
    #[error("{collection} row `{id}` already exists")]
    Conflict { collection: Collection, id: String },
    #[error("store rejected request: {0}")]
    Rejected(String),
}

/// Abstraction over the backend-as-a-service holding the authoritative data.
///
/// Every call is scoped to `identity`: `list` returns the rows the identity
/// owns plus shared rows; `update` and `delete` only reach owned rows.
/// Implementations may fail transiently; retry policy, if any, lives here and
/// not in the ledger.
pub trait RemoteStore: Send + Sync {
    fn list(&self, collection: Collection, identity: &Identity) -> StoreResult<Vec<Row>>;
    fn create(&self, collection: Collection, identity: &Identity, row: Row) -> StoreResult<Row>;
    fn update(
        &self,
        collection: Collection,
        identity: &Identity,
        id: &str,
        patch: Row,
    ) -> StoreResult<Row>;
    fn delete(&self, collection: Collection, identity: &Identity, id: &str) -> StoreResult<()>;
}
