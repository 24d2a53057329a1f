use thiserror::Error;

use crate::store::StoreError;

/// Error type shared by the ledger cache, the mutation services and the
/// configuration layer.
///
/// `Validation`, `ConstraintViolation`, `NotFound`, `Conflict` and
/// `NoActiveIdentity` are raised before any remote call and never touch the
/// cache. `Persistence` is raised after the remote store failed; the
/// optimistic change has already been rolled back when the caller sees it.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Operation already in progress: {0}")]
    Conflict(String),
    #[error("No active identity")]
    NoActiveIdentity,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl LedgerError {
    /// True when the error was raised before the cache was modified.
    pub fn is_local_rejection(&self) -> bool {
        matches!(
            self,
            LedgerError::Validation(_)
                | LedgerError::ConstraintViolation(_)
                | LedgerError::NotFound(_)
                | LedgerError::Conflict(_)
                | LedgerError::NoActiveIdentity
        )
    }
}

/// Failures surfaced by the shell front-end.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] LedgerError),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("Command failed: {0}")]
    Command(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
