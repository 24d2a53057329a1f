//! Session facade, mutation services and integrity checks.

pub mod integrity;
pub mod ledger_manager;
pub mod services;

pub use ledger_manager::LedgerManager;
