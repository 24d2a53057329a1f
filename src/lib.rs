#![doc(test(attr(deny(warnings))))]

//! Expense Core holds a user's expenses and categories in memory, mirrors every
//! change to a remote store with optimistic rollback, and computes the period
//! totals, category breakdowns and calendar buckets the screens render.

pub mod cli;
pub mod config;
pub mod core;
pub mod currency;
pub mod domain;
pub mod errors;
pub mod export;
pub mod identity;
pub mod ledger;
pub mod store;
pub mod time;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Expense Core tracing initialized.");
    });
}
