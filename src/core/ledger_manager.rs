use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, warn};

use crate::errors::LedgerError;
use crate::identity::Identity;
use crate::ledger::{DisplayedMonth, LedgerCache, LedgerSnapshot, LoadReport};
use crate::store::RemoteStore;
use crate::time::{Clock, SystemClock};

use super::integrity;

/// Session facade: owns the ledger cache of the active identity, the remote
/// store handle and the month currently displayed.
///
/// Every method takes `&self`; the manager is meant to be shared behind an
/// `Arc` between the presentation thread and mutation workers.
pub struct LedgerManager {
    store: Arc<dyn RemoteStore>,
    cache: LedgerCache,
    displayed: RwLock<DisplayedMonth>,
}

impl LedgerManager {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self::with_clock(store, &SystemClock)
    }

    /// Starts with the month containing `clock.today()` displayed.
    pub fn with_clock(store: Arc<dyn RemoteStore>, clock: &dyn Clock) -> Self {
        Self {
            store,
            cache: LedgerCache::new(),
            displayed: RwLock::new(DisplayedMonth::containing(clock.today())),
        }
    }

    pub fn store(&self) -> &dyn RemoteStore {
        self.store.as_ref()
    }

    pub(crate) fn cache(&self) -> &LedgerCache {
        &self.cache
    }

    /// Loads the ledger of `identity`, replacing whatever session was active.
    pub fn init(&self, identity: Identity) -> Result<LoadReport, LedgerError> {
        let mut report = self.cache.load(self.store.as_ref(), &identity)?;
        let dangling = integrity::ledger_warnings(&self.cache.snapshot());
        for warning in &dangling {
            warn!(identity = %identity, "{}", warning);
        }
        report.warnings.extend(dangling);
        Ok(report)
    }

    /// Reloads the active identity.
    pub fn refresh(&self) -> Result<LoadReport, LedgerError> {
        let identity = self.identity().ok_or(LedgerError::NoActiveIdentity)?;
        debug!(identity = %identity, "Refreshing ledger");
        self.init(identity)
    }

    /// Ends the session. Mutations still awaiting the store are discarded
    /// when they return.
    pub fn teardown(&self) {
        if let Some(identity) = self.identity() {
            info!(identity = %identity, "Ending ledger session");
        }
        self.cache.clear();
    }

    /// Follows the authentication source: `Some` loads that identity, `None`
    /// ends the session.
    pub fn on_identity_change(
        &self,
        identity: Option<Identity>,
    ) -> Result<Option<LoadReport>, LedgerError> {
        match identity {
            Some(identity) => self.init(identity).map(Some),
            None => {
                self.teardown();
                Ok(None)
            }
        }
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.cache.snapshot()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.cache.identity()
    }

    pub fn is_active(&self) -> bool {
        self.identity().is_some()
    }

    /// Entities with a mutation awaiting the store.
    pub fn pending_mutations(&self) -> usize {
        self.cache.pending_mutations()
    }

    pub fn displayed_month(&self) -> DisplayedMonth {
        *self.displayed.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_displayed_month(&self, month: DisplayedMonth) {
        *self.displayed.write().unwrap_or_else(PoisonError::into_inner) = month;
    }

    pub fn show_previous_month(&self) -> DisplayedMonth {
        self.shift_displayed(DisplayedMonth::previous)
    }

    pub fn show_next_month(&self) -> DisplayedMonth {
        self.shift_displayed(DisplayedMonth::next)
    }

    /// Jumps back to the month containing today.
    pub fn show_current_month(&self, clock: &dyn Clock) -> DisplayedMonth {
        self.shift_displayed(|_| DisplayedMonth::containing(clock.today()))
    }

    fn shift_displayed(&self, shift: impl FnOnce(&DisplayedMonth) -> DisplayedMonth) -> DisplayedMonth {
        let mut displayed = self.displayed.write().unwrap_or_else(PoisonError::into_inner);
        *displayed = shift(&*displayed);
        *displayed
    }
}
