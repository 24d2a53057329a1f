use crate::core::ledger_manager::LedgerManager;
use crate::ledger::{
    aggregate, CalendarMonth, IntensityThresholds, Period, PeriodStats,
};
use crate::time::Clock;

/// Read-side helpers evaluated over a single ledger snapshot.
pub struct SummaryService;

impl SummaryService {
    /// Totals of `period` relative to `clock.today()` and the displayed month.
    pub fn period_stats(manager: &LedgerManager, period: Period, clock: &dyn Clock) -> PeriodStats {
        let snapshot = manager.snapshot();
        aggregate(
            snapshot.expenses(),
            period,
            clock.today(),
            manager.displayed_month(),
        )
    }

    /// Stats for every period, day first.
    pub fn all_periods(manager: &LedgerManager, clock: &dyn Clock) -> Vec<PeriodStats> {
        let snapshot = manager.snapshot();
        let today = clock.today();
        let displayed = manager.displayed_month();
        Period::ALL
            .iter()
            .map(|period| aggregate(snapshot.expenses(), *period, today, displayed))
            .collect()
    }

    /// Sum of every cached expense.
    pub fn running_total(manager: &LedgerManager) -> f64 {
        manager.snapshot().total()
    }

    pub fn calendar(manager: &LedgerManager, thresholds: &IntensityThresholds) -> CalendarMonth {
        let snapshot = manager.snapshot();
        CalendarMonth::build(snapshot.expenses(), manager.displayed_month(), thresholds)
    }
}
