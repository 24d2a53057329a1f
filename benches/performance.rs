use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use expense_core::{
    core::LedgerManager,
    domain::expense::{Expense, ExpenseDraft},
    identity::Identity,
    ledger::{aggregate, CalendarMonth, DisplayedMonth, IntensityThresholds, Period},
    store::{rows::expense_payload, Collection, InMemoryStore},
    time::FixedClock,
};

const CATEGORIES: [&str; 5] = ["verduleria", "carniceria", "almacen", "limpieza", "otros"];

fn sample_drafts(count: usize) -> Vec<ExpenseDraft> {
    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    (0..count)
        .map(|idx| {
            ExpenseDraft::new(
                50.0 + (idx % 400) as f64,
                CATEGORIES[idx % CATEGORIES.len()],
                start + Duration::days((idx % 365) as i64),
            )
        })
        .collect()
}

fn sample_expenses(count: usize) -> Vec<Expense> {
    sample_drafts(count)
        .into_iter()
        .enumerate()
        .map(|(idx, draft)| Expense::from_draft((idx + 1).to_string(), draft))
        .collect()
}

fn bench_aggregation(c: &mut Criterion) {
    let expenses = sample_expenses(black_box(10_000));
    let reference = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
    let displayed = DisplayedMonth::containing(reference);

    c.bench_function("aggregate_month_10k", |b| {
        b.iter(|| black_box(aggregate(&expenses, Period::Month, reference, displayed)))
    });

    c.bench_function("aggregate_all_periods_10k", |b| {
        b.iter(|| {
            for period in Period::ALL {
                black_box(aggregate(&expenses, period, reference, displayed));
            }
        })
    });
}

fn bench_calendar(c: &mut Criterion) {
    let expenses = sample_expenses(black_box(10_000));
    let displayed = DisplayedMonth::new(2025, 6).unwrap();
    let thresholds = IntensityThresholds::default();

    c.bench_function("calendar_month_10k", |b| {
        b.iter(|| black_box(CalendarMonth::build(&expenses, displayed, &thresholds)))
    });
}

fn bench_load(c: &mut Criterion) {
    let identity = Identity::new("bench-user");
    let store = Arc::new(InMemoryStore::with_default_categories());
    for draft in sample_drafts(5_000) {
        store.seed(Collection::Expenses, Some(&identity), expense_payload(&draft));
    }
    let clock = FixedClock(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap());
    let manager = LedgerManager::with_clock(store, &clock);

    c.bench_function("ledger_load_5k", |b| {
        b.iter(|| black_box(manager.init(identity.clone()).unwrap()))
    });
}

criterion_group!(benches, bench_aggregation, bench_calendar, bench_load);
criterion_main!(benches);
