mod common;

use std::fs;

use common::{date, march_drafts, setup_manager, temp_base_dir};
use expense_core::{
    core::services::ExpenseService,
    export::{export_csv, export_file_name, write_csv},
};

#[test]
fn report_lists_every_expense_in_ledger_order() {
    let (manager, _store) = setup_manager(date(2024, 3, 2));
    for draft in march_drafts() {
        ExpenseService::add(&manager, draft).unwrap();
    }
    let csv = export_csv(manager.snapshot().expenses());
    let lines: Vec<&str> = csv.trim_start_matches('\u{feff}').lines().collect();

    assert_eq!(lines[0], "sep=;");
    assert_eq!(lines[1], "Date;Amount;Category");
    assert_eq!(lines.len(), 2 + 4 + 2);
    // New entries go to the front of the ledger.
    assert_eq!(lines[2], "2024-02-10;$ 1600;rent");
    assert_eq!(lines[5], "2024-03-01;$ 100;food");
    assert_eq!(lines[7], "TOTAL SPENT;$ 1950; ");
}

#[test]
fn report_is_written_under_the_dated_name() {
    let (manager, _store) = setup_manager(date(2024, 3, 2));
    ExpenseService::add(
        &manager,
        expense_core::domain::expense::ExpenseDraft::new(10.5, "otros", date(2024, 3, 1)),
    )
    .unwrap();

    let path = temp_base_dir()
        .join("exports")
        .join(export_file_name(date(2024, 3, 2)));
    let written = write_csv(&path, manager.snapshot().expenses()).unwrap();
    assert!(written.ends_with("expense_report_2024-03-02.csv"));

    let bytes = fs::read(&written).unwrap();
    assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.contains("2024-03-01;$ 10.5;otros"));
}
