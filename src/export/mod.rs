//! Spreadsheet-friendly CSV report of an expense list.
//!
//! The layout targets spreadsheet imports: a UTF-8 byte order mark, a
//! `sep=;` hint line, semicolon-separated columns and a trailing total row.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;

use crate::domain::expense::Expense;
use crate::errors::LedgerError;
use crate::utils::paths::write_atomic;

const BOM: char = '\u{feff}';
const SEPARATOR_HINT: &str = "sep=;";
const HEADER: [&str; 3] = ["Date", "Amount", "Category"];
const FOOTER_ROW: &str = " ; ; ";
const TOTAL_LABEL: &str = "TOTAL SPENT";

pub fn export_csv(expenses: &[Expense]) -> String {
    let total: f64 = expenses.iter().map(|expense| expense.amount).sum();
    let mut lines = Vec::with_capacity(expenses.len() + 4);
    lines.push(SEPARATOR_HINT.to_string());
    lines.push(HEADER.join(";"));
    lines.extend(expenses.iter().map(|expense| {
        format!(
            "{};$ {};{}",
            expense.date_key(),
            expense.amount,
            sanitize(&expense.category)
        )
    }));
    lines.push(FOOTER_ROW.to_string());
    lines.push(format!("{};$ {}; ", TOTAL_LABEL, total));

    let mut csv = String::new();
    csv.push(BOM);
    csv.push_str(&lines.join("\n"));
    csv
}

/// `expense_report_YYYY-MM-DD.csv`
pub fn export_file_name(today: NaiveDate) -> String {
    format!("expense_report_{}.csv", today.format("%Y-%m-%d"))
}

/// Writes the report for `expenses` to `path` atomically.
pub fn write_csv(path: &Path, expenses: &[Expense]) -> Result<PathBuf, LedgerError> {
    write_atomic(path, export_csv(expenses).as_bytes())?;
    info!(path = %path.display(), rows = expenses.len(), "CSV report written");
    Ok(path.to_path_buf())
}

fn sanitize(field: &str) -> String {
    field.replace([';', '\n', '\r'], " ")
}
