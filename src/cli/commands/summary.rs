use std::path::PathBuf;

use crate::cli::commands::{usage_error, CommandDefinition};
use crate::cli::core::{CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::{line, section};
use crate::core::services::{CategoryService, SummaryService};
use crate::currency::{format_date_full, format_month, weekday_headers};
use crate::export::{export_file_name, write_csv};
use crate::ledger::{CalendarMonth, Intensity, Period, PeriodStats};
use crate::utils::paths::ensure_dir;

const STATS_USAGE: &str = "stats [day|week|month|year|all]";
const EXPORT_USAGE: &str = "export [path]";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "stats",
            "Show totals and category breakdown for a period",
            STATS_USAGE,
            cmd_stats,
        ),
        CommandDefinition::new(
            "calendar",
            "Show the displayed month as a spending calendar",
            "calendar",
            cmd_calendar,
        ),
        CommandDefinition::new(
            "export",
            "Write every expense to a CSV report",
            EXPORT_USAGE,
            cmd_export,
        ),
    ]
}

fn cmd_stats(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let manager = context.manager();
    let stats = match args {
        [] => vec![SummaryService::period_stats(manager, Period::Month, context.clock())],
        [scope] if scope.eq_ignore_ascii_case("all") => {
            SummaryService::all_periods(manager, context.clock())
        }
        [scope] => {
            let period: Period = scope.parse()?;
            vec![SummaryService::period_stats(manager, period, context.clock())]
        }
        _ => return Err(usage_error(STATS_USAGE)),
    };
    for entry in &stats {
        print_stats(context, entry);
    }
    Ok(())
}

fn print_stats(context: &ShellContext, stats: &PeriodStats) {
    let snapshot = context.manager().snapshot();
    section(format!("{} ({})", stats.period, stats.window));
    io::print_info(format!("Total: {}", context.format_amount(stats.total)));
    io::print_info(format!(
        "vs {}: {} ({:+}%)",
        stats.period.previous_label(),
        context.format_amount(stats.previous_total),
        stats.change
    ));
    if stats.is_empty() {
        io::print_info("No expenses in this period.");
        return;
    }
    for share in &stats.by_category {
        line(format!(
            "  {:<24} {:>14} {:>4}%",
            CategoryService::label_for(&snapshot, &share.category),
            context.format_amount(share.amount),
            share.percentage
        ));
    }
}

fn cmd_calendar(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let month = SummaryService::calendar(context.manager(), &context.config().intensity);
    print_calendar(context, &month);
    Ok(())
}

fn intensity_marker(intensity: Intensity) -> char {
    match intensity {
        Intensity::Low => '.',
        Intensity::Medium => '+',
        Intensity::High => '#',
    }
}

fn print_calendar(context: &ShellContext, month: &CalendarMonth) {
    let locale = context.locale();
    section(format_month(&locale, month.month));
    let headers: Vec<String> = weekday_headers(&locale)
        .iter()
        .map(|header| format!("{:>4}", header))
        .collect();
    line(headers.join(""));
    for week in month.weeks() {
        let cells: Vec<String> = week
            .iter()
            .map(|cell| match cell {
                Some(day) => match month.day(*day) {
                    Some(bucket) => format!("{:>3}{}", day, intensity_marker(bucket.intensity)),
                    None => format!("{:>3} ", day),
                },
                None => "    ".to_string(),
            })
            .collect();
        line(cells.join("").trim_end().to_string());
    }
    io::print_info(format!("Month total: {}", context.format_amount(month.month_total)));
    if let Some((date, bucket)) = month.busiest_day() {
        io::print_info(format!(
            "Busiest day: {} with {} across {} expenses",
            format_date_full(&locale, date),
            context.format_amount(bucket.total),
            bucket.expenses.len()
        ));
    }
    let thresholds = &context.config().intensity;
    io::print_info(format!(
        "Legend: . up to {}  + above {}  # above {}",
        context.format_amount(thresholds.medium),
        context.format_amount(thresholds.medium),
        context.format_amount(thresholds.high)
    ));
}

fn cmd_export(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let path = match args {
        [] => {
            let dir = context.exports_dir();
            ensure_dir(&dir)?;
            dir.join(export_file_name(context.clock().today()))
        }
        [path] => PathBuf::from(*path),
        _ => return Err(usage_error(EXPORT_USAGE)),
    };
    let snapshot = context.manager().snapshot();
    let written = write_csv(&path, snapshot.expenses())?;
    io::print_success(format!(
        "Exported {} expenses to {}",
        snapshot.len(),
        written.display()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::core::process_script;
    use chrono::NaiveDate;

    #[test]
    fn export_writes_report_into_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let context = process_script(
            dir.path(),
            today,
            &["login alice", "add 1250,5 almacen 2024-03-05", "export"],
        )
        .unwrap();
        let path = context.exports_dir().join("expense_report_2024-03-09.csv");
        let csv = std::fs::read_to_string(path).unwrap();
        assert!(csv.contains("2024-03-05;$ 1250.5;almacen"));
        assert!(csv.ends_with("TOTAL SPENT;$ 1250.5; "));
    }

    #[test]
    fn markers_grow_with_intensity() {
        assert_eq!(intensity_marker(Intensity::Low), '.');
        assert_eq!(intensity_marker(Intensity::High), '#');
    }
}
