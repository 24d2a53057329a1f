mod common;

use assert_cmd::Command;
use common::temp_base_dir;
use predicates::str::contains;

fn shell(today: &str) -> Command {
    let mut cmd = Command::cargo_bin("expense_core_cli").unwrap();
    cmd.env("EXPENSE_CORE_CLI_SCRIPT", "1")
        .env("EXPENSE_CORE_HOME", temp_base_dir())
        .env("EXPENSE_CORE_TODAY", today)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn script_mode_runs_basic_flow() {
    let input = "login alice\n\
                 add 100 almacen 2024-03-01\n\
                 add 50 almacen 2024-03-02\n\
                 add 200 limpieza\n\
                 stats\n\
                 exit\n";

    shell("2024-03-02")
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("Signed in as alice"))
        .stdout(contains("Added expense 3"))
        .stdout(contains("Total: $ 350"))
        .stdout(contains("57%"));
}

#[test]
fn failed_store_call_is_reported_and_rolled_back() {
    let input = "login alice\n\
                 store fail create\n\
                 add 10 otros\n\
                 list\n";

    shell("2024-03-02")
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("Persistence error"))
        .stdout(contains("No expenses recorded."));
}

#[test]
fn referenced_category_cannot_be_removed() {
    let input = "login alice\n\
                 category add \"Viajes\" ✈️\n\
                 add 500 viajes-alice\n\
                 category remove viajes-alice\n\
                 categories\n";

    shell("2024-03-02")
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("Created category ✈️ Viajes (viajes-alice)."))
        .stdout(contains("Constraint violation: category `viajes-alice` is used by 1 expense"));
}

#[test]
fn unknown_command_suggests_the_closest_match() {
    shell("2024-03-02")
        .write_stdin("calender\n")
        .assert()
        .success()
        .stdout(contains("Unknown command `calender`"))
        .stdout(contains("Suggestion: `calendar`?"));
}

#[test]
fn calendar_renders_the_displayed_month() {
    let input = "login alice\n\
                 add 2000 almacen 2024-03-09\n\
                 month 2024-03\n\
                 calendar\n";

    shell("2024-03-10")
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("marzo 2024"))
        .stdout(contains("  9+"))
        .stdout(contains("Month total: $ 2.000"));
}

#[test]
fn export_writes_into_the_data_directory() {
    let home = temp_base_dir();
    let mut cmd = Command::cargo_bin("expense_core_cli").unwrap();
    cmd.env("EXPENSE_CORE_CLI_SCRIPT", "1")
        .env("EXPENSE_CORE_HOME", &home)
        .env("EXPENSE_CORE_TODAY", "2024-03-09")
        .env("NO_COLOR", "1")
        .write_stdin("login alice\nadd 1250,5 almacen\nexport\n")
        .assert()
        .success()
        .stdout(contains("Exported 1 expenses"));

    let csv = std::fs::read_to_string(home.join("exports/expense_report_2024-03-09.csv")).unwrap();
    assert!(csv.contains("2024-03-09;$ 1250.5;almacen"));
}

#[test]
fn invalid_today_override_fails_fast() {
    shell("yesterday")
        .write_stdin("exit\n")
        .assert()
        .failure()
        .stderr(contains("EXPENSE_CORE_TODAY"));
}

#[test]
fn version_lists_build_details() {
    shell("2024-03-02")
        .write_stdin("version\n")
        .assert()
        .success()
        .stdout(contains(format!("Expense Core CLI v{}", env!("CARGO_PKG_VERSION"))))
        .stdout(contains("commit"))
        .stdout(contains("rustc"));
}
