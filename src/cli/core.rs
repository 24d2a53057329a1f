use std::{
    env, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use dialoguer::theme::ColorfulTheme;
use rustyline::error::ReadlineError;
use strsim::levenshtein;
use thiserror::Error;
use tracing::debug;

use crate::cli::commands::{all_definitions, CommandRegistry};
use crate::cli::io as cli_io;
use crate::config::{Config, ConfigManager};
use crate::core::LedgerManager;
use crate::currency::{format_currency, format_month, LocaleConfig};
use crate::domain::expense::parse_date_key;
use crate::errors::LedgerError;
use crate::store::InMemoryStore;
use crate::time::{Clock, FixedClock, SystemClock};
use crate::utils::paths::{app_data_dir, exports_dir_in};

pub use crate::errors::CliError;

/// Setting this variable switches the shell to line-by-line stdin mode.
pub const SCRIPT_ENV: &str = "EXPENSE_CORE_CLI_SCRIPT";
/// `YYYY-MM-DD` pinning the shell's notion of today.
pub const TODAY_ENV: &str = "EXPENSE_CORE_TODAY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Core(#[from] LedgerError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Core(inner) => CliError::Core(inner),
            other => CliError::Command(other.to_string()),
        }
    }
}

impl From<ReadlineError> for CliError {
    fn from(err: ReadlineError) -> Self {
        CliError::Input(err.to_string())
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::Command(err.to_string())
    }
}

/// State shared by every command handler for the lifetime of the shell.
pub struct ShellContext {
    mode: CliMode,
    registry: CommandRegistry,
    theme: ColorfulTheme,
    manager: Arc<LedgerManager>,
    store: Arc<InMemoryStore>,
    clock: Box<dyn Clock>,
    config_manager: ConfigManager,
    config: Config,
    data_dir: PathBuf,
    pub(crate) running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let clock = clock_from_env()?;
        Self::with_parts(mode, app_data_dir(), clock)
    }

    /// Builds a shell rooted at `data_dir` over a fresh in-memory store seeded
    /// with the default categories.
    pub fn with_parts(
        mode: CliMode,
        data_dir: PathBuf,
        clock: Box<dyn Clock>,
    ) -> Result<Self, CliError> {
        let config_manager = ConfigManager::with_base_dir(data_dir.clone())?;
        let config = config_manager.load()?;
        let store = Arc::new(InMemoryStore::with_default_categories());
        let manager = Arc::new(LedgerManager::with_clock(store.clone(), clock.as_ref()));
        debug!(data_dir = %data_dir.display(), ?mode, "Shell context ready");

        Ok(Self {
            mode,
            registry: CommandRegistry::new(all_definitions()),
            theme: ColorfulTheme::default(),
            manager,
            store,
            clock,
            config_manager,
            config,
            data_dir,
            running: true,
        })
    }

    pub(crate) fn mode(&self) -> CliMode {
        self.mode
    }

    pub(crate) fn theme(&self) -> &ColorfulTheme {
        &self.theme
    }

    pub(crate) fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub(crate) fn manager(&self) -> &LedgerManager {
        &self.manager
    }

    pub(crate) fn store(&self) -> &InMemoryStore {
        &self.store
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn config_path(&self) -> &Path {
        self.config_manager.path()
    }

    pub(crate) fn exports_dir(&self) -> PathBuf {
        exports_dir_in(&self.data_dir)
    }

    pub(crate) fn locale(&self) -> LocaleConfig {
        self.config.locale_config()
    }

    pub(crate) fn format_amount(&self, amount: f64) -> String {
        format_currency(amount, &self.config.currency_code(), &self.locale())
    }

    /// Applies and persists one setting. The in-memory config only changes
    /// once the file is written.
    pub(crate) fn set_config_value(&mut self, key: &str, value: &str) -> CommandResult {
        let mut updated = self.config.clone();
        updated.set(key, value)?;
        self.config_manager.save(&updated)?;
        self.config = updated;
        Ok(())
    }

    pub(crate) fn prompt(&self) -> String {
        let month = format_month(&self.locale(), self.manager.displayed_month());
        match self.manager.identity() {
            Some(identity) => format!("expense_core [{} | {}]> ", identity, month),
            None => "expense_core> ".to_string(),
        }
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        let handler = self.registry.get(command).map(|definition| definition.handler);
        if let Some(handler) = handler {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        cli_io::print_warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let needle = input.to_lowercase();
        let best = self
            .registry
            .names()
            .map(|name| (levenshtein(name, &needle), name))
            .min_by_key(|(distance, _)| *distance);

        if let Some((distance, name)) = best {
            if distance <= 3 {
                cli_io::print_info(format!("Suggestion: `{}`?", name));
            }
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        Ok(cli_io::confirm_action(&self.theme, "Exit shell?", true)?)
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                cli_io::print_error(&message);
                cli_io::print_hint("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::Core(LedgerError::NoActiveIdentity) => {
                cli_io::print_error("No active identity.");
                cli_io::print_hint("Use `login <name>` to open a ledger.");
                Ok(())
            }
            CommandError::Core(err @ LedgerError::Persistence(_)) => {
                cli_io::print_error(err.to_string());
                cli_io::print_hint("The change was not saved; the ledger is unchanged.");
                Ok(())
            }
            other => {
                cli_io::print_error(other.to_string());
                Ok(())
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        crate::cli::shell::handle_line(self, line)
    }
}

fn clock_from_env() -> Result<Box<dyn Clock>, CliError> {
    match env::var(TODAY_ENV) {
        Ok(value) => {
            let today = parse_date_key(value.trim())
                .map_err(|_| CliError::Input(format!("{} must be YYYY-MM-DD", TODAY_ENV)))?;
            Ok(Box::new(FixedClock(today)))
        }
        Err(_) => Ok(Box::new(SystemClock)),
    }
}

#[cfg(test)]
pub(crate) fn process_script(
    data_dir: &Path,
    today: chrono::NaiveDate,
    lines: &[&str],
) -> Result<ShellContext, CliError> {
    let mut context = ShellContext::with_parts(
        CliMode::Script,
        data_dir.to_path_buf(),
        Box::new(FixedClock(today)),
    )?;
    for line in lines {
        match context.process_line(line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => context.report_error(err)?,
        }
    }
    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::services::{CategoryService, SummaryService};
    use crate::ledger::{DisplayedMonth, Period};
    use crate::store::StoreOp;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
    }

    #[test]
    fn script_builds_ledger_through_commands() {
        let dir = tempfile::tempdir().unwrap();
        let context = process_script(
            dir.path(),
            today(),
            &[
                "login alice",
                "add 100 almacen 2024-03-01",
                "add 50 almacen 2024-03-02 \"pan y leche\"",
                "add 200 limpieza",
            ],
        )
        .unwrap();

        let snapshot = context.manager().snapshot();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.total(), 350.0);
        assert_eq!(snapshot.expense("2").unwrap().description, "pan y leche");
        assert_eq!(snapshot.expense("3").unwrap().date, today());

        let stats = SummaryService::period_stats(context.manager(), Period::Day, context.clock());
        assert_eq!(stats.total, 250.0);
    }

    #[test]
    fn errors_are_reported_and_the_shell_continues() {
        let dir = tempfile::tempdir().unwrap();
        let context = process_script(
            dir.path(),
            today(),
            &["add 10 almacen", "login alice", "add -5 almacen", "remove 99", "add 10 otros"],
        )
        .unwrap();
        assert_eq!(context.manager().snapshot().len(), 1);
        assert!(context.running);
    }

    #[test]
    fn dispatch_surfaces_errors_to_the_caller() {
        let dir = tempfile::tempdir().unwrap();
        let mut context = process_script(dir.path(), today(), &["login alice"]).unwrap();
        let err = context.process_line("add nope almacen").unwrap_err();
        assert!(matches!(err, CommandError::InvalidArguments(_)));

        context.store().fail_next(StoreOp::Create);
        let err = context.process_line("add 10 almacen").unwrap_err();
        assert!(matches!(err, CommandError::Core(LedgerError::Persistence(_))));
        assert!(context.manager().snapshot().is_empty());
    }

    #[test]
    fn referenced_category_survives_remove_command() {
        let dir = tempfile::tempdir().unwrap();
        let mut context = process_script(
            dir.path(),
            today(),
            &["login alice", "category add Viajes ✈️", "add 10 viajes-alice"],
        )
        .unwrap();
        let err = context.process_line("category remove viajes-alice").unwrap_err();
        assert!(matches!(
            err,
            CommandError::Core(LedgerError::ConstraintViolation(_))
        ));
        let snapshot = context.manager().snapshot();
        assert!(CategoryService::find(&snapshot, "viajes-alice").is_some());
    }

    #[test]
    fn month_navigation_and_exit() {
        let dir = tempfile::tempdir().unwrap();
        let mut context =
            process_script(dir.path(), today(), &["month prev", "month prev"]).unwrap();
        assert_eq!(
            context.manager().displayed_month(),
            DisplayedMonth::new(2024, 1).unwrap()
        );
        context.process_line("month 2023-12").unwrap();
        assert_eq!(
            context.manager().displayed_month(),
            DisplayedMonth::new(2023, 12).unwrap()
        );
        context.process_line("month today").unwrap();
        assert_eq!(
            context.manager().displayed_month(),
            DisplayedMonth::new(2024, 3).unwrap()
        );
        assert_eq!(context.process_line("exit").unwrap(), LoopControl::Exit);
        assert!(!context.running);
    }

    #[test]
    fn config_changes_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let context = process_script(
            dir.path(),
            today(),
            &["config set locale en-US", "config set intensity.high 5000"],
        )
        .unwrap();
        assert_eq!(context.config().locale, "en-US");
        let reloaded = ConfigManager::with_base_dir(dir.path().to_path_buf())
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(reloaded.intensity.high, 5000.0);
        assert_eq!(context.format_amount(1250.5), "$1,250.5");
    }

    #[test]
    fn unknown_commands_do_not_fail() {
        let dir = tempfile::tempdir().unwrap();
        let mut context = process_script(dir.path(), today(), &[]).unwrap();
        assert_eq!(context.process_line("lsit").unwrap(), LoopControl::Continue);
        assert_eq!(context.process_line("").unwrap(), LoopControl::Continue);
    }
}
