use crate::cli::commands::{usage_error, CommandDefinition};
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::{help, io};
use crate::currency::format_month;
use crate::identity::Identity;
use crate::ledger::DisplayedMonth;

const LOGIN_USAGE: &str = "login <identity>";
const MONTH_USAGE: &str = "month [prev|next|today|YYYY-MM]";

/// Values stamped by `build.rs`; absent when built without it.
const BUILD_DETAILS: [(&str, Option<&str>); 6] = [
    ("commit", option_env!("EXPENSE_CORE_BUILD_HASH")),
    ("tree", option_env!("EXPENSE_CORE_BUILD_STATUS")),
    ("built", option_env!("EXPENSE_CORE_BUILD_TIMESTAMP")),
    ("profile", option_env!("EXPENSE_CORE_BUILD_PROFILE")),
    ("target", option_env!("EXPENSE_CORE_BUILD_TARGET")),
    ("rustc", option_env!("EXPENSE_CORE_BUILD_RUSTC")),
];

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("help", "Show available commands", "help [command]", cmd_help),
        CommandDefinition::new("version", "Show build information", "version", cmd_version),
        CommandDefinition::new(
            "login",
            "Open the ledger of an identity",
            LOGIN_USAGE,
            cmd_login,
        ),
        CommandDefinition::new("logout", "Close the active ledger", "logout", cmd_logout),
        CommandDefinition::new("month", "Show or change the displayed month", MONTH_USAGE, cmd_month),
        CommandDefinition::new("exit", "Exit the shell", "exit", cmd_exit),
    ]
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.first() {
        None => help::print_overview(context.registry()),
        Some(name) => match context.registry().get(&name.to_lowercase()) {
            Some(definition) => help::print_command(definition),
            None => context.suggest_command(name),
        },
    }
    Ok(())
}

fn cmd_version(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    io::print_info(format!("Expense Core CLI v{}", env!("CARGO_PKG_VERSION")));
    for (label, value) in BUILD_DETAILS {
        io::print_info(format!("  {:<8} {}", label, value.unwrap_or("unknown")));
    }
    Ok(())
}

fn cmd_login(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let name = match args {
        [name] if !name.trim().is_empty() => name.trim(),
        _ => return Err(usage_error(LOGIN_USAGE)),
    };
    let report = context
        .manager()
        .on_identity_change(Some(Identity::new(name)))?
        .ok_or_else(|| CommandError::Message("ledger did not load".into()))?;
    for warning in &report.warnings {
        io::print_warning(warning);
    }
    io::print_success(format!(
        "Signed in as {}: {} expenses, {} categories.",
        report.identity, report.expenses, report.categories
    ));
    Ok(())
}

fn cmd_logout(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let Some(identity) = context.manager().identity() else {
        io::print_warning("No active ledger.");
        return Ok(());
    };
    context.manager().on_identity_change(None)?;
    io::print_success(format!("Signed out {}.", identity));
    Ok(())
}

fn cmd_month(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let manager = context.manager();
    let month = match args {
        [] => manager.displayed_month(),
        [arg] => match arg.to_lowercase().as_str() {
            "prev" | "previous" => manager.show_previous_month(),
            "next" => manager.show_next_month(),
            "today" | "current" => manager.show_current_month(context.clock()),
            other => {
                let month: DisplayedMonth = other.parse()?;
                manager.set_displayed_month(month);
                month
            }
        },
        _ => return Err(usage_error(MONTH_USAGE)),
    };
    io::print_info(format!("Showing {}.", format_month(&context.locale(), month)));
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}
