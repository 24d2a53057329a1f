use crate::cli::commands::{usage_error, CommandDefinition};
use crate::cli::core::{CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section;
use crate::config::CONFIG_KEYS;

const CONFIG_USAGE: &str = "config [show|set <key> <value>]";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "config",
        "View and change display preferences",
        CONFIG_USAGE,
        cmd_config,
    )]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] => show_config(context),
        [action] if action.eq_ignore_ascii_case("show") => show_config(context),
        [action, key, value @ ..] if action.eq_ignore_ascii_case("set") && !value.is_empty() => {
            let key = key.to_lowercase();
            context.set_config_value(&key, value.join(" ").trim())?;
            io::print_success(format!("Updated {}.", key));
            Ok(())
        }
        _ => Err(usage_error(CONFIG_USAGE)),
    }
}

fn show_config(context: &ShellContext) -> CommandResult {
    let config = context.config();
    section("Configuration");
    io::print_info(format!("  locale             {}", config.locale));
    io::print_info(format!("  currency           {}", config.currency_code()));
    io::print_info(format!("  intensity.medium   {}", config.intensity.medium));
    io::print_info(format!("  intensity.high     {}", config.intensity.high));
    io::print_info(format!("  file               {}", context.config_path().display()));
    io::print_info(format!("Settable keys: {}", CONFIG_KEYS.join(", ")));
    Ok(())
}
