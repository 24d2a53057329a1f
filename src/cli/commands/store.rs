//! Failure injection against the shell's in-memory store, for rehearsing
//! rollbacks by hand or from scripts.

use crate::cli::commands::{usage_error, CommandDefinition};
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section;
use crate::store::StoreOp;

const STORE_USAGE: &str = "store [status|offline|online|fail <list|create|update|delete> [times]]";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "store",
        "Inspect or disturb the backing store",
        STORE_USAGE,
        cmd_store,
    )]
}

fn cmd_store(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let store = context.store();
    match args {
        [] => show_status(context),
        [action] if action.eq_ignore_ascii_case("status") => show_status(context),
        [action] if action.eq_ignore_ascii_case("offline") => {
            store.set_offline(true);
            io::print_warning("Store is offline; every call will fail.");
            Ok(())
        }
        [action] if action.eq_ignore_ascii_case("online") => {
            store.set_offline(false);
            io::print_success("Store is back online.");
            Ok(())
        }
        [action, op, rest @ ..] if action.eq_ignore_ascii_case("fail") && rest.len() <= 1 => {
            let op: StoreOp = op
                .parse()
                .map_err(|err| CommandError::InvalidArguments(format!("{}", err)))?;
            let times = match rest.first() {
                Some(raw) => raw.parse::<u32>().map_err(|_| {
                    CommandError::InvalidArguments(format!("`{}` is not a count", raw))
                })?,
                None => 1,
            };
            store.fail_next_n(op, times);
            io::print_warning(format!("Next {} {} call(s) will fail.", times, op.as_str()));
            Ok(())
        }
        _ => Err(usage_error(STORE_USAGE)),
    }
}

fn show_status(context: &ShellContext) -> CommandResult {
    let store = context.store();
    section("Store");
    for op in StoreOp::ALL {
        io::print_info(format!("  {:<8} {} calls", op.as_str(), store.calls(op)));
    }
    io::print_info(format!(
        "  pending mutations: {}",
        context.manager().pending_mutations()
    ));
    Ok(())
}
