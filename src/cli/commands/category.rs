use crate::cli::commands::{usage_error, CommandDefinition};
use crate::cli::core::{CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::{line, section};
use crate::core::integrity;
use crate::core::services::CategoryService;
use crate::domain::category::CategoryDraft;
use crate::domain::common::Displayable;

const CATEGORY_USAGE: &str = "category <add <label> [emoji] [color] | remove <id>>";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "categories",
            "List the categories of the active ledger",
            "categories",
            cmd_categories,
        ),
        CommandDefinition::new(
            "category",
            "Create or delete a category",
            CATEGORY_USAGE,
            cmd_category,
        ),
    ]
}

fn cmd_categories(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let snapshot = context.manager().snapshot();
    section("Categories");
    let categories = CategoryService::list(&snapshot);
    if categories.is_empty() {
        io::print_info("No categories loaded. Use `login <name>` first.");
        return Ok(());
    }
    for category in categories {
        let used = integrity::referencing_expenses(&category.id, snapshot.expenses());
        let scope = if category.is_shared() { "shared" } else { "own" };
        line(format!(
            "  {:<24} {:<20} {:<7} {} expenses",
            category.id,
            category.display_label(),
            scope,
            used
        ));
    }
    Ok(())
}

fn cmd_category(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [action, label, rest @ ..] if action.eq_ignore_ascii_case("add") && rest.len() <= 2 => {
            let mut draft = CategoryDraft::new(*label);
            if let Some(emoji) = rest.first() {
                draft = draft.with_emoji(*emoji);
            }
            if let Some(color) = rest.get(1) {
                draft = draft.with_color(*color);
            }
            let category = CategoryService::add(context.manager(), draft)?;
            io::print_success(format!(
                "Created category {} ({}).",
                category.display_label(),
                category.id
            ));
            Ok(())
        }
        [action, id] if action.eq_ignore_ascii_case("remove") => {
            let category = CategoryService::remove(context.manager(), id)?;
            io::print_success(format!("Deleted category {}.", category.display_label()));
            Ok(())
        }
        _ => Err(usage_error(CATEGORY_USAGE)),
    }
}
