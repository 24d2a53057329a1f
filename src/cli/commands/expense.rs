use crate::cli::commands::{parse_amount, parse_date, usage_error, CommandDefinition};
use crate::cli::core::{CliMode, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::{line, section};
use crate::core::services::{CategoryService, ExpenseService};
use crate::currency::{format_date, format_month};
use crate::domain::expense::{Expense, ExpenseDraft};
use crate::errors::LedgerError;

const ADD_USAGE: &str = "add <amount> <category> [YYYY-MM-DD] [description]";
const EDIT_USAGE: &str = "edit <id> <amount> <category> [YYYY-MM-DD] [description]";
const REMOVE_USAGE: &str = "remove <id>";
const LIST_USAGE: &str = "list [month|all]";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("add", "Record an expense", ADD_USAGE, cmd_add),
        CommandDefinition::new("edit", "Replace the fields of an expense", EDIT_USAGE, cmd_edit),
        CommandDefinition::new("remove", "Delete an expense", REMOVE_USAGE, cmd_remove),
        CommandDefinition::new("clear", "Delete every expense", "clear", cmd_clear),
        CommandDefinition::new("list", "List expenses", LIST_USAGE, cmd_list),
    ]
}

/// Optional date followed by free-form description. A first token that is
/// not a date starts the description.
fn date_and_description<'a>(rest: &[&'a str]) -> (Option<chrono::NaiveDate>, Vec<&'a str>) {
    match rest.split_first() {
        Some((first, tail)) => match parse_date(first) {
            Ok(date) => (Some(date), tail.to_vec()),
            Err(_) => (None, rest.to_vec()),
        },
        None => (None, Vec::new()),
    }
}

fn cmd_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [amount, category, rest @ ..] = args else {
        return Err(usage_error(ADD_USAGE));
    };
    let amount = parse_amount(amount)?;
    let (date, description) = date_and_description(rest);
    let date = date.unwrap_or_else(|| context.clock().today());
    let draft = ExpenseDraft::new(amount, *category, date).with_description(description.join(" "));

    warn_unknown_category(context, category);
    let expense = ExpenseService::add(context.manager(), draft)?;
    io::print_success(format!("Added expense {}: {}", expense.id, describe(context, &expense)));
    Ok(())
}

fn cmd_edit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [id, amount, category, rest @ ..] = args else {
        return Err(usage_error(EDIT_USAGE));
    };
    let snapshot = context.manager().snapshot();
    if snapshot.identity().is_none() {
        return Err(LedgerError::NoActiveIdentity.into());
    }
    let current = snapshot
        .expense(id)
        .cloned()
        .ok_or_else(|| LedgerError::NotFound(format!("expense `{}`", id)))?;
    let amount = parse_amount(amount)?;
    let (date, description) = date_and_description(rest);
    let description = if description.is_empty() {
        current.description.clone()
    } else {
        description.join(" ")
    };
    let draft = ExpenseDraft::new(amount, *category, date.unwrap_or(current.date))
        .with_description(description);

    warn_unknown_category(context, category);
    let expense = ExpenseService::update(context.manager(), id, draft)?;
    io::print_success(format!("Updated expense {}: {}", expense.id, describe(context, &expense)));
    Ok(())
}

fn cmd_remove(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [id] = args else {
        return Err(usage_error(REMOVE_USAGE));
    };
    let expense = ExpenseService::remove(context.manager(), id)?;
    io::print_success(format!("Removed expense {}: {}", expense.id, describe(context, &expense)));
    Ok(())
}

fn cmd_clear(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let count = context.manager().snapshot().len();
    if count == 0 {
        io::print_info("No expenses to remove.");
        return Ok(());
    }
    if context.mode() == CliMode::Interactive {
        let prompt = format!("Delete all {} expenses?", count);
        if !io::confirm_action(context.theme(), &prompt, false)? {
            io::print_info("Nothing was removed.");
            return Ok(());
        }
    }
    let removed = ExpenseService::clear_all(context.manager())?;
    io::print_success(format!("Removed {} expenses.", removed));
    Ok(())
}

fn cmd_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let everything = match args {
        [] => false,
        [scope] if scope.eq_ignore_ascii_case("month") => false,
        [scope] if scope.eq_ignore_ascii_case("all") => true,
        _ => return Err(usage_error(LIST_USAGE)),
    };
    let snapshot = context.manager().snapshot();
    let displayed = context.manager().displayed_month();
    let expenses: Vec<&Expense> = snapshot
        .expenses()
        .iter()
        .filter(|expense| everything || displayed.contains(expense.date))
        .collect();

    if everything {
        section("Expenses");
    } else {
        section(format!("Expenses of {}", format_month(&context.locale(), displayed)));
    }
    if expenses.is_empty() {
        io::print_info("No expenses recorded.");
        return Ok(());
    }
    for expense in &expenses {
        let mut row = format!(
            "  {:<6} {:<8} {:>14}  {}",
            expense.id,
            format_date(&context.locale(), expense.date),
            context.format_amount(expense.amount),
            CategoryService::label_for(&snapshot, &expense.category)
        );
        if !expense.description.is_empty() {
            row.push_str(&format!("  {}", expense.description));
        }
        line(row);
    }
    let total: f64 = expenses.iter().map(|expense| expense.amount).sum();
    io::print_info(format!("{} expenses, total {}", expenses.len(), context.format_amount(total)));
    Ok(())
}

fn describe(context: &ShellContext, expense: &Expense) -> String {
    let snapshot = context.manager().snapshot();
    format!(
        "{} · {} · {}",
        context.format_amount(expense.amount),
        CategoryService::label_for(&snapshot, &expense.category),
        format_date(&context.locale(), expense.date)
    )
}

fn warn_unknown_category(context: &ShellContext, category: &str) {
    let snapshot = context.manager().snapshot();
    if snapshot.identity().is_some() && CategoryService::find(&snapshot, category).is_none() {
        io::print_warning(format!(
            "Category `{}` is not defined; the expense will reference it anyway.",
            category
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_date_is_split_from_description() {
        let (date, rest) = date_and_description(&["2024-03-02", "pan", "y", "leche"]);
        assert_eq!(date, parse_date("2024-03-02").ok());
        assert_eq!(rest, vec!["pan", "y", "leche"]);

        let (date, rest) = date_and_description(&["pan"]);
        assert!(date.is_none());
        assert_eq!(rest, vec!["pan"]);
    }
}
