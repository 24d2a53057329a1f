use std::collections::HashMap;

pub mod category;
pub mod config;
pub mod expense;
pub mod store;
pub mod summary;
pub mod system;

use chrono::NaiveDate;

use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::domain::expense::parse_date_key;

pub(crate) fn all_definitions() -> Vec<CommandDefinition> {
    let mut commands = Vec::new();
    commands.extend(system::definitions());
    commands.extend(expense::definitions());
    commands.extend(category::definitions());
    commands.extend(summary::definitions());
    commands.extend(config::definitions());
    commands.extend(store::definitions());
    commands
}

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

#[derive(Clone)]
pub struct CommandDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
}

impl CommandDefinition {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            handler,
        }
    }
}

pub struct CommandRegistry {
    commands: HashMap<&'static str, CommandDefinition>,
    order: Vec<&'static str>,
}

impl CommandRegistry {
    pub fn new(definitions: Vec<CommandDefinition>) -> Self {
        let mut commands = HashMap::new();
        let mut order = Vec::new();
        for definition in definitions {
            if commands.insert(definition.name, definition.clone()).is_none() {
                order.push(definition.name);
            }
        }
        Self { commands, order }
    }

    pub fn get(&self, name: &str) -> Option<&CommandDefinition> {
        self.commands.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.order
            .iter()
            .filter_map(move |name| self.commands.get(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.order.iter().copied()
    }
}

/// Literal keywords accepted as the first argument, read from the usage line.
///
/// `stats [day|week|month|year|all]` yields the five periods; placeholders
/// such as `<amount>` or `YYYY-MM` are not keywords.
pub(crate) fn keyword_choices(usage: &str) -> Vec<&str> {
    let Some(rest) = usage.split_once(' ').map(|(_, rest)| rest.trim_start()) else {
        return Vec::new();
    };
    let Some(group) = leading_group(rest) else {
        return Vec::new();
    };
    let alternatives = split_top_level(group);
    if alternatives.len() < 2 {
        return Vec::new();
    }
    alternatives
        .into_iter()
        .filter_map(|alternative| alternative.split_whitespace().next())
        .filter(|word| word.chars().all(|c| c.is_ascii_lowercase()))
        .collect()
}

/// Inner text of the bracketed group that opens `text`.
fn leading_group(text: &str) -> Option<&str> {
    if !text.starts_with(|c| c == '[' || c == '<') {
        return None;
    }
    let mut depth = 0usize;
    for (idx, c) in text.char_indices() {
        match c {
            '[' | '<' => depth += 1,
            ']' | '>' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[1..idx]);
                }
            }
            _ => {}
        }
    }
    None
}

fn split_top_level(group: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, c) in group.char_indices() {
        match c {
            '[' | '<' => depth += 1,
            ']' | '>' => depth = depth.saturating_sub(1),
            '|' if depth == 0 => {
                parts.push(group[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(group[start..].trim());
    parts
}

pub(crate) fn usage_error(usage: &str) -> CommandError {
    CommandError::InvalidArguments(format!("usage: {}", usage))
}

/// Accepts `1250.5` as well as `1250,5`.
pub(crate) fn parse_amount(raw: &str) -> Result<f64, CommandError> {
    raw.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| CommandError::InvalidArguments(format!("`{}` is not a valid amount", raw)))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, CommandError> {
    parse_date_key(raw.trim()).map_err(CommandError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_keeps_registration_order() {
        let registry = CommandRegistry::new(all_definitions());
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names.first(), Some(&"help"));
        assert!(names.contains(&"calendar"));
        assert!(registry.get("export").is_some());
        assert!(registry.get("ledger").is_none());
    }

    #[test]
    fn keywords_come_from_top_level_alternatives() {
        assert_eq!(
            keyword_choices("store [status|offline|online|fail <list|create|update|delete> [times]]"),
            vec!["status", "offline", "online", "fail"]
        );
        assert_eq!(
            keyword_choices("category <add <label> [emoji] [color] | remove <id>>"),
            vec!["add", "remove"]
        );
        assert_eq!(keyword_choices("month [prev|next|today|YYYY-MM]"), vec!["prev", "next", "today"]);
        assert!(keyword_choices("add <amount> <category> [YYYY-MM-DD] [description]").is_empty());
        assert!(keyword_choices("calendar").is_empty());
    }

    #[test]
    fn amounts_accept_either_decimal_mark() {
        assert_eq!(parse_amount("1250,5").unwrap(), 1250.5);
        assert_eq!(parse_amount(" 20 ").unwrap(), 20.0);
        assert!(parse_amount("ten").is_err());
        assert!(parse_amount("inf").is_err());
    }
}
