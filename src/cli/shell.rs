use std::{
    borrow::Cow,
    collections::BTreeMap,
    fmt,
    io::{self, BufRead},
};

use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::{ValidationContext, ValidationResult, Validator},
    Cmd, Context as ReadlineContext, Editor, Helper, KeyEvent,
};
use shell_words::split;

use crate::cli::commands::{keyword_choices, CommandRegistry};
use crate::cli::core::{CliError, CliMode, CommandError, LoopControl, ShellContext, SCRIPT_ENV};
use crate::cli::io as cli_io;

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };

    let mut context = ShellContext::new(mode)?;

    match mode {
        CliMode::Interactive => run_interactive(&mut context),
        CliMode::Script => run_script(&mut context),
    }
}

/// Runs lines pulled from `next_line` until the source is exhausted or a
/// command ends the session. Command failures are reported, not returned.
fn drive<F>(context: &mut ShellContext, mut next_line: F) -> Result<(), CliError>
where
    F: FnMut(&ShellContext) -> Result<Option<String>, CliError>,
{
    while context.running {
        let Some(line) = next_line(&*context)? else {
            break;
        };
        match handle_line(context, &line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => context.report_error(err)?,
        }
    }
    Ok(())
}

fn run_interactive(context: &mut ShellContext) -> Result<(), CliError> {
    let mut editor = Editor::<CommandHelper, DefaultHistory>::new()?;
    editor.set_helper(Some(CommandHelper::from_registry(context.registry())));
    editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);
    cli_io::print_info("Type `help` to list commands, `login <name>` to open a ledger.");

    drive(context, |context| loop {
        match editor.readline(&context.prompt()) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    editor.add_history_entry(line.trim()).ok();
                }
                return Ok(Some(line));
            }
            Err(ReadlineError::Interrupted) => {
                if context.confirm_exit()? {
                    return Ok(None);
                }
            }
            Err(ReadlineError::Eof) => {
                cli_io::print_info("Exiting shell.");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        }
    })
}

fn run_script(context: &mut ShellContext) -> Result<(), CliError> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    drive(context, |_| lines.next().transpose().map_err(CliError::from))
}

pub(crate) fn handle_line(
    context: &mut ShellContext,
    line: &str,
) -> Result<LoopControl, CommandError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(LoopControl::Continue);
    }

    let tokens = match parse_command_line(trimmed) {
        Ok(tokens) => tokens,
        Err(err) => {
            cli_io::print_warning(&err);
            return Ok(LoopControl::Continue);
        }
    };

    let Some((raw, rest)) = tokens.split_first() else {
        return Ok(LoopControl::Continue);
    };
    let args: Vec<&str> = rest.iter().map(String::as_str).collect();

    let control = context.dispatch(&raw.to_lowercase(), raw, &args)?;
    if control == LoopControl::Exit {
        context.running = false;
    }
    Ok(control)
}

/// Completes the command word, then the keyword its first argument takes.
struct CommandHelper {
    keywords: BTreeMap<String, Vec<String>>,
}

impl CommandHelper {
    fn from_registry(registry: &CommandRegistry) -> Self {
        let names: Vec<String> = registry.names().map(str::to_ascii_lowercase).collect();
        let keywords = registry
            .iter()
            .map(|definition| {
                let choices = if definition.name == "help" {
                    names.clone()
                } else {
                    keyword_choices(definition.usage)
                        .into_iter()
                        .map(String::from)
                        .collect()
                };
                (definition.name.to_ascii_lowercase(), choices)
            })
            .collect();
        Self { keywords }
    }

    /// Start of the word under the cursor and its completions.
    fn candidates(&self, prefix: &str) -> (usize, Vec<Pair>) {
        let start = prefix.trim_end_matches(|c: char| !c.is_whitespace()).len();
        let needle = prefix[start..].to_ascii_lowercase();
        let before: Vec<&str> = prefix[..start].split_whitespace().collect();
        let pool: Vec<&String> = match before.as_slice() {
            [] => self.keywords.keys().collect(),
            [command] => self
                .keywords
                .get(&command.to_ascii_lowercase())
                .map(|choices| choices.iter().collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        let pairs = pool
            .into_iter()
            .filter(|word| word.starts_with(&needle))
            .map(|word| Pair {
                display: word.clone(),
                replacement: word.clone(),
            })
            .collect();
        (start, pairs)
    }
}

impl Helper for CommandHelper {}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        Ok(self.candidates(&line[..pos]))
    }
}

impl Hinter for CommandHelper {
    type Hint = String;
}

impl Highlighter for CommandHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Borrowed(line)
    }
}

impl Validator for CommandHelper {
    fn validate(&self, _ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        Ok(ValidationResult::Valid(None))
    }
}

pub(crate) fn parse_command_line(input: &str) -> Result<Vec<String>, ParseError> {
    split(input).map_err(|err| ParseError(err.to_string()))
}

#[derive(Debug)]
pub(crate) struct ParseError(String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not parse command line: {}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::all_definitions;

    fn helper() -> CommandHelper {
        CommandHelper::from_registry(&CommandRegistry::new(all_definitions()))
    }

    fn completions(prefix: &str) -> (usize, Vec<String>) {
        let (start, pairs) = helper().candidates(prefix);
        (start, pairs.into_iter().map(|pair| pair.replacement).collect())
    }

    #[test]
    fn quoted_arguments_stay_together() {
        let tokens = parse_command_line("add 50 almacen 2024-03-02 \"pan y leche\"").unwrap();
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[4], "pan y leche");
        assert!(parse_command_line("add \"unterminated").is_err());
    }

    #[test]
    fn first_word_completes_command_names() {
        assert_eq!(completions("st"), (0, vec!["stats".to_string(), "store".to_string()]));
        assert_eq!(completions("  cat").1, vec!["categories", "category"]);
    }

    #[test]
    fn second_word_completes_keywords_from_usage() {
        assert_eq!(completions("stats w"), (6, vec!["week".to_string()]));
        assert_eq!(completions("Month n").1, vec!["next"]);
        assert_eq!(completions("help cal").1, vec!["calendar"]);
    }

    #[test]
    fn free_form_arguments_have_no_completions() {
        assert!(completions("add 10 alm").1.is_empty());
        assert!(completions("store fail cr").1.is_empty());
        assert!(completions("unknown x").1.is_empty());
    }
}
