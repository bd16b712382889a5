//! Interactive session.
//!
//! The controller is shared behind a mutex. Solves run on a background task so
//! the prompt stays usable, and a watcher task prints every state transition.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::Arc;

use anyhow::Result;
use axiom_application::render::{Typesetter, UnicodeTypesetter, render_record};
use axiom_application::{AppController, ViewState};
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::history::DefaultHistory;
use rustyline::{Context, Editor, Helper};
use tokio::sync::{Mutex, watch};

use crate::commands::history::{CLEAR_PROMPT, find_entry, is_yes};
use crate::context::AppContext;
use crate::display;

/// Sample problems offered by `/examples`.
pub const EXAMPLES: [&str; 4] = [
    "Solve x² - 5x + 6 = 0",
    "Integrate sin(x)e^x dx",
    "Derive the formula for area of a circle",
    "Calculate the probability of 3 heads in 5 coin flips",
];

const COMMANDS: [&str; 6] = ["/history", "/show", "/clear", "/examples", "/use", "/help"];

/// A parsed line of input.
#[derive(Debug, PartialEq, Eq)]
enum ReplCommand<'a> {
    Quit,
    History,
    Show(&'a str),
    Clear,
    Examples,
    Use(&'a str),
    Help,
    Unknown(&'a str),
    Solve(&'a str),
}

fn parse_command(line: &str) -> ReplCommand<'_> {
    let trimmed = line.trim();
    if trimmed == "quit" || trimmed == "exit" {
        return ReplCommand::Quit;
    }
    if !trimmed.starts_with('/') {
        return ReplCommand::Solve(line);
    }

    let (name, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (trimmed, ""),
    };
    match name {
        "/history" => ReplCommand::History,
        "/show" => ReplCommand::Show(arg),
        "/clear" => ReplCommand::Clear,
        "/examples" => ReplCommand::Examples,
        "/use" => ReplCommand::Use(arg),
        "/help" => ReplCommand::Help,
        other => ReplCommand::Unknown(other),
    }
}

/// Completion, highlighting and hints for slash commands.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|cmd| cmd.to_string()).collect(),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

pub async fn run(context: &AppContext) -> Result<()> {
    let controller = Arc::new(Mutex::new(AppController::new(
        context.solver_or_unconfigured(),
        context.repository()?,
    )));
    let typesetter: Arc<dyn Typesetter> = Arc::new(UnicodeTypesetter);

    let state_rx = controller.lock().await.subscribe();
    let watcher = tokio::spawn(render_transitions(state_rx, Arc::clone(&typesetter)));

    let mut rl: Editor<CliHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    println!("{}", "=== Axiom ===".bright_magenta().bold());
    println!(
        "{}",
        "Type a math problem to solve it, '/help' for commands, or 'quit' to exit.".bright_black()
    );
    println!();

    loop {
        match rl.readline("∑ ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());

                match parse_command(&line) {
                    ReplCommand::Quit => {
                        println!("{}", "Goodbye!".bright_green());
                        break;
                    }
                    ReplCommand::Solve(problem) => submit(&controller, problem).await,
                    ReplCommand::Use(arg) => match example(arg) {
                        Some(problem) => {
                            println!("{}", format!("> {}", problem).green());
                            submit(&controller, problem).await;
                        }
                        None => display::print_note("Usage: /use <1-4> (see /examples)"),
                    },
                    ReplCommand::History => {
                        let guard = controller.lock().await;
                        display::print_history(guard.history(), guard.active_id().as_deref());
                    }
                    ReplCommand::Show(key) => show(&controller, key).await,
                    ReplCommand::Clear => {
                        let answer = prompt_line(&mut rl, CLEAR_PROMPT)?;
                        let result = controller.lock().await.clear_history(is_yes(&answer));
                        match result {
                            Ok(()) if is_yes(&answer) => display::print_note("History cleared."),
                            Ok(()) => display::print_note("History kept."),
                            Err(e) => {
                                eprintln!("{}", format!("Failed to clear history: {}", e).red())
                            }
                        }
                    }
                    ReplCommand::Examples => print_examples(),
                    ReplCommand::Help => print_help(),
                    ReplCommand::Unknown(name) => {
                        display::print_note(&format!("Unknown command {name}. Try /help."));
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    watcher.abort();
    Ok(())
}

/// Starts a background solve unless one is already running.
async fn submit(controller: &Arc<Mutex<AppController>>, problem: &str) {
    let pending = {
        let mut guard = controller.lock().await;
        if guard.is_loading() {
            display::print_note("Still solving the previous problem; please wait.");
            return;
        }
        guard.set_input(problem);
        guard.begin_solve()
    };

    let Some(pending) = pending else {
        return;
    };
    let controller = Arc::clone(controller);
    tokio::spawn(async move {
        let outcome = pending.run().await;
        controller.lock().await.finish_solve(outcome);
    });
}

async fn show(controller: &Arc<Mutex<AppController>>, key: &str) {
    let mut guard = controller.lock().await;
    let Some(id) = find_entry(guard.history(), key).map(|record| record.id.clone()) else {
        display::print_note(&format!("No history entry matches '{key}'. See /history."));
        return;
    };
    if let Err(e) = guard.select_history_entry(&id) {
        display::print_note(&e.to_string());
    }
}

/// Prints each new view state until the controller goes away.
async fn render_transitions(
    mut state_rx: watch::Receiver<ViewState>,
    typesetter: Arc<dyn Typesetter>,
) {
    while state_rx.changed().await.is_ok() {
        let state = state_rx.borrow_and_update().clone();
        match state {
            ViewState::Idle => {}
            ViewState::Loading => display::print_loading(),
            ViewState::Error(message) => display::print_error(&message),
            ViewState::Showing(record) => {
                display::print_view(&render_record(&record, typesetter.as_ref()));
            }
        }
    }
}

fn prompt_line(rl: &mut Editor<CliHelper, DefaultHistory>, prompt: &str) -> Result<String> {
    match rl.readline(prompt) {
        Ok(answer) => Ok(answer),
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(String::new()),
        Err(e) => Err(e.into()),
    }
}

fn example(arg: &str) -> Option<&'static str> {
    let index = arg.trim().parse::<usize>().ok()?.checked_sub(1)?;
    EXAMPLES.get(index).copied()
}

fn print_examples() {
    println!("{}", "Examples".bold());
    for (i, problem) in EXAMPLES.iter().enumerate() {
        println!("  {} {}", format!("{}.", i + 1).bright_blue(), problem);
    }
    display::print_note("Run one with /use <N>.");
}

fn print_help() {
    println!("{}", "Commands".bold());
    for (command, description) in [
        ("<problem>", "solve a math problem"),
        ("/history", "list past calculations"),
        ("/show <N|ID>", "show a past calculation"),
        ("/clear", "purge calculation history"),
        ("/examples", "list sample problems"),
        ("/use <N>", "solve a sample problem"),
        ("quit", "leave Axiom"),
    ] {
        println!("  {} {}", format!("{:<14}", command).bright_cyan(), description);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("  quit "), ReplCommand::Quit);
        assert_eq!(parse_command("/show 2"), ReplCommand::Show("2"));
        assert_eq!(parse_command("/show"), ReplCommand::Show(""));
        assert_eq!(parse_command("/use  3 "), ReplCommand::Use("3"));
        assert_eq!(parse_command("/nope"), ReplCommand::Unknown("/nope"));
        assert_eq!(
            parse_command("Solve x^2 - 5x + 6 = 0"),
            ReplCommand::Solve("Solve x^2 - 5x + 6 = 0")
        );
    }

    #[test]
    fn test_problem_text_is_submitted_verbatim() {
        assert_eq!(
            parse_command("  integrate x dx \t"),
            ReplCommand::Solve("  integrate x dx \t")
        );
    }

    #[test]
    fn test_example_lookup_is_one_based() {
        assert_eq!(example("1"), Some(EXAMPLES[0]));
        assert_eq!(example("4"), Some(EXAMPLES[3]));
        assert_eq!(example("0"), None);
        assert_eq!(example("five"), None);
    }
}
