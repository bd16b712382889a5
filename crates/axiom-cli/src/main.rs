use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod context;
mod display;
mod repl;

use context::AppContext;

#[derive(Parser)]
#[command(name = "axiom")]
#[command(about = "Axiom - step-by-step mathematical reasoning in the terminal", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Path to config.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path to the history file
    #[arg(long, global = true, value_name = "PATH", env = "AXIOM_HISTORY_FILE")]
    pub history_file: Option<PathBuf>,

    /// Gemini model to use
    #[arg(long, global = true, value_name = "NAME", env = "AXIOM_MODEL")]
    pub model: Option<String>,

    /// Keep history in memory only
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a single problem and exit
    Solve {
        /// The problem text
        #[arg(required = true, num_args = 1..)]
        problem: Vec<String>,
    },
    /// Inspect or purge the calculation history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List past calculations, newest first
    List,
    /// Show a past calculation by list position or id
    Show {
        #[arg(value_name = "N|ID")]
        entry: String,
    },
    /// Purge all calculations
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let context = AppContext::load(&cli.global)?;

    match cli.command {
        None => repl::run(&context).await?,
        Some(Commands::Solve { problem }) => commands::solve::run(&context, &problem).await?,
        Some(Commands::History { action }) => match action {
            HistoryAction::List => commands::history::list(&context)?,
            HistoryAction::Show { entry } => commands::history::show(&context, &entry)?,
            HistoryAction::Clear { yes } => commands::history::clear(&context, yes)?,
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_solve_joins_words() {
        let cli = Cli::try_parse_from(["axiom", "solve", "x^2", "=", "4", "--ephemeral"]).unwrap();
        assert!(cli.global.ephemeral);
        match cli.command {
            Some(Commands::Solve { problem }) => assert_eq!(problem.join(" "), "x^2 = 4"),
            _ => panic!("expected solve"),
        }
    }

    #[test]
    fn test_history_show_takes_entry() {
        let cli = Cli::try_parse_from(["axiom", "history", "show", "2"]).unwrap();
        match cli.command {
            Some(Commands::History {
                action: HistoryAction::Show { entry },
            }) => assert_eq!(entry, "2"),
            _ => panic!("expected history show"),
        }
    }

    #[test]
    fn test_no_subcommand_starts_repl() {
        let cli = Cli::try_parse_from(["axiom", "-v"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.global.verbose);
    }
}
