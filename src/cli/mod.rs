//! CLI for runway
//!
//! - `check`: Parse, hydrate and validate a pipeline file
//! - `run`: Execute a pipeline file in containers
//! - `completions`: Generate shell completions

pub mod check;
pub mod completions;
pub mod run;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use runway::infrastructure::{Settings, init_logging};
use std::path::PathBuf;
use std::process::ExitCode;

/// CLI arguments for runway
#[derive(Parser, Debug)]
#[command(name = "runway")]
#[command(author, version, about = "Run CI pipelines in ephemeral containers", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a pipeline file without running it
    Check {
        /// Pipeline file to validate
        file: PathBuf,
    },

    /// Run a pipeline file
    Run {
        /// Pipeline file to run
        file: PathBuf,
        /// Print the run report as JSON when done
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: ShellArg,
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ShellArg {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Build the CLI command for completion generation
pub fn build_cli() -> clap::Command {
    Args::command()
}

/// Parse and execute CLI arguments
pub fn run() -> Result<ExitCode> {
    let args = Args::parse();
    let settings = Settings::from_env().context("Invalid runway environment settings")?;
    init_logging(&settings.log_level);

    match args.command {
        Command::Check { file } => {
            check::check_pipeline(&file)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Run { file, json } => run::run_pipeline(&file, json, &settings),
        Command::Completions { shell, output } => {
            use clap_complete::Shell;

            let shell_enum = match shell {
                ShellArg::Bash => Shell::Bash,
                ShellArg::Zsh => Shell::Zsh,
                ShellArg::Fish => Shell::Fish,
                ShellArg::PowerShell => Shell::PowerShell,
            };

            let completions = completions::generate_completions(shell_enum)?;

            if let Some(output_path) = output {
                completions::save_completions(&completions, &output_path)?;
            } else {
                println!("{completions}");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
