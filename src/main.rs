mod commands;
mod watch;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use plaintest::diagnostics;
use plaintest::error::Error;
use plaintest::report::OutputFormat;

#[derive(Parser)]
#[command(name = "plaintest", version, about = "Link markdown test cases to pytest tests")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new case document under the next free identifier
    Add {
        /// Case title, e.g. "user can reset password"
        title: String,
    },
    /// Report covered, uncovered, and dangling cases (exit 1 on gaps)
    Check {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Create the test-cases directory
    Init,
    /// Show which tests link to which case identifiers
    Linkage {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// List documented cases
    List {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Re-run check whenever case documents or test files change
    Watch {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Add { title } => commands::add(&title).map(|()| return ExitCode::SUCCESS),
        Commands::Check { format } => commands::check(format),
        Commands::Init => commands::init().map(|()| return ExitCode::SUCCESS),
        Commands::Linkage { format } => commands::linkage(format).map(|()| return ExitCode::SUCCESS),
        Commands::List { format } => commands::list(format).map(|()| return ExitCode::SUCCESS),
        Commands::Watch { format } => watch::run(format),
    };

    return match result {
        Ok(code) => code,
        Err(e) => exit_with_error(&e),
    };
}

/// Print a structured diagnostic and map the error to exit code 2.
fn exit_with_error(e: &Error) -> ExitCode {
    diagnostics::print_error(e);
    return ExitCode::from(2);
}
