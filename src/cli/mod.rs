//! CLI module for the suiterun harness
//!
//! ## Commands
//!
//! - `run <FILES...>` - Run every test case the definition files declare, setup phase first
//! - `list <FILES...>` - Show suites, cases, and phase methods without running anything
//!
//! ## Modules
//!
//! - `commands` - Command implementations
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::config::RunConfig;
use crate::definition::CaseCatalog;
use crate::engine::MethodTimer;
use crate::error::HarnessError;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl From<HarnessError> for CliError {
    /// Render the run-level error as a miette diagnostic report.
    fn from(err: HarnessError) -> Self {
        CliError::failure(format!("{:?}", miette::Report::new(err)))
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Two-phase test execution harness
#[derive(Parser, Debug)]
#[command(name = "suiterun")]
#[command(version = VERSION)]
#[command(about = "Run setup methods across all suites, then test methods, reporting in suite order")]
#[command(long_about = "Run setup methods across all suites, then test methods, reporting in suite order.\n\n\
This binary is a demo over the built-in sample catalog: definition files may only name the paths it \
registers (see demos/sample.json). Embed the library and pass your own CaseCatalog to cli::run for real suites.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run every test case declared in the definition files
    Run {
        /// JSON definition files
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,
        /// Result polling interval in milliseconds
        #[arg(long = "poll-interval-ms", value_name = "MS", default_value_t = 100)]
        poll_interval_ms: u64,
        /// Tolerance for methods without a configured timeout (0 = unlimited)
        #[arg(long = "tolerance-ms", value_name = "MS", default_value_t = MethodTimer::DEFAULT_TOLERANCE_MS)]
        tolerance_ms: u64,
        /// Settle methods still running past their tolerance as timeouts
        #[arg(long)]
        watchdog: bool,
        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// List suites, cases, and phase methods without running them
    List {
        /// JSON definition files
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,
    },
}

// ============================================================================
// Entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// functions return `CliResult` and errors are handled here.
pub fn run(catalog: CaseCatalog) {
    let cli = Cli::parse();

    match execute(cli, catalog) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the parsed CLI command.
fn execute(cli: Cli, catalog: CaseCatalog) -> CliResult<ExitCode> {
    match cli.command {
        Command::Run {
            files,
            poll_interval_ms,
            tolerance_ms,
            watchdog,
            verbose,
        } => {
            let config = RunConfig::new()
                .with_poll_interval(Duration::from_millis(poll_interval_ms))
                .with_default_tolerance_ms(tolerance_ms)
                .with_watchdog(watchdog)
                .with_verbose(verbose);
            commands::run_files(files, config, catalog)
        }
        Command::List { files } => commands::list_files(files, &catalog),
    }
}
