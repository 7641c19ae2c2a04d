//! CLI for the gradecase harness
//!
//! ## Commands
//!
//! - `list [MODULE]` - Discover and print the test cases of a registered module
//! - `run [MODULE]` - Run the discovered cases, optionally with substitutions, and report failures
//!
//! The binary registers the demo catalog (`example_tests`, `buggy_function`, `correct_function`) on the
//! process-wide registry before dispatching.
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
pub mod report;

use std::fmt;
use std::process;

use clap::{Args, Parser, Subcommand};

use crate::harness::DiscoveryOptions;

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

    /// Render a diagnostic with miette's report handler.
    pub fn diagnostic(err: impl miette::Diagnostic + Send + Sync + 'static) -> Self {
        Self::failure(format!("{:?}", miette::Report::new(err)))
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

/// Discover, run and grade test cases
#[derive(Parser, Debug)]
#[command(name = "gradecase")]
#[command(version = VERSION)]
#[command(about = "Discover, run and grade test cases", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the test cases discovered in a module
    List {
        #[command(flatten)]
        discovery: DiscoveryArgs,
    },

    /// Run the test cases discovered in a module
    Run {
        #[command(flatten)]
        discovery: DiscoveryArgs,
        /// Route calls through TARGET (module.function) to REPLACEMENT (module.function)
        #[arg(long = "mock", value_name = "TARGET=REPLACEMENT", value_parser = parse_pair)]
        mock: Option<(String, String)>,
        /// Register module REPLACEMENT under the name TARGET for each run
        #[arg(long = "replace-module", value_name = "TARGET=REPLACEMENT", value_parser = parse_pair)]
        replace_module: Option<(String, String)>,
        /// Fail any case running longer than SECS seconds
        #[arg(long, value_name = "SECS", value_parser = parse_seconds)]
        timeout: Option<f64>,
        /// Only run cases whose name contains EXPR
        #[arg(short = 'k', value_name = "EXPR")]
        filter: Option<String>,
        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

/// Which module to discover and which conventions to accept.
#[derive(Args, Debug, Clone)]
pub struct DiscoveryArgs {
    /// Registered module to discover
    #[arg(value_name = "MODULE", default_value = crate::demo::EXAMPLE_TESTS)]
    pub module: String,
    /// Include methods of framework-native test-case classes
    #[arg(long)]
    pub native: bool,
    /// Include plain test functions and plain test classes
    #[arg(long)]
    pub plain: bool,
}

impl DiscoveryArgs {
    /// Neither flag means both conventions.
    pub fn options(&self) -> DiscoveryOptions {
        if !self.native && !self.plain {
            DiscoveryOptions::all()
        } else {
            DiscoveryOptions::new(self.native, self.plain)
        }
    }
}

fn parse_pair(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((target, replacement)) if !target.is_empty() && !replacement.is_empty() => {
            Ok((target.to_string(), replacement.to_string()))
        }
        _ => Err(format!("expected TARGET=REPLACEMENT, got '{value}'")),
    }
}

fn parse_seconds(value: &str) -> Result<f64, String> {
    let secs: f64 = value.parse().map_err(|_| format!("'{value}' is not a number of seconds"))?;
    if secs.is_finite() && secs > 0.0 {
        Ok(secs)
    } else {
        Err(format!("timeout must be a positive number of seconds, got {value}"))
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
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

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    let registry = crate::runtime::Registry::global();
    crate::demo::install(&registry);

    match cli.command {
        Command::List { discovery } => commands::list_cases(&registry, &discovery),
        Command::Run {
            discovery,
            mock,
            replace_module,
            timeout,
            filter,
            verbose,
        } => commands::run_cases(
            &registry,
            &commands::RunRequest {
                discovery,
                mock,
                replace_module,
                timeout,
                filter,
                verbose,
            },
        ),
    }
}

// ============================================================================
// Tests
// ============================================================================
