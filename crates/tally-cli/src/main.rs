//! # tally-cli
//!
//! Report how a Python package index catalog grew over time.
//!
//! This is the main entry point for the tally CLI tool. It handles command parsing,
//! sets up logging and error handling, and dispatches to the appropriate command handlers.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tally_core::error::{TallyError, TallyResult};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::CommandContext;
use output::errors::ErrorFormatter;

/// Report how a Python package index catalog grew over time
#[derive(Parser)]
#[command(name = "tally", version, about = "Catalog growth reports for Python package indexes")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOptions,
}

/// Options shared by every command
#[derive(clap::Args, Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Package index base URL
    #[arg(long, global = true, value_name = "URL")]
    pub registry: Option<String>,

    /// Metadata requests in flight at once
    #[arg(long, global = true, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Configuration file to use instead of tally.toml discovery
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the whole catalog and print the day-by-day growth report
    Report {
        /// Passes over unresolved packages after the first fetch
        #[arg(long, value_name = "N")]
        retry_passes: Option<u32>,
        /// Pretty-print the JSON report
        #[arg(long)]
        pretty: bool,
    },
    /// Print the earliest upload time of the given packages
    Ctime {
        #[arg(required = true, value_name = "NAME")]
        names: Vec<String>,
    },
    /// List the package names in the catalog
    List {
        /// Only print the number of packages
        #[arg(long)]
        count: bool,
    },
    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.global.verbose);
    setup_panic_handler();

    debug!("Starting tally v{}", env!("CARGO_PKG_VERSION"));

    if let Err(err) = run_cli(cli) {
        error!(error = %err, "command failed");
        eprintln!("{}", ErrorFormatter::new().format_error(&err));
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> TallyResult<()> {
    // Create Tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| TallyError::io("Failed to create async runtime".to_string(), e))?;

    rt.block_on(async {
        let ctx = CommandContext::new(&cli.global).await?;
        commands::dispatch_command(cli.command, &ctx).await
    })
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "tally={level},tally_core={level},tally_registry={level},tally_index={level},tally_config={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("tally encountered an unexpected error: {}", panic_info);
        eprintln!("tally crashed! This is a bug.");
        eprintln!("Please report this at: https://github.com/tally-rs/tally/issues");
        eprintln!("Error: {}", panic_info);
    }));
}
