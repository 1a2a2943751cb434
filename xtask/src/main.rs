// Desktop/tooling crate: unwrap/expect/panic acceptable in non-embedded code.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod check;
mod crash_logs;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Crash-log development tasks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the library and its docs build for the embedded target and the host
    Check,
    /// Run the test suite across the crash-log feature matrix
    Test {
        /// Stop at the first failing configuration
        #[arg(long)]
        fail_fast: bool,
        /// Only run configurations whose name contains this
        #[arg(long)]
        only: Option<String>,
    },
    /// Inspect crash logs in a local copy of the device file system
    Crashlog(crash_logs::CrashLogArgs),
}

fn main() -> Result<()> {
    // RUST_LOG=debug shows the resolver's directory scans.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check => check::run(),
        Commands::Test { fail_fast, only } => test::run(fail_fast, only.as_deref()),
        Commands::Crashlog(args) => crash_logs::run(args),
    }
}
