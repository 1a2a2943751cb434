//! xtask crashlog: inspect crash logs in a local directory.
//!
//! Point `--root` at a copy of the device's file system (a mounted SD card
//! or an unpacked flash image) and use the same `CrashLog` the firmware
//! uses to list, print, or remove the logs.

use std::io::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use crashlog::{CrashLog, FaultInfo, FaultRegisters, FileRef, NamingConfig, StackDump};
use platform::storage_local::LocalFileStorage;

#[derive(Args)]
pub struct CrashLogArgs {
    /// Host directory standing in for the volume root (default: $CRASHLOG_ROOT)
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    /// Crash-log directory on the volume (default: "/")
    #[arg(long, global = true, default_value = "")]
    directory: String,
    /// File name prefix (default: "crashLog-")
    #[arg(long, global = true, default_value = "")]
    prefix: String,
    /// File name suffix (default: ".log")
    #[arg(long, global = true, default_value = "")]
    suffix: String,
    #[command(subcommand)]
    command: CrashLogCommand,
}

#[derive(Subcommand)]
pub enum CrashLogCommand {
    /// List crash logs in directory order
    List,
    /// Print the number of crash logs
    Count,
    /// Show the next and most recent crash-log paths
    Paths,
    /// Copy a crash log to stdout
    Print {
        /// Crash-log number (0 = most recent) or full path on the volume
        #[arg(default_value = "0")]
        file: String,
    },
    /// Delete a crash log
    Rm {
        /// Crash-log number (0 = most recent)
        number: u32,
    },
    /// Append a synthetic fault record to the next crash log
    Simulate {
        /// Uptime reported in the record
        #[arg(long, default_value_t = 1234)]
        uptime_ms: u32,
        /// Restart reason code
        #[arg(long, default_value_t = 2)]
        reason: u32,
        /// Exception cause code
        #[arg(long, default_value_t = 29)]
        cause: u32,
        /// Bytes of fake stack to dump
        #[arg(long, default_value_t = 64)]
        stack_bytes: usize,
    },
}

/// Entry point called from main.rs
pub fn run(args: CrashLogArgs) -> Result<()> {
    let storage = match &args.root {
        Some(root) => LocalFileStorage::new(root),
        None => LocalFileStorage::from_env()
            .context("no volume root: pass --root or set CRASHLOG_ROOT")?,
    };
    let root = storage.root().to_path_buf();
    let config = NamingConfig::new(&args.directory, &args.prefix, &args.suffix)
        .map_err(|e| anyhow::anyhow!("invalid naming: {e}"))?;
    let mut log = CrashLog::with_config(storage, config)
        .map_err(|e| anyhow::anyhow!("cannot open {}: {e}", root.display()))?;

    match args.command {
        CrashLogCommand::List => list(&mut log),
        CrashLogCommand::Count => {
            println!("{}", log.count());
            Ok(())
        }
        CrashLogCommand::Paths => {
            println!("next: {}", log.crash_log_path());
            println!("last: {}", log.last_crash_log_path().unwrap_or("(none)"));
            Ok(())
        }
        CrashLogCommand::Print { file } => print(&mut log, &file),
        CrashLogCommand::Rm { number } => {
            log.remove_file(number)
                .map_err(|e| anyhow::anyhow!("cannot remove crash log {number}: {e}"))?;
            println!("{}", "✓ Removed".green());
            Ok(())
        }
        CrashLogCommand::Simulate { uptime_ms, reason, cause, stack_bytes } => {
            simulate(&mut log, uptime_ms, reason, cause, stack_bytes);
            Ok(())
        }
    }
}

fn list(log: &mut CrashLog<LocalFileStorage>) -> Result<()> {
    let mut found = 0usize;
    log.for_each_match(|number, path| {
        found = found.saturating_add(1);
        println!("{:>6}  {}", number.to_string().cyan(), path);
    });
    if found == 0 {
        println!("{}", "No crash logs".dimmed());
    }
    Ok(())
}

fn print(log: &mut CrashLog<LocalFileStorage>, file: &str) -> Result<()> {
    let target = match file.parse::<u32>() {
        Ok(number) => FileRef::Number(number),
        Err(_) => FileRef::Path(file),
    };
    let mut out = Stdout(std::io::stdout().lock());
    log.print_file(target, &mut out)
        .map_err(|e| anyhow::anyhow!("cannot print crash log {file}: {e}"))?;
    out.0.flush()?;
    Ok(())
}

fn simulate(
    log: &mut CrashLog<LocalFileStorage>,
    uptime_ms: u32,
    reason: u32,
    cause: u32,
    stack_bytes: usize,
) {
    let path = log.crash_log_path().to_owned();
    #[allow(clippy::cast_possible_truncation)]
    let stack: Vec<u8> = (0..stack_bytes).map(|i| i as u8).collect();
    let fault = FaultInfo {
        uptime_ms,
        restart_reason: reason,
        exception_cause: cause,
        registers: FaultRegisters { epc1: 0x4020_1234, excvaddr: 0x0000_0010, ..FaultRegisters::default() },
    };
    log.capture(&fault, &StackDump::new(0x3fff_f000, &stack));
    println!("{}", format!("✓ Fault record appended to {path}").green());
}

/// `embedded_io::Write` over the host's stdout.
struct Stdout<'a>(std::io::StdoutLock<'a>);

impl embedded_io::ErrorType for Stdout<'_> {
    type Error = embedded_io::ErrorKind;
}

impl embedded_io::Write for Stdout<'_> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.0.write(buf).map_err(|_| embedded_io::ErrorKind::Other)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.0.flush().map_err(|_| embedded_io::ErrorKind::Other)
    }
}
