use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

/// Bare-metal target used to prove the library stays `no_std`.
const NO_STD_TARGET: &str = "thumbv7em-none-eabihf";

pub fn run() -> Result<()> {
    println!();
    println!("{}", "🔍 Checking crash-log builds...".cyan().bold());
    println!();

    let total_start = Instant::now();

    // Check 1: no_std, no logging
    cargo_check(
        "crashlog (no_std)",
        &["check", "-p", "crashlog", "--target", NO_STD_TARGET, "--no-default-features"],
    )?;

    // Check 2: no_std with defmt logging and the fault-trap hook
    cargo_check(
        "crashlog (no_std + defmt)",
        &["check", "-p", "crashlog", "--target", NO_STD_TARGET, "--features", "defmt,serde"],
    )?;

    // Check 3: host build, as the xtask and tests use it
    cargo_check(
        "crashlog (host + tracing)",
        &["check", "-p", "crashlog", "--features", "std,tracing,serde"],
    )?;

    // Check 4: API docs, host and bare-metal
    cargo_check(
        "docs (host, all features)",
        &["doc", "-p", "platform", "-p", "crashlog", "--no-deps", "--features", "crashlog/std,crashlog/serde,crashlog/tracing"],
    )?;
    cargo_check(
        "docs (no_std)",
        &["doc", "-p", "crashlog", "--no-deps", "--target", NO_STD_TARGET, "--no-default-features"],
    )?;

    // Check 5: Clippy lints
    println!("{}", "  Running clippy lints...".cyan());
    let clippy_start = Instant::now();

    let clippy_output = Command::new("cargo")
        .args(["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])
        .output()
        .context("Failed to run clippy")?;

    if clippy_output.status.success() {
        println!(
            "{}",
            format!("  ✓ Clippy passed in {:.2}s", clippy_start.elapsed().as_secs_f64()).green()
        );
    } else {
        eprintln!("{}", "  ⚠ Clippy warnings found".yellow().bold());
        eprintln!();
        eprintln!("{}", String::from_utf8_lossy(&clippy_output.stderr));
        // Don't fail on clippy warnings, just show them
    }
    println!();

    // Check 6: Format check
    println!("{}", "  Checking code formatting...".cyan());

    let fmt_output = Command::new("cargo")
        .args(["fmt", "--all", "--check"])
        .output()
        .context("Failed to run cargo fmt")?;

    if fmt_output.status.success() {
        println!("{}", "  ✓ Formatting check passed".green());
    } else {
        eprintln!("{}", "  ⚠ Formatting issues found".yellow().bold());
        eprintln!("     Run 'cargo fmt --all' to fix");
    }
    println!();

    println!(
        "{}",
        format!("✓ All checks completed in {:.2}s", total_start.elapsed().as_secs_f64())
            .green()
            .bold()
    );
    println!();

    Ok(())
}

/// Run one `cargo` invocation, failing the whole check if it fails.
fn cargo_check(label: &str, args: &[&str]) -> Result<()> {
    println!("{}", format!("  Checking {label}...").cyan());
    let start = Instant::now();

    let output = Command::new("cargo")
        .args(args)
        .output()
        .with_context(|| format!("Failed to check {label}"))?;

    if !output.status.success() {
        eprintln!("{}", format!("  ✗ {label} check failed").red().bold());
        eprintln!();
        eprintln!("{}", String::from_utf8_lossy(&output.stderr));
        anyhow::bail!("{label} check failed");
    }

    println!(
        "{}",
        format!("  ✓ {label} passed in {:.2}s", start.elapsed().as_secs_f64()).green()
    );
    println!();
    Ok(())
}
