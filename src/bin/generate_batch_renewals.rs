//! Generate an `id,duration` CSV of token ids for a batch renewal.
//!
//! Names are read one per line. Each becomes `keccak256(name)` as a uint,
//! paired with the requested duration in seconds (365.25-day years).
//! Repeated ids and names on the exclusion list are skipped and reported.
//!
//! Run with: cargo run --bin generate_batch_renewals -- premint1 -o premint1_batch.csv -d 2.5

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use basename_tools::{
    input::Handle,
    interrupt::Interrupt,
    output::stage_renewals,
    renewal::{duration_seconds, ExclusionSet, RenewalBatch, RenewalReport},
};
use clap::Parser;
use tracing::info;

/// Exclusion list looked up beside the executable when none is given.
const DEFAULT_EXCLUSIONS: &str = "lostnames";

#[derive(Parser, Debug)]
#[command(name = "generate_batch_renewals")]
#[command(about = "Generate CSV file with token ids and duration for premint names")]
struct Args {
    /// Path to the input file containing names (one per line)
    input_file: PathBuf,

    /// Output CSV file path
    #[arg(short, long, default_value = "premint_hashes.csv")]
    output: PathBuf,

    /// Duration in years
    #[arg(short, long, default_value_t = 5.0, value_parser = parse_years)]
    duration: f64,

    /// Names to leave out, one per line (default: `lostnames` beside the executable, if present)
    #[arg(long, conflicts_with = "no_exclusions")]
    exclusions: Option<PathBuf>,

    /// Do not apply any exclusion list
    #[arg(long)]
    no_exclusions: bool,

    /// Write every name, even when its id was already written
    #[arg(long)]
    keep_duplicates: bool,
}

fn parse_years(s: &str) -> std::result::Result<f64, String> {
    let years: f64 = s.parse().map_err(|e| format!("invalid number '{}': {}", s, e))?;
    if !years.is_finite() || years < 0.0 {
        return Err(format!("duration must be a non-negative number of years, got {}", s));
    }
    Ok(years)
}

fn default_exclusions() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let path = exe.parent()?.join(DEFAULT_EXCLUSIONS);
    path.exists().then_some(path)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let interrupt = Interrupt::new();
    interrupt
        .listen()
        .context("Failed to install Ctrl-C handler")?;

    tokio::task::spawn_blocking(move || generate(args, interrupt)).await?
}

fn generate(args: Args, interrupt: Interrupt) -> Result<()> {
    if !args.input_file.exists() {
        bail!("Input file '{}' not found", args.input_file.display());
    }

    let duration = duration_seconds(args.duration);
    let mut batch = RenewalBatch::new(duration)
        .with_dedupe(!args.keep_duplicates)
        .with_interrupt(interrupt.clone());

    let exclusions = if args.no_exclusions {
        None
    } else {
        args.exclusions.clone().or_else(default_exclusions)
    };
    if let Some(path) = &exclusions {
        let set = ExclusionSet::load(path)
            .with_context(|| format!("Failed to load exclusion list {}", path.display()))?;
        batch = batch.with_exclusions(set);
    } else {
        info!("No exclusion list in use");
    }

    info!("Duration: {} years ({} seconds)", args.duration, duration);
    info!("Input file: {}", args.input_file.display());
    info!("Output file: {}", args.output.display());

    let report = batch
        .run(&args.input_file)
        .context("Batch stopped, no output written")?;

    let staged = stage_renewals(&args.output, &report.entries)
        .with_context(|| format!("Error writing to {}", args.output.display()))?;
    // Last chance to abort; dropping the staged file removes it
    interrupt.check()?;
    staged
        .commit()
        .with_context(|| format!("Error writing to {}", args.output.display()))?;

    print_report(&args.output, &report, exclusions.as_deref());
    Ok(())
}

fn print_listing(title: &str, handles: &[Handle], none: &str) {
    if handles.is_empty() {
        println!("{}", none);
        return;
    }
    println!("\n{}:", title);
    for handle in handles {
        println!("  Line {}: {}", handle.line, handle.text);
    }
}

fn print_report(output: &Path, report: &RenewalReport, exclusions: Option<&Path>) {
    println!("CSV file generated: {}", output.display());
    println!("Total names processed: {}", report.total);
    println!("Unique entries written: {}", report.entries.len());
    println!("Duplicates found and skipped: {}", report.duplicates.len());
    println!("Excluded names found and skipped: {}", report.excluded.len());

    print_listing("Duplicate names found", &report.duplicates, "No duplicates found.");
    let title = match exclusions {
        Some(path) => format!("Excluded names found (from {})", path.display()),
        None => "Excluded names found".to_string(),
    };
    print_listing(&title, &report.excluded, "No excluded names found.");
}
