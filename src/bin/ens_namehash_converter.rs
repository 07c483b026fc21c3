//! Convert basename handles from a CSV export into registry namehashes.
//!
//! Each handle gets `.base.eth` appended before hashing (`john` becomes
//! `john.base.eth`). Unless `--no-validation` is given, every node is
//! checked against the Registry contract and unowned nodes are left out.
//!
//! Configuration (environment or `.env`):
//! - BASE_RPC_URL: RPC endpoint
//! - REGISTRY_ADDR: Registry contract address
//! - REGISTRY_ABI_PATH: Foundry artifact (default out/Registry.sol/Registry.json)
//! - REGISTRY_LOOKUP_TIMEOUT_SECS: per-call timeout (default 10)
//!
//! Run with: cargo run --bin ens_namehash_converter -- [input_csv] [output_csv] [--no-validation]

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use basename_tools::{
    config::RegistryConfig,
    converter::{ConversionReport, Converter},
    hash::DEFAULT_SUFFIX,
    input::read_csv_handles,
    interrupt::Interrupt,
    output::stage_nodes,
    registry::{ContractInterface, LookupFailurePolicy, RegistryClient, RegistryFilter},
};
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "ens_namehash_converter")]
#[command(about = "Convert basename handles to ENS namehashes")]
struct Args {
    /// CSV file with handles in the first column
    #[arg(default_value = "Basenames.csv")]
    input: PathBuf,

    /// Where to write the `node` CSV
    #[arg(default_value = "namehashes_output.csv")]
    output: PathBuf,

    /// Skip registry validation and write every namehash
    #[arg(long)]
    no_validation: bool,

    /// Parent name appended to every handle
    #[arg(long, default_value = DEFAULT_SUFFIX)]
    suffix: String,

    /// How to treat rows whose owner lookup fails
    #[arg(long, value_enum, default_value_t = LookupFailurePolicy::Retain)]
    on_lookup_failure: LookupFailurePolicy,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let interrupt = Interrupt::new();
    interrupt
        .listen()
        .context("Failed to install Ctrl-C handler")?;

    run(args, interrupt).await
}

async fn run(args: Args, interrupt: Interrupt) -> Result<()> {
    let validate = !args.no_validation;

    info!("Input file: {}", args.input.display());
    info!("Output file: {}", args.output.display());
    info!("Each handle will have '.{}' appended before namehashing", args.suffix);
    if validate {
        info!("Registry validation: ENABLED");
    } else {
        info!("Registry validation: DISABLED");
    }

    if !args.input.exists() {
        bail!("Input file '{}' does not exist", args.input.display());
    }

    // Everything validation needs is resolved before any row is read
    let mut filter = if validate {
        let config = RegistryConfig::from_env()
            .context("Registry validation requested (use --no-validation to skip)")?;
        let interface = ContractInterface::from_artifact(&config.abi_path)?;
        let client = RegistryClient::connect(&config, &interface)
            .await
            .context("Registry validation failed - cannot proceed without validation. Use --no-validation to process anyway")?;
        Some(RegistryFilter::new(client, args.on_lookup_failure))
    } else {
        None
    };
    interrupt.check()?;

    info!("Step 1: Reading names from CSV...");
    let input = args.input.clone();
    let names = tokio::task::spawn_blocking(move || read_csv_handles(&input)).await??;
    info!("Found {} valid names", names.handles.len());
    interrupt.check()?;

    let counts = RowCounts {
        rows: names.total_rows(),
        empty: names.empty_rows,
        malformed: names.malformed_rows,
    };
    let handles = names.handles;

    info!("Step 2: Converting names to namehashes...");
    let converter = Converter::new(args.suffix.as_str()).with_interrupt(interrupt.clone());
    let report = match filter.as_mut() {
        Some(filter) => converter.convert_validated(&handles, filter).await,
        None => tokio::task::spawn_blocking(move || converter.convert(&handles)).await?,
    }
    .context("Conversion stopped, no output written")?;

    info!("Step 3: Writing results to CSV...");
    let staged = stage_nodes(&args.output, &report.nodes)
        .with_context(|| format!("Error writing to {}", args.output.display()))?;
    // Last chance to abort; dropping the staged file removes it
    interrupt.check()?;
    staged
        .commit()
        .with_context(|| format!("Error writing to {}", args.output.display()))?;

    print_summary(&args, &counts, &report);
    Ok(())
}

struct RowCounts {
    rows: usize,
    empty: usize,
    malformed: usize,
}

fn print_summary(args: &Args, counts: &RowCounts, report: &ConversionReport) {
    println!("{}", "=".repeat(50));
    println!("Conversion completed successfully!");
    println!("Rows read:              {}", counts.rows);
    if counts.empty > 0 {
        println!("Empty rows skipped:     {}", counts.empty);
    }
    if counts.malformed > 0 {
        println!("Malformed rows skipped: {}", counts.malformed);
    }

    if report.validated {
        println!("Valid namehashes:       {}", report.nodes.len());
        if !report.unregistered.is_empty() {
            println!(
                "Unregistered basenames: {} (excluded from output)",
                report.unregistered.len()
            );
        }
        if !report.unverified.is_empty() {
            let handling = match report.policy {
                LookupFailurePolicy::Exclude => "excluded from output",
                _ => "kept in output, owner unverified",
            };
            println!(
                "Lookup failures:        {} ({})",
                report.unverified.len(),
                handling
            );
            for flagged in &report.unverified {
                println!(
                    "  Line {}: '{}' -> {}",
                    flagged.handle.line, flagged.handle.text, flagged.full_name
                );
            }
        }
    } else {
        println!(
            "Generated namehashes:   {} (no validation performed)",
            report.nodes.len()
        );
    }

    println!("Results written to: {}", args.output.display());
}
