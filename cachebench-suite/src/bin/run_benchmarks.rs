//! cachebench Benchmark Runner CLI
//!
//! Runs the registered benchmark targets and writes results to the standard
//! output directories.
//!
//! Usage:
//!   run_benchmarks [OPTIONS]
//!
//! Options:
//!   -o, --output <DIR>      Base directory for results (default: .)
//!   -f, --filter <PATTERN>  Only run benchmarks whose id contains pattern
//!   -v, --verbose           Enable verbose output
//!   --json                  Output results as JSON to stdout
//!   --no-write              Don't write results to files
//!   --list                  List targets without running them

use cachebench::reclaim::CountingAllocator;
use cachebench::telemetry;
use cachebench_suite::adapters::all_targets;
use cachebench_suite::benchmarks::{self, io::ResultStore};

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[global_allocator]
static ALLOC: CountingAllocator = CountingAllocator;

/// cachebench Benchmark Runner
#[derive(Parser, Debug)]
#[command(name = "run_benchmarks")]
#[command(version)]
#[command(about = "Run cachebench benchmark targets and generate reports")]
struct Args {
    /// Base directory for benchmark results
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Only run benchmarks whose id contains this pattern
    #[arg(short, long)]
    filter: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output results as JSON to stdout
    #[arg(long)]
    json: bool,

    /// Don't write results to files
    #[arg(long)]
    no_write: bool,

    /// List available benchmarks without running them
    #[arg(long)]
    list: bool,

    /// Enable JSON log format
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { "debug" } else { "info" };
    telemetry::init_logging(level, args.json_logs)?;

    let targets = all_targets();

    // Handle --list flag
    if args.list {
        println!("Available benchmark targets:\n");
        for target in &targets {
            println!("  {} - {}", target.id(), target.description());
        }
        return Ok(());
    }

    // Get targets, optionally filtering
    let targets: Vec<_> = match &args.filter {
        Some(pattern) => targets
            .into_iter()
            .filter(|t| t.id().contains(pattern.as_str()))
            .collect(),
        None => targets,
    };

    if targets.is_empty() {
        eprintln!("No benchmarks match the filter pattern");
        return Ok(());
    }

    info!("Running {} benchmarks", targets.len());
    let results = benchmarks::run_targets(&targets).await;

    // Output results
    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        println!("\nResults Summary:");
        println!("{:-<80}", "");
        println!(
            "{:<36} {:>12} {:>16} {:>10}",
            "Target", "ns/op", "Throughput", "Status"
        );
        println!("{:-<80}", "");

        for result in &results {
            let ns_per_op = result
                .ns_per_op()
                .or_else(|| result.duration_ms())
                .map(|d| format!("{:.2}", d))
                .unwrap_or_else(|| "N/A".to_string());

            let throughput = result
                .throughput()
                .map(|t| format!("{:.0}", t))
                .unwrap_or_else(|| "N/A".to_string());

            let status = if result.is_success() { "OK" } else { "FAIL" };

            println!(
                "{:<36} {:>12} {:>16} {:>10}",
                result.target_id, ns_per_op, throughput, status
            );
        }

        println!("{:-<80}\n", "");
    }

    // Write results to files
    if !args.no_write {
        let store = ResultStore::new(&args.output);
        store.write(&results)?;
        info!(
            summary = %store.output_dir().display(),
            raw = %store.raw_dir().display(),
            "results written"
        );
    }

    // Exit with error code if any benchmarks failed
    let failed_count = results.iter().filter(|r| !r.is_success()).count();
    if failed_count > 0 {
        eprintln!("\n{} benchmark(s) failed", failed_count);
        std::process::exit(1);
    }

    Ok(())
}
