//! Reclamation pause driver.
//!
//! Populates fresh backends over and over, hands each one to the reclaimer
//! and reports the pause accrued during every phase.

use cachebench::backend::{BackendConfig, BackendKind, HashFunction};
use cachebench::core::run_cycle;
use cachebench::reclaim::CountingAllocator;
use cachebench::{telemetry, Config, PauseSampler, Reclaimer, Report};

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::collections::HashSet;
use std::io::{self, Stdout};
use std::path::PathBuf;
use tracing::{info, warn};

#[global_allocator]
static ALLOC: CountingAllocator = CountingAllocator;

/// Cache reclamation overhead benchmark
#[derive(Parser, Debug)]
#[command(name = "gc-overhead")]
#[command(about = "Measure reclamation pauses caused by populating and discarding caches")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "CACHEBENCH_CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Entries written per population cycle
    #[arg(short, long)]
    entries: Option<u64>,

    /// Bytes per value
    #[arg(long)]
    value_size: Option<usize>,

    /// Population cycles per backend
    #[arg(short, long)]
    repeat: Option<u32>,

    /// Hash function for the backends (default, xxhash)
    #[arg(long)]
    hasher: Option<HashFunction>,

    /// Also measure the concurrent map and the arena cache
    #[arg(long)]
    all_backends: bool,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Enable JSON log format
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,
}

struct Driver<'a> {
    config: &'a Config,
    backend: BackendConfig,
    reclaimer: &'a Reclaimer,
    sampler: PauseSampler<'a>,
    report: Report<Stdout>,
    progress: ProgressBar,
    skipped: HashSet<BackendKind>,
}

impl Driver<'_> {
    /// Run `cycles` population cycles of `kind`.
    ///
    /// A construction error is reported once and every later cycle of that
    /// backend is skipped. Returns whether every cycle ran.
    fn cycles(&mut self, kind: BackendKind, cycles: u32) -> anyhow::Result<bool> {
        if self.skipped.contains(&kind) {
            self.progress.inc(u64::from(cycles));
            return Ok(false);
        }
        self.progress.set_message(kind.as_str());
        for _ in 0..cycles {
            match run_cycle(
                kind,
                &self.backend,
                self.config.entries,
                self.config.value_size,
                self.reclaimer,
            ) {
                Ok(outcome) => {
                    self.report.check(&outcome.check)?;
                    self.report.set_errors(kind.as_str(), outcome.set_errors)?;
                    self.progress.inc(1);
                }
                Err(error) if error.is_measurement_scoped() => {
                    warn!(backend = %kind, error = %error, "skipping backend");
                    self.report.skipped(kind.as_str(), &error)?;
                    self.skipped.insert(kind);
                    return Ok(false);
                }
                Err(error) => return Err(error.into()),
            }
        }
        Ok(true)
    }

    /// Sample the pause since the previous phase and report it.
    fn sample(&mut self, label: &str) -> anyhow::Result<()> {
        let sample = self.sampler.sample();
        if let Err(error) = &sample {
            warn!(label, error = %error, "pause statistics unavailable");
        }
        self.progress.suspend(|| self.report.pause(label, &sample))?;
        Ok(())
    }
}

fn progress_bar(total: u64, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stderr());
    let template = "{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} {msg}";
    let style = ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

/// Measured phases, in run order.
fn phases(all_backends: bool) -> Vec<BackendKind> {
    let mut phases = vec![BackendKind::ShardedTtl, BackendKind::NativeMap];
    if all_backends {
        phases.extend([BackendKind::ConcurrentMap, BackendKind::Arena]);
    }
    phases
}

/// One untimed warm-up cycle per measured backend, native map first.
fn warmup(phases: &[BackendKind]) -> Vec<BackendKind> {
    let mut order = vec![BackendKind::NativeMap];
    order.extend(phases.iter().copied().filter(|kind| *kind != BackendKind::NativeMap));
    order
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    telemetry::init_logging(&args.log_level, args.json_logs)?;

    // Load configuration
    let mut config = Config::load(args.config.as_deref()).context("loading configuration")?;

    // Apply command line overrides
    if let Some(entries) = args.entries {
        config.entries = entries;
    }
    if let Some(value_size) = args.value_size {
        config.value_size = value_size;
    }
    if let Some(repeat) = args.repeat {
        config.repeat = repeat;
    }
    if let Some(hasher) = args.hasher {
        config.hasher = hasher;
    }
    config.validate().context("validating configuration")?;

    info!(
        version = cachebench::VERSION,
        entries = config.entries,
        repeat = config.repeat,
        hasher = %config.hasher,
        "starting gc-overhead"
    );

    let phases = phases(args.all_backends);
    let warmup = warmup(&phases);
    let total = warmup.len() as u64 + u64::from(config.repeat) * phases.len() as u64;

    let reclaimer = Reclaimer::new(config.growth_percent);
    let mut driver = Driver {
        config: &config,
        backend: config.backend(),
        reclaimer: &reclaimer,
        sampler: PauseSampler::new(&reclaimer),
        report: Report::new(io::stdout()),
        progress: progress_bar(total, args.no_progress),
        skipped: HashSet::new(),
    };

    driver.report.header(config.entries, config.repeat)?;
    driver.sample("startup")?;

    for kind in warmup {
        driver.cycles(kind, 1)?;
    }
    driver.sample("warmup")?;

    for kind in phases {
        if driver.cycles(kind, config.repeat)? {
            driver.sample(kind.as_str())?;
        }
    }

    driver.progress.finish_and_clear();
    driver.report.flush()?;
    info!("gc-overhead finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_phases() {
        let phases = phases(false);
        assert_eq!(phases, vec![BackendKind::ShardedTtl, BackendKind::NativeMap]);
        assert_eq!(warmup(&phases), vec![BackendKind::NativeMap, BackendKind::ShardedTtl]);
    }

    #[test]
    fn test_warmup_covers_every_phase() {
        for all_backends in [false, true] {
            let phases = phases(all_backends);
            let warmup = warmup(&phases);
            assert_eq!(warmup.first(), Some(&BackendKind::NativeMap));
            assert_eq!(warmup.len(), phases.len());
            for kind in &phases {
                assert!(warmup.contains(kind), "{kind} has no warm-up cycle");
            }
        }
        assert_eq!(phases(true).len(), 4);
    }
}
