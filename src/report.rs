//! Plain-text result lines.
//!
//! The driver writes its results to stdout through a [`Report`]; tests hand
//! it a `Vec<u8>`.

use crate::check::CheckOutcome;
use crate::core::TrialReport;
use crate::error::{Error, Result};
use crate::reclaim::PauseSample;

use std::io::Write;

/// Line-oriented writer for benchmark results.
pub struct Report<W: Write> {
    out: W,
}

impl<W: Write> Report<W> {
    /// Wrap `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Entry and repeat counts.
    pub fn header(&mut self, entries: u64, repeat: u32) -> Result<()> {
        writeln!(self.out, "Number of entries:  {entries}")?;
        writeln!(self.out, "Number of repeats:  {repeat}")?;
        Ok(())
    }

    /// Pause observed for `label`, or why it could not be read.
    pub fn pause(&mut self, label: &str, sample: &Result<PauseSample>) -> Result<()> {
        match sample {
            Ok(sample) => {
                write!(
                    self.out,
                    "Pause for {label}:  {:?} ({} collections",
                    sample.pause, sample.collections
                )?;
                if let (Some(allocated), Some(live)) = (sample.allocated_bytes, sample.live_bytes) {
                    write!(self.out, ", allocated {allocated} B, live {live} B")?;
                }
                writeln!(self.out, ")")?;
            }
            Err(error) => writeln!(self.out, "Pause for {label}: unavailable ({error})")?,
        }
        Ok(())
    }

    /// Diagnostic for a failed read-back; nothing on a match.
    pub fn check(&mut self, outcome: &CheckOutcome) -> Result<()> {
        if let Some(diagnostic) = outcome.diagnostic() {
            writeln!(self.out, "{diagnostic}")?;
        }
        Ok(())
    }

    /// A backend left out of the run.
    pub fn skipped(&mut self, backend: &str, error: &Error) -> Result<()> {
        writeln!(self.out, "Skipping {backend}: {error}")?;
        Ok(())
    }

    /// Rejected writes seen while populating `backend`.
    pub fn set_errors(&mut self, backend: &str, count: u64) -> Result<()> {
        if count > 0 {
            writeln!(self.out, "Set errors for {backend}:  {count}")?;
        }
        Ok(())
    }

    /// One timed trial.
    pub fn trial(&mut self, report: &TrialReport) -> Result<()> {
        writeln!(
            self.out,
            "{}/{} {} {}: {} ops, {:.1} ns/op, {:.0} ops/s, hits {}, misses {}, errors {}",
            report.backend,
            report.hasher,
            report.operation,
            report.concurrency,
            report.operations,
            report.ns_per_op(),
            report.throughput(),
            report.tally.hits,
            report.tally.misses,
            report.tally.set_errors + report.tally.get_errors,
        )?;
        Ok(())
    }

    /// Flush the writer.
    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendKind, HashFunction};
    use crate::core::{Concurrency, Operation};
    use crate::telemetry::TrialTally;
    use std::time::Duration;

    fn render(f: impl FnOnce(&mut Report<Vec<u8>>) -> Result<()>) -> String {
        let mut report = Report::new(Vec::new());
        f(&mut report).unwrap();
        String::from_utf8(report.into_inner()).unwrap()
    }

    #[test]
    fn test_header() {
        let text = render(|r| r.header(20_000_000, 50));
        assert_eq!(text, "Number of entries:  20000000\nNumber of repeats:  50\n");
    }

    #[test]
    fn test_pause_with_heap() {
        let sample = PauseSample {
            pause: Duration::from_millis(3),
            collections: 2,
            allocated_bytes: Some(1024),
            live_bytes: Some(512),
        };
        let text = render(|r| r.pause("warmup", &Ok(sample)));
        assert_eq!(
            text,
            "Pause for warmup:  3ms (2 collections, allocated 1024 B, live 512 B)\n"
        );
    }

    #[test]
    fn test_pause_without_heap() {
        let text = render(|r| r.pause("startup", &Ok(PauseSample::default())));
        assert_eq!(text, "Pause for startup:  0ns (0 collections)\n");
    }

    #[test]
    fn test_pause_unavailable() {
        let text = render(|r| r.pause("native_map", &Err(Error::stats_unavailable("offline"))));
        assert!(text.starts_with("Pause for native_map: unavailable ("));
        assert!(text.contains("offline"));
    }

    #[test]
    fn test_check_lines() {
        assert_eq!(render(|r| r.check(&CheckOutcome::Match)), "");
        assert_eq!(
            render(|r| r.check(&CheckOutcome::Missing)),
            "Missing first element\n"
        );
        let text = render(|r| {
            r.check(&CheckOutcome::Failed {
                error: "boom".into(),
            })
        });
        assert_eq!(text, "Error in get:  boom\n");
    }

    #[test]
    fn test_skipped_and_set_errors() {
        let error = Error::construction("concurrent_map", "shard amount must be a power of two");
        let text = render(|r| {
            r.skipped("concurrent_map", &error)?;
            r.set_errors("arena", 0)?;
            r.set_errors("arena", 3)
        });
        assert!(text.starts_with("Skipping concurrent_map: "));
        assert!(text.ends_with("Set errors for arena:  3\n"));
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn test_trial_line() {
        let report = TrialReport {
            backend: BackendKind::ConcurrentMap,
            hasher: HashFunction::XxHash,
            operation: Operation::Get,
            concurrency: Concurrency::Parallel { workers: 4 },
            operations: 1_000,
            elapsed: Duration::from_micros(100),
            tally: TrialTally {
                hits: 990,
                misses: 10,
                set_errors: 0,
                get_errors: 0,
            },
        };
        let text = render(|r| r.trial(&report));
        assert_eq!(
            text,
            "concurrent_map/xxhash get parallel(4): 1000 ops, 100.0 ns/op, 10000000 ops/s, hits 990, misses 10, errors 0\n"
        );
    }
}
