//! Result files.
//!
//! Layout under the chosen base directory:
//!
//! ```text
//! bench-results/
//!   summary.md
//!   raw/
//!     <target_id>.json
//!     all_results.json
//! ```

use super::BenchmarkResult;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Output directory, relative to the base path.
pub const OUTPUT_DIR: &str = "bench-results";

/// Raw JSON directory, relative to the output directory.
pub const RAW_DIR: &str = "raw";

/// Combined results file name.
pub const ALL_RESULTS_FILE: &str = "all_results.json";

/// Markdown summary file name.
pub const SUMMARY_FILE: &str = "summary.md";

/// Reads and writes result files below one base directory.
#[derive(Debug, Clone)]
pub struct ResultStore {
    output_dir: PathBuf,
    raw_dir: PathBuf,
}

impl ResultStore {
    /// Store rooted at `base_path`.
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        let output_dir = base_path.as_ref().join(OUTPUT_DIR);
        let raw_dir = output_dir.join(RAW_DIR);
        Self { output_dir, raw_dir }
    }

    /// Directory holding the summary.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Directory holding the JSON files.
    pub fn raw_dir(&self) -> &Path {
        &self.raw_dir
    }

    /// Path of the JSON file for `target_id`.
    pub fn result_path(&self, target_id: &str) -> PathBuf {
        self.raw_dir.join(format!("{}.json", sanitize_filename(target_id)))
    }

    /// Write one JSON file per result, the combined file and the summary.
    pub fn write(&self, results: &[BenchmarkResult]) -> io::Result<()> {
        fs::create_dir_all(&self.raw_dir)?;

        for result in results {
            write_json(&self.result_path(&result.target_id), result)?;
        }
        write_json(&self.raw_dir.join(ALL_RESULTS_FILE), &results)?;

        let summary = super::markdown::generate_summary(results);
        fs::write(self.output_dir.join(SUMMARY_FILE), summary)?;

        tracing::info!(
            count = results.len(),
            dir = %self.output_dir.display(),
            "wrote benchmark results"
        );
        Ok(())
    }

    /// All results from the combined file; empty when nothing was written.
    pub fn read_all(&self) -> io::Result<Vec<BenchmarkResult>> {
        let path = self.raw_dir.join(ALL_RESULTS_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        read_json(&path)
    }

    /// One result by target id.
    pub fn read(&self, target_id: &str) -> io::Result<Option<BenchmarkResult>> {
        let path = self.result_path(target_id);
        if !path.exists() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::write(path, json)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> io::Result<T> {
    let json = fs::read_to_string(path)?;
    serde_json::from_str(&json).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Sanitize a string for use as a filename.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
