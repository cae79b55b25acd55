//! Markdown summary of a benchmark run.

use super::BenchmarkResult;
use std::fmt::Write;

fn cell(result: &BenchmarkResult, key: &str, precision: usize) -> String {
    result
        .metrics
        .get(key)
        .and_then(|v| v.as_f64())
        .map(|v| format!("{:.*}", precision, v))
        .unwrap_or_else(|| "-".to_string())
}

/// Render `results` as a markdown report.
///
/// Operation targets and pause targets get separate tables; failures are
/// listed with their error at the end.
pub fn generate_summary(results: &[BenchmarkResult]) -> String {
    let mut out = String::new();
    let (pauses, operations): (Vec<&BenchmarkResult>, Vec<&BenchmarkResult>) = results
        .iter()
        .filter(|r| r.is_success())
        .partition(|r| r.target_id.starts_with("pause_"));
    let failed: Vec<&BenchmarkResult> = results.iter().filter(|r| !r.is_success()).collect();

    let _ = writeln!(out, "# cachebench results\n");
    let _ = writeln!(
        out,
        "{} targets, {} failed\n",
        results.len(),
        failed.len()
    );

    if !operations.is_empty() {
        let _ = writeln!(out, "## Cache operations\n");
        let _ = writeln!(out, "| Target | ns/op | ops/s | mean ms | p95 ms | hits | misses |");
        let _ = writeln!(out, "|---|---:|---:|---:|---:|---:|---:|");
        for result in operations {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} | {} | {} |",
                result.target_id,
                cell(result, "ns_per_op", 1),
                cell(result, "throughput", 0),
                cell(result, "mean_ms", 3),
                cell(result, "p95_ms", 3),
                cell(result, "hits", 0),
                cell(result, "misses", 0),
            );
        }
        out.push('\n');
    }

    if !pauses.is_empty() {
        let _ = writeln!(out, "## Reclamation pauses\n");
        let _ = writeln!(out, "| Target | total ms | mean ms | max ms | populate ms |");
        let _ = writeln!(out, "|---|---:|---:|---:|---:|");
        for result in pauses {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} |",
                result.target_id,
                cell(result, "duration_ms", 3),
                cell(result, "mean_ms", 3),
                cell(result, "max_ms", 3),
                cell(result, "populate_ms", 1),
            );
        }
        out.push('\n');
    }

    if !failed.is_empty() {
        let _ = writeln!(out, "## Failures\n");
        for result in failed {
            let error = result
                .metrics
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error");
            let _ = writeln!(out, "- `{}`: {}", result.target_id, error);
        }
    }

    out
}
