//! End-of-batch report.

use indicatif::HumanBytes;

use civitdl_core::{BatchSummary, ItemOutcome, PerItemResult};

/// One report line for an item.
pub fn format_result(result: &PerItemResult) -> String {
    match &result.outcome {
        ItemOutcome::Success(artifact) if artifact.bytes_written == artifact.final_size => {
            format!(
                "✓ {} → {} ({})",
                result.identifier,
                artifact.path.display(),
                HumanBytes(artifact.final_size)
            )
        }
        ItemOutcome::Success(artifact) => format!(
            "✓ {} → {} ({}, {} new)",
            result.identifier,
            artifact.path.display(),
            HumanBytes(artifact.final_size),
            HumanBytes(artifact.bytes_written)
        ),
        ItemOutcome::Failure(err) => {
            format!("✗ {} [{}] {err}", result.identifier, err.stage())
        }
    }
}

/// The summary line.
pub fn format_summary(summary: &BatchSummary) -> String {
    let mut line = format!(
        "{} succeeded, {} failed",
        summary.succeeded, summary.failed
    );
    if summary.cancelled > 0 {
        line.push_str(&format!(", {} cancelled", summary.cancelled));
    }
    line
}

/// Print every result and the summary to stdout.
pub fn print_report(results: &[PerItemResult]) -> BatchSummary {
    let summary = BatchSummary::from_results(results);
    println!();
    for result in results {
        println!("{}", format_result(result));
    }
    println!("{}", format_summary(&summary));
    summary
}
