use std::path::Path;

use anyhow::{Context, Result};
use probe_core::RunReport;
use tracing::info;

/// Write the report as pretty-printed JSON.
pub async fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize run report")?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write results to {:?}", path))?;
    info!(path = ?path, "Results saved");
    Ok(())
}

/// Log a per-case and aggregate summary of a run.
pub fn log_summary(report: &RunReport) {
    info!("TEST SUMMARY");

    for result in &report.results {
        let status = if result.success { "PASS" } else { "FAIL" };
        info!(
            status,
            case = %result.test_name,
            size_kb = %format!("{:.2}", result.file_size_kb),
            "case finished"
        );
        if result.success {
            info!(
                elapsed_secs = %format!("{:.2}", result.elapsed_time_seconds.unwrap_or(0.0)),
                transcript_chars = result.transcript_length.unwrap_or(0),
                "  timing"
            );
        } else {
            info!(
                error = result.error.as_deref().unwrap_or("Unknown error"),
                "  failure"
            );
        }
    }

    if let Some(error) = &report.error {
        info!(error = %error, "Run aborted");
        return;
    }

    info!(
        total = report.total,
        passed = report.passed,
        failed = report.failed,
        success_rate = %report
            .success_rate
            .map(|r| format!("{:.1}%", r))
            .unwrap_or_else(|| "n/a".to_string()),
        "Totals"
    );
    if let Some(avg) = report.average_elapsed_seconds {
        info!(average_secs = %format!("{:.2}", avg), "Average response time");
    }
}

#[cfg(test)]
mod tests {
    use probe_core::TestResult;

    use super::*;

    #[tokio::test]
    async fn test_write_report_round_trip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("transcribe_test_results.json");

        let mut ok = TestResult::new("Small", "small.webm", 1024);
        ok.set_status(201);
        ok.elapsed_time_seconds = Some(1.5);
        let report = RunReport::from_results(vec![ok]);

        write_report(&path, &report).await.unwrap();
        log_summary(&report);

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["success"], true);
        assert_eq!(written["total"], 1);
        assert_eq!(written["passed"], 1);
        assert_eq!(written["failed"], 0);
        assert_eq!(written["average_elapsed_seconds"], 1.5);
        assert_eq!(written["results"][0]["test_name"], "Small");
    }

    #[tokio::test]
    async fn test_write_auth_failure() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("out.json");

        let report = RunReport::auth_failed();
        write_report(&path, &report).await.unwrap();
        log_summary(&report);

        let loaded: RunReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, report);
    }

    #[tokio::test]
    async fn test_write_to_missing_dir_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("no/such/dir/out.json");
        assert!(write_report(&path, &RunReport::auth_failed()).await.is_err());
    }
}
