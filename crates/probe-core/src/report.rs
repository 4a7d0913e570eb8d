//! Per-case results and the aggregate run report.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// HTTP statuses counted as a successful upload or login.
pub const ACCEPTED_STATUSES: [u16; 2] = [200, 201];

/// Outcome of a single upload.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TestResult {
    pub test_name: String,
    pub filename: String,
    pub file_size_bytes: usize,
    pub file_size_kb: f64,

    /// Absent when no response was received
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_time_seconds: Option<f64>,

    pub success: bool,

    /// Parsed JSON body, or the raw text when the body was not JSON
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segments_count: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_text_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_text_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestResult {
    /// An empty failed result for the given case; callers fill in the rest.
    pub fn new(test_name: impl Into<String>, filename: impl Into<String>, size: usize) -> Self {
        Self {
            test_name: test_name.into(),
            filename: filename.into(),
            file_size_bytes: size,
            file_size_kb: size as f64 / 1024.0,
            status_code: None,
            elapsed_time_seconds: None,
            success: false,
            response: None,
            transcript_length: None,
            segments_count: None,
            doctor_text_length: None,
            patient_text_length: None,
            error: None,
        }
    }

    /// A failed result for an upload attempted without a session.
    pub fn unauthenticated(
        test_name: impl Into<String>,
        filename: impl Into<String>,
        size: usize,
    ) -> Self {
        Self {
            error: Some("Not authenticated".to_string()),
            ..Self::new(test_name, filename, size)
        }
    }

    /// Record the response status; success follows it exactly.
    pub fn set_status(&mut self, status: u16) {
        self.status_code = Some(status);
        self.success = ACCEPTED_STATUSES.contains(&status);
    }

    pub fn set_elapsed(&mut self, elapsed: Duration) {
        self.elapsed_time_seconds = Some(elapsed.as_secs_f64());
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed_time_seconds.map(Duration::from_secs_f64)
    }
}

/// Aggregate counts and timing over a list of results.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Mean elapsed seconds over passed results; `None` when nothing passed
    pub average_elapsed_seconds: Option<f64>,
}

impl Summary {
    pub fn from_results(results: &[TestResult]) -> Self {
        let total = results.len();
        let passed: Vec<&TestResult> = results.iter().filter(|r| r.success).collect();

        let average_elapsed_seconds = if passed.is_empty() {
            None
        } else {
            let sum: f64 = passed
                .iter()
                .map(|r| r.elapsed_time_seconds.unwrap_or(0.0))
                .sum();
            Some(sum / passed.len() as f64)
        };

        Self {
            total,
            passed: passed.len(),
            failed: total - passed.len(),
            average_elapsed_seconds,
        }
    }

    /// Every case passed. An aborted run has no summary, so this is only
    /// asked of runs that executed their cases.
    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }

    /// Percentage of passed cases, `None` for an empty run.
    pub fn success_rate(&self) -> Option<f64> {
        (self.total > 0).then(|| self.passed as f64 / self.total as f64 * 100.0)
    }
}

/// The persisted record of a run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RunReport {
    pub success: bool,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_elapsed_seconds: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_rate: Option<f64>,

    /// Set when the run was aborted before any case executed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub results: Vec<TestResult>,
}

impl RunReport {
    /// Report for a run whose cases all executed.
    pub fn from_results(results: Vec<TestResult>) -> Self {
        let summary = Summary::from_results(&results);
        Self {
            success: summary.all_passed(),
            total: summary.total,
            passed: summary.passed,
            failed: summary.failed,
            average_elapsed_seconds: summary.average_elapsed_seconds,
            success_rate: summary.success_rate(),
            error: None,
            results,
        }
    }

    /// Report for a run aborted because login failed.
    pub fn auth_failed() -> Self {
        Self {
            success: false,
            total: 0,
            passed: 0,
            failed: 0,
            average_elapsed_seconds: None,
            success_rate: None,
            error: Some("Authentication failed".to_string()),
            results: Vec::new(),
        }
    }

    /// Process exit code for this run.
    pub fn exit_code(&self) -> i32 {
        if self.success { 0 } else { 1 }
    }
}
