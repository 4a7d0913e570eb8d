//! Core types and configuration for scribe-probe.
//!
//! This crate holds the pieces shared by the payload generator, the HTTP
//! client and the orchestrating binary: configuration, run state and the
//! per-case result records.

mod config;
mod report;
mod state;

pub use config::{Config, ConfigError, ConfigManager, TestCase, default_cases};
pub use report::{ACCEPTED_STATUSES, RunReport, Summary, TestResult};
pub use state::RunState;

/// Application name
pub const APP_NAME: &str = "scribe-probe";

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable holding the tracing filter
pub const LOG_ENV: &str = "SCRIBE_PROBE_LOG";

/// Environment variable overriding the backend base URL
pub const BACKEND_URL_ENV: &str = "BACKEND_URL";

/// Environment variable overriding the login identifier
pub const USERNAME_ENV: &str = "TEST_USERNAME";

/// Environment variable overriding the login password
pub const PASSWORD_ENV: &str = "TEST_PASSWORD";

/// Default name of the results file
pub const DEFAULT_OUTPUT_FILE: &str = "transcribe_test_results.json";
