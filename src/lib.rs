// Re-export from sub-crates
pub use probe_client::{ClientError, HttpTarget, Session, SessionToken, TranscribeTarget};
pub use probe_core::{
    APP_NAME, Config, ConfigManager, DEFAULT_LOG_LEVEL, LOG_ENV, RunReport, RunState, Summary,
    TestCase, TestResult,
};

pub mod output;
pub mod runner;

pub use runner::Harness;

// Version from this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
