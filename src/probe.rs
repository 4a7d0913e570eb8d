use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use scribe_probe::output::{log_summary, write_report};
use scribe_probe::{
    Config, ConfigManager, DEFAULT_LOG_LEVEL, Harness, HttpTarget, LOG_ENV, Session, VERSION,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Exercise a transcription endpoint with synthetic audio uploads.
///
/// Connection settings are read from the config file, then BACKEND_URL,
/// TEST_USERNAME and TEST_PASSWORD, then these flags.
#[derive(Debug, Parser)]
#[command(name = "scribe-probe", version)]
struct Args {
    /// Config file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Backend base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Where to write the JSON results
    #[arg(long)]
    output: Option<PathBuf>,

    /// Pause between test cases, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Per-request timeout, in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Write the effective configuration to the config file and exit
    #[arg(long)]
    init_config: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if let Some(delay_ms) = self.delay_ms {
            config.delay_ms = delay_ms;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.request_timeout_secs = timeout_secs;
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize the logger
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL)),
        )
        .init();

    let args = Args::parse();

    // Load config
    let config_manager = match &args.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new()?,
    };
    let mut config = config_manager.load_layered()?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    if args.init_config {
        config_manager.save(&config)?;
        info!(path = ?config_manager.config_path(), "Configuration written");
        return Ok(ExitCode::SUCCESS);
    }

    info!(version = VERSION, base_url = config.base_url(), "scribe-probe starting");

    // The harness owns the HTTP client; it is dropped at the end of this
    // block whatever the outcome.
    let report = {
        let target = HttpTarget::new(config.request_timeout())?;
        let mut harness = Harness::new(target, Session::from_config(&config), config.delay());
        harness.run_all(&config.cases).await
    };

    log_summary(&report);
    write_report(&config.output, &report).await?;

    Ok(ExitCode::from(report.exit_code() as u8))
}
