//! Upload a single audio file to the transcription endpoint.
//!
//! Usage: transcribe-once <audio_file>
//!
//! Connection settings come from the config file, then BACKEND_URL,
//! TEST_USERNAME and TEST_PASSWORD.

use std::env;
use std::path::Path;

use anyhow::Context;
use probe_client::{Bytes, HttpTarget, Session, TranscribeTarget};
use probe_core::{ConfigManager, DEFAULT_LOG_LEVEL, LOG_ENV};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL)),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <audio_file>", args[0]);
        eprintln!();
        eprintln!("Example:");
        eprintln!("  BACKEND_URL=http://localhost:4000 {} visit.webm", args[0]);
        std::process::exit(1);
    }

    let audio_file = Path::new(&args[1]);
    let filename = audio_file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("audio.webm");

    println!("Reading audio file: {}", audio_file.display());
    let audio = tokio::fs::read(audio_file)
        .await
        .with_context(|| format!("Failed to read {}", audio_file.display()))?;
    println!(
        "Audio size: {} bytes ({:.2} KB)",
        audio.len(),
        audio.len() as f64 / 1024.0
    );

    let config = ConfigManager::new()?.load_layered()?;
    config.validate()?;

    let target = HttpTarget::new(config.request_timeout())?;
    let mut session = Session::from_config(&config);
    target.authenticate(&mut session).await?;

    println!("Sending transcription request...");
    let result = target
        .submit(&session, Bytes::from(audio), filename, filename)
        .await;

    println!();
    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}
