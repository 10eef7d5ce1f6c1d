//! Sampleflut Client - floods WAV samples to a sampleflut server.
//!
//! Reads a 16-bit PCM WAV file, reduces it to mono, and streams it to the
//! server as `SMPL` lines until interrupted or the connection drops.

mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use sampleflut_core::{run_client, CancellationToken};

use crate::config::FileConfig;

/// Sampleflut Client - stream a WAV recording to a sampleflut server.
#[derive(Parser, Debug)]
#[command(name = "sampleflut-client")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 16-bit PCM WAV file to stream (mono or stereo).
    #[arg(value_name = "WAV_FILE")]
    wav_file: PathBuf,

    /// Start offset into the recording in seconds (overrides config file).
    #[arg(value_name = "OFFSET_SECONDS")]
    offset_seconds: Option<f64>,

    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "SAMPLEFLUT_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// Server hostname (overrides config file).
    #[arg(short = 'H', long, env = "SAMPLEFLUT_HOST")]
    host: Option<String>,

    /// Server port (overrides config file).
    #[arg(short = 'p', long, env = "SAMPLEFLUT_PORT")]
    port: Option<u16>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("Sampleflut Client v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut file_config =
        FileConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Apply CLI overrides
    if let Some(host) = args.host {
        file_config.host = host;
    }
    if let Some(port) = args.port {
        file_config.port = port;
    }
    if let Some(offset) = args.offset_seconds {
        file_config.offset_seconds = offset;
    }

    let config = file_config.to_client_config(args.wav_file);
    log::info!(
        "Configuration: file={}, offset={}s, server={}",
        config.wav_path.display(),
        config.offset_seconds,
        config.server_addr()
    );

    // Ctrl+C stops the flood after the line in flight
    let cancel = CancellationToken::new();
    let handler_cancel = cancel.clone();
    ctrlc::set_handler(move || {
        log::info!("Interrupt received, stopping...");
        handler_cancel.cancel();
    })
    .context("Failed to install Ctrl+C handler")?;

    let summary = run_client(&config, &cancel).map_err(|e| {
        let phase = e.phase();
        anyhow::Error::new(e).context(format!("{phase} failed"))
    })?;

    log::info!(
        "Stopped after {} passes over {} positions ({} lines, {} bytes)",
        summary.passes,
        summary.window,
        summary.lines_sent,
        summary.bytes_sent
    );
    Ok(())
}
