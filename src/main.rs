//! CLI entry point for stream-saver.
//!
//! Exit codes: 0 when the file was saved, 1 when the server's answer did not
//! produce a file (HTTP error, redirect budget, size mismatch), 2 on fatal
//! errors (timeouts exhausted, network, I/O, configuration).

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use stream_saver::{DownloadRequest, HttpClient, Saver, sha256_file};
use tracing::{debug, error, info};

mod app_config;
mod cli;

use app_config::{load_default_file_config, resolve_settings};
use cli::Args;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    match run(&args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!(error = %format!("{e:#}"), "download aborted");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

/// Runs one download and prints the result. Returns whether the file was saved.
async fn run(args: &Args) -> Result<bool> {
    let loaded_config = load_default_file_config()?;
    if let Some(path) = loaded_config.path.as_deref()
        && loaded_config.config.is_some()
    {
        debug!(path = %path.display(), "loaded config file");
    }
    let settings = resolve_settings(args, loaded_config.config.as_ref());
    debug!(?settings, "resolved settings");

    let destination = args.destination();
    let client = HttpClient::try_new_with_timeouts(
        Duration::from_secs(settings.connect_timeout_secs),
        Duration::from_secs(settings.read_timeout_secs),
    )
    .context("Failed to initialise HTTP client")?;

    let request = DownloadRequest::new(args.url.as_str(), destination.as_path())
        .with_hop_budget(settings.max_redirects)
        .with_max_attempts(settings.max_attempts)
        .with_size_check(settings.size_check);

    info!(url = %args.url, destination = %destination.display(), "starting download");

    let report = Saver::new(client)
        .save(&request)
        .await
        .with_context(|| format!("Failed to download {}", args.url))?;

    if !report.outcome.is_success() {
        eprintln!("download failed: {}", report.outcome);
        return Ok(false);
    }

    println!("saved {} ({})", destination.display(), report.outcome);

    if !args.no_checksum {
        let digest = sha256_file(&destination)
            .await
            .with_context(|| format!("Failed to checksum {}", destination.display()))?;
        println!("sha256 {digest}");
    }

    Ok(true)
}
