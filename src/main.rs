//! CLI entry point for gget.

use anyhow::{Context, Result};
use gget_core::DownloadEngine;
use tracing::{debug, info};

mod app;
mod app_config;
mod cli;

use app::config_runtime::{
    apply_config_defaults, download_request, ensure_output_dir, parse_cli_with_sources,
    session_config,
};
use app_config::load_default_file_config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let (args, cli_sources) = parse_cli_with_sources();

    let loaded = load_default_file_config()?;
    let config_output_dir = if args.output.is_none() {
        loaded.config.as_ref().and_then(|c| c.output_dir.clone())
    } else {
        None
    };
    let args = apply_config_defaults(args, &cli_sources, loaded.config.as_ref());

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

    debug!(?args, config_path = ?loaded.path, "CLI arguments parsed");

    if let Some(dir) = &config_output_dir {
        ensure_output_dir(dir)?;
    }

    let request = download_request(&args)?;
    let engine = DownloadEngine::new(session_config(&args))
        .context("Failed to set up the HTTP session")?;

    let outcome = engine
        .run(&request)
        .await
        .with_context(|| format!("Failed to download '{}'", request.source))?;

    info!(
        path = %outcome.path.display(),
        bytes = outcome.bytes_written,
        strategy = outcome.target.strategy,
        "saved"
    );
    println!("{}", outcome.path.display());

    Ok(())
}
