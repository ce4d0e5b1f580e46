//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;
use gget_core::download::constants::MAX_TIMEOUT_SECS;

/// Download a file from a cloud drive share link.
///
/// gget extracts the file ID from a share link (or takes a bare ID),
/// negotiates the confirmation page shown for large files, and streams the
/// file to disk with progress.
#[derive(Parser, Debug)]
#[command(name = "gget")]
#[command(author, version, about)]
pub struct Args {
    /// Share link or bare file ID
    #[arg(value_name = "URL_OR_ID", required_unless_present = "id")]
    pub source: Option<String>,

    /// File ID to download (takes precedence over URL_OR_ID)
    #[arg(long, value_name = "ID")]
    pub id: Option<String>,

    /// Output file, or an existing directory to save into
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Suppress progress and non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Skip TLS certificate verification
    #[arg(long)]
    pub no_check_certificate: bool,

    /// Cookie sent to the service (repeatable)
    #[arg(long = "cookie", value_name = "NAME=VALUE", value_parser = parse_cookie)]
    pub cookies: Vec<(String, String)>,

    /// Override the browser User-Agent
    #[arg(long, value_name = "UA")]
    pub user_agent: Option<String>,

    /// Total request timeout in seconds (default 1800)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=MAX_TIMEOUT_SECS))]
    pub timeout: Option<u64>,

    /// Connect timeout in seconds (default 30)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=MAX_TIMEOUT_SECS))]
    pub connect_timeout: Option<u64>,
}

impl Args {
    /// The input to extract the file ID from; `--id` wins over the positional.
    #[must_use]
    pub fn effective_source(&self) -> Option<&str> {
        self.id.as_deref().or(self.source.as_deref())
    }
}

fn parse_cookie(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("cookie name must not be empty".to_string());
    }
    if name.contains([';', ' ']) || value.contains(';') {
        return Err(format!(
            "cookie '{name}' must not contain ';', and its name must not contain spaces"
        ));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
