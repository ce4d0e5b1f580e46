//! HTTP session, streaming writer and download engine.
//!
//! # Features
//!
//! - Browser-like session with a cookie jar shared by the probe and fetch requests
//! - Streaming writes to `<destination>.part` with an atomic rename on success
//! - Throttled progress reporting (terminal bar or `\r` lines)
//! - Filename resolution from Content-Disposition, the final URL, or the file ID
//! - Structured error types with full context
//!
//! # Example
//!
//! ```no_run
//! use gget_core::download::{DownloadEngine, DownloadRequest, SessionConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = DownloadEngine::new(SessionConfig::default())?;
//! let outcome = engine
//!     .run(&DownloadRequest::new("ABC123").with_output("./downloads"))
//!     .await?;
//! println!("Downloaded: {}", outcome.path.display());
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod engine;
mod error;
mod filename;
pub mod progress;
mod writer;

pub use client::{HttpClient, SessionConfig, content_type, declared_length, is_html};
pub use engine::{
    COOKIE_TOKEN_STRATEGY, DEFAULT_SERVICE_BASE, DIRECT_STRATEGY, DownloadEngine,
    DownloadOutcome, DownloadRequest, ResolvedTarget, ServiceEndpoints,
};
pub use error::DownloadError;
pub use filename::{fallback_filename, part_path, resolve_destination, resolve_filename};
pub use progress::{
    IndicatifProgress, LineProgress, NoProgress, ProgressReporter, ProgressThrottle,
    default_reporter,
};
pub use writer::{WriteSummary, copy_stream, write_response_body};
