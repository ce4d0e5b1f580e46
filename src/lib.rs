//! gget Core Library
//!
//! This library provides the core functionality for the `gget` tool, which
//! downloads files from cloud drive share links by emulating a browser
//! session and negotiating the confirmation pages the service interposes.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`parser`] - Resource identifier extraction from links and bare IDs
//! - [`resolver`] - Confirmation-page link extraction strategies
//! - [`download`] - HTTP session, streaming writer and download engine
//! - [`error`] - Top-level failure taxonomy

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
pub mod error;
pub mod parser;
pub mod resolver;
mod user_agent;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use download::{
    DownloadEngine, DownloadError, DownloadOutcome, DownloadRequest, HttpClient, ResolvedTarget,
    ServiceEndpoints, SessionConfig,
};
pub use error::{FailureKind, FetchError, RequestStage};
pub use parser::{ParseError, extract_file_id, parse_file_id};
pub use resolver::{ConfirmationParser, ResolveError, ResolvedLink};
pub use user_agent::BROWSER_USER_AGENT;
