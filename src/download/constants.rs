//! Constants for the download module (timeouts, chunking, progress cadence).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default total request timeout (30 minutes for multi-gigabyte files).
pub const DEFAULT_TIMEOUT_SECS: u64 = 1800;

/// Upper bound accepted for either timeout (24 hours).
pub const MAX_TIMEOUT_SECS: u64 = 86_400;

/// Redirect hops followed before giving up.
pub const MAX_REDIRECTS: usize = 10;

/// Largest slice handed to a single file write.
pub const CHUNK_SIZE: usize = 32 * 1024;

/// Minimum spacing between two progress updates.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Suffix of the in-progress file next to the destination.
pub const PART_SUFFIX: &str = ".part";
