//! Top-level failure taxonomy for a download run.
//!
//! Every failure of [`DownloadEngine::run`](crate::DownloadEngine::run) is one
//! of four classes, so the binary and tests can tell a bad link from a dead
//! network, a changed page layout, or a full disk.

use std::fmt;

use thiserror::Error;

use crate::download::DownloadError;
use crate::parser::ParseError;
use crate::resolver::ResolveError;

/// Which request a transport failure happened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStage {
    /// First request to the export endpoint.
    Probe,
    /// Request for the resolved download link, including its body.
    Fetch,
}

impl fmt::Display for RequestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Probe => write!(f, "probe"),
            Self::Fetch => write!(f, "fetch"),
        }
    }
}

/// Coarse class of a [`FetchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The identifier could not be extracted; nothing was sent.
    Input,
    /// Request construction, network, status or body-read failure.
    Transport,
    /// The confirmation page could not be turned into a link.
    Negotiation,
    /// The local file could not be written or published.
    Storage,
}

/// Errors returned by a download run.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Identifier extraction failed.
    #[error(transparent)]
    Input(#[from] ParseError),

    /// A request or the response body failed.
    #[error("{stage} request failed: {source}")]
    Transport {
        /// Request the failure happened on.
        stage: RequestStage,
        /// Underlying error.
        #[source]
        source: DownloadError,
    },

    /// The confirmation page yielded no link or carried a service error.
    #[error(transparent)]
    Negotiation(#[from] ResolveError),

    /// Writing, verifying, or renaming the file failed.
    #[error("storage error: {0}")]
    Storage(#[source] DownloadError),
}

impl FetchError {
    /// Creates a transport error for `stage`.
    #[must_use]
    pub fn transport(stage: RequestStage, source: DownloadError) -> Self {
        Self::Transport { stage, source }
    }

    /// Classifies a streaming-writer failure.
    ///
    /// Local I/O and integrity failures are storage errors; a failing body
    /// stream is a transport error of the fetch stage.
    #[must_use]
    pub fn from_write(source: DownloadError) -> Self {
        if source.is_storage() {
            Self::Storage(source)
        } else {
            Self::transport(RequestStage::Fetch, source)
        }
    }

    /// Returns the failure class.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Input(_) => FailureKind::Input,
            Self::Transport { .. } => FailureKind::Transport,
            Self::Negotiation(_) => FailureKind::Negotiation,
            Self::Storage(_) => FailureKind::Storage,
        }
    }
}
