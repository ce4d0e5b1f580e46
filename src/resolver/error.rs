//! Error types for confirmation-page negotiation.

use thiserror::Error;

/// Errors that can occur while resolving the real download link.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// The service rendered an explicit error message instead of a link.
    #[error("drive error: {message}")]
    ServiceError {
        /// Message text extracted from the page.
        message: String,
    },

    /// No strategy recognized the confirmation page.
    #[error("cannot retrieve the download link (tried: {tried})")]
    LinkNotFound {
        /// Comma-separated names of the strategies that were attempted.
        tried: String,
    },
}

impl ResolveError {
    /// Creates a service-reported error.
    pub fn service_error(message: impl Into<String>) -> Self {
        Self::ServiceError {
            message: message.into(),
        }
    }

    /// Creates a link-not-found error listing the strategies that were tried.
    #[must_use]
    pub fn link_not_found(tried: &[&str]) -> Self {
        Self::LinkNotFound {
            tried: tried.join(", "),
        }
    }
}
