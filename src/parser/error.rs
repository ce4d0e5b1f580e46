//! Error types for resource identifier extraction.

use thiserror::Error;

/// Maximum input length to accept.
/// Share links longer than this are rejected before any pattern matching.
pub const MAX_INPUT_LENGTH: usize = 2000;

/// Errors that can occur while extracting a resource identifier.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// Input was empty or whitespace only.
    #[error("no URL or file ID given\n  Suggestion: {suggestion}")]
    Empty {
        /// How to fix the issue
        suggestion: String,
    },

    /// Input did not match any known share-link shape.
    #[error("could not extract file ID from '{input}'\n  Suggestion: {suggestion}")]
    UnrecognizedInput {
        /// The input that failed extraction
        input: String,
        /// How to fix the issue
        suggestion: String,
    },

    /// Input exceeds maximum allowed length
    #[error(
        "input too long ({length} chars, max {max}): {preview}...\n  Suggestion: Pass the bare file ID with --id"
    )]
    InputTooLong {
        /// Truncated input for display
        preview: String,
        /// Actual length
        length: usize,
        /// Maximum allowed
        max: usize,
    },
}

impl ParseError {
    /// Creates an `Empty` error.
    #[must_use]
    pub fn empty() -> Self {
        Self::Empty {
            suggestion: "Pass a share link or use --id <FILE_ID>".to_string(),
        }
    }

    /// Creates an `UnrecognizedInput` error for input no extraction rule accepted.
    #[must_use]
    pub fn unrecognized(input: &str) -> Self {
        Self::UnrecognizedInput {
            input: input.to_string(),
            suggestion: "Use a link like https://drive.google.com/file/d/<ID>/view or pass the ID with --id"
                .to_string(),
        }
    }

    /// Creates an `InputTooLong` error.
    #[must_use]
    pub fn too_long(input: &str) -> Self {
        Self::InputTooLong {
            preview: input.chars().take(50).collect(),
            length: input.len(),
            max: MAX_INPUT_LENGTH,
        }
    }
}
