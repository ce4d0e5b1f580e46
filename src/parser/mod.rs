//! Input parsing module for extracting resource identifiers.
//!
//! Users hand `gget` either a bare file ID or one of several share-link
//! shapes. This module reduces all of them to the canonical identifier the
//! service uses to address the file. No network access happens here.
//!
//! # Example
//!
//! ```
//! use gget_core::parser::extract_file_id;
//!
//! let id = extract_file_id("https://drive.google.com/file/d/ABC123/view?usp=sharing");
//! assert_eq!(id.as_deref(), Some("ABC123"));
//! ```

mod error;
mod file_id;

pub use error::{MAX_INPUT_LENGTH, ParseError};
pub use file_id::{extract_file_id, parse_file_id};
