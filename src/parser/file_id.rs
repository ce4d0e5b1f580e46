//! Resource identifier extraction from share links and bare IDs.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};
use url::Url;

use super::error::{MAX_INPUT_LENGTH, ParseError};

/// Share-link shapes, tried in order. The first capture wins.
///
/// A captured identifier stops at the next path, query, or fragment delimiter.
static SHARE_LINK_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("file-view", r"/file/d/([^/?#&]+)"),
        ("id-query", r"[?&]id=([^&#]+)"),
        ("files", r"/files/([^/?#&]+)"),
        ("document", r"/document/d/([^/?#&]+)"),
        ("spreadsheets", r"/spreadsheets/d/([^/?#&]+)"),
        ("presentation", r"/presentation/d/([^/?#&]+)"),
        ("folders", r"folders/([^/?#&]+)"),
    ]
    .into_iter()
    .map(|(shape, pattern)| {
        let regex = Regex::new(pattern)
            .unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"));
        (shape, regex)
    })
    .collect()
});

/// Extracts the resource identifier from a share link or bare ID.
///
/// Returns `None` when no rule recognizes the input; callers must treat that
/// as a fatal input error.
///
/// # Rules
///
/// 1. Input without `/` or `\` is already a bare identifier.
/// 2. Known share-link shapes (file view, `id=` query, files, documents,
///    spreadsheets, presentations, folders).
/// 3. A top-level `id` query parameter on a generic URL.
///
/// # Examples
///
/// ```
/// use gget_core::parser::extract_file_id;
///
/// assert_eq!(extract_file_id("ABC123").as_deref(), Some("ABC123"));
/// assert_eq!(
///     extract_file_id("https://drive.google.com/open?id=XYZ").as_deref(),
///     Some("XYZ")
/// );
/// assert_eq!(extract_file_id("https://example.com/a/b"), None);
/// ```
#[must_use]
#[tracing::instrument(level = "debug", skip(input), fields(input_len = input.len()))]
pub fn extract_file_id(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if !input.contains('/') && !input.contains('\\') {
        trace!("input has no path separator, treating as bare identifier");
        return Some(input.to_string());
    }

    for (shape, pattern) in SHARE_LINK_PATTERNS.iter() {
        if let Some(id) = pattern
            .captures(input)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|id| !id.is_empty())
        {
            debug!(shape, id, "matched share-link shape");
            return Some(id.to_string());
        }
    }

    let id = Url::parse(input).ok().and_then(|url| {
        url.query_pairs()
            .find(|(key, value)| key == "id" && !value.is_empty())
            .map(|(_, value)| value.into_owned())
    });
    if let Some(id) = &id {
        debug!(id = %id, "found id query parameter");
    }
    id
}

/// Extracts the resource identifier, returning a typed input error on failure.
///
/// # Errors
///
/// Returns [`ParseError`] when the input is empty, too long, or matches no
/// extraction rule.
pub fn parse_file_id(input: &str) -> Result<String, ParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ParseError::empty());
    }
    if trimmed.len() > MAX_INPUT_LENGTH {
        return Err(ParseError::too_long(trimmed));
    }
    extract_file_id(trimmed).ok_or_else(|| ParseError::unrecognized(trimmed))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_identifier_returned_unchanged() {
        for id in ["ABC123", "1a2B3c-_xyz", "id=weird", "with.dots"] {
            assert_eq!(extract_file_id(id).as_deref(), Some(id));
        }
    }

    #[test]
    fn test_bare_identifier_is_trimmed() {
        assert_eq!(extract_file_id("  ABC123\n").as_deref(), Some("ABC123"));
    }

    #[test]
    fn test_empty_input_fails() {
        assert_eq!(extract_file_id(""), None);
        assert_eq!(extract_file_id("   "), None);
    }

    #[test]
    fn test_file_view_link() {
        assert_eq!(
            extract_file_id("https://drive.example.com/file/d/ABC123/view").as_deref(),
            Some("ABC123")
        );
    }

    #[test]
    fn test_file_view_link_with_query_stops_at_delimiter() {
        assert_eq!(
            extract_file_id("https://drive.google.com/file/d/ABC123?usp=sharing").as_deref(),
            Some("ABC123")
        );
    }

    #[test]
    fn test_id_query_link() {
        assert_eq!(
            extract_file_id("https://drive.google.com/uc?id=QWE789&export=download").as_deref(),
            Some("QWE789")
        );
    }

    #[test]
    fn test_files_link() {
        assert_eq!(
            extract_file_id("https://www.googleapis.com/drive/v3/files/FILE42").as_deref(),
            Some("FILE42")
        );
    }

    #[test]
    fn test_document_link() {
        assert_eq!(
            extract_file_id("https://docs.google.com/document/d/DOC1/edit").as_deref(),
            Some("DOC1")
        );
    }

    #[test]
    fn test_spreadsheets_link() {
        assert_eq!(
            extract_file_id("https://docs.google.com/spreadsheets/d/SHEET2/edit#gid=0").as_deref(),
            Some("SHEET2")
        );
    }

    #[test]
    fn test_presentation_link() {
        assert_eq!(
            extract_file_id("https://docs.google.com/presentation/d/SLIDES3/edit").as_deref(),
            Some("SLIDES3")
        );
    }

    #[test]
    fn test_folder_link() {
        assert_eq!(
            extract_file_id("https://drive.google.com/drive/folders/FOLDER4?usp=sharing")
                .as_deref(),
            Some("FOLDER4")
        );
    }

    #[test]
    fn test_pattern_order_file_view_before_id_query() {
        assert_eq!(
            extract_file_id("https://drive.google.com/file/d/FIRST/view?id=SECOND").as_deref(),
            Some("FIRST")
        );
    }

    #[test]
    fn test_id_query_requires_parameter_boundary() {
        // `gid=0` in a fragment must not be mistaken for an `id` parameter.
        assert_eq!(
            extract_file_id("https://docs.google.com/spreadsheets/d/SHEET9/edit#gid=0").as_deref(),
            Some("SHEET9")
        );
    }

    #[test]
    fn test_backslash_input_is_not_bare() {
        assert_eq!(extract_file_id(r"C:\downloads\file"), None);
    }

    #[test]
    fn test_unrecognized_url_fails() {
        assert_eq!(extract_file_id("https://example.com/some/page"), None);
    }

    #[test]
    fn test_parse_file_id_typed_errors() {
        assert!(matches!(parse_file_id(""), Err(ParseError::Empty { .. })));
        assert!(matches!(
            parse_file_id("https://example.com/some/page"),
            Err(ParseError::UnrecognizedInput { .. })
        ));
        let long_input = format!("https://example.com/{}", "a".repeat(MAX_INPUT_LENGTH));
        assert!(matches!(
            parse_file_id(&long_input),
            Err(ParseError::InputTooLong { .. })
        ));
    }

    #[test]
    fn test_parse_file_id_success() {
        assert_eq!(
            parse_file_id("https://drive.google.com/file/d/ABC123/view").unwrap(),
            "ABC123"
        );
    }
}
