//! Filename extraction, sanitization, and destination resolution.
//!
//! The name of a downloaded file comes from, in order:
//! 1. the `Content-Disposition` header (`filename*=` preferred over `filename=`)
//! 2. the last path segment of the final, post-redirect URL
//! 3. `gdrive_<id>`

use std::path::{Component, Path, PathBuf};

use tracing::debug;
use url::Url;

/// Path segments that name the service endpoint rather than the file.
const ENDPOINT_SEGMENTS: &[&str] = &["uc", "download", "open", "view"];

/// Parses Content-Disposition header to extract filename.
///
/// Handles:
/// - `attachment; filename="example.zip"`
/// - `attachment; filename=example.zip`
/// - `attachment; filename*=UTF-8''example%20file.zip` (RFC 5987)
pub(crate) fn parse_content_disposition(header: &str) -> Option<String> {
    if let Some(pos) = header.find("filename*=") {
        let value = header[pos + "filename*=".len()..].trim();
        // charset'language'encoded_value
        if let Some(quote_pos) = value.find("''") {
            let encoded = &value[quote_pos + 2..];
            let end = encoded.find(';').unwrap_or(encoded.len());
            let encoded_name = encoded[..end].trim().trim_matches('"');
            if let Ok(decoded) = urlencoding::decode(encoded_name)
                && !decoded.trim().is_empty()
            {
                return Some(decoded.into_owned());
            }
        }
    }

    if let Some(pos) = header.find("filename=") {
        let value = header[pos + "filename=".len()..].trim();

        if let Some(stripped) = value.strip_prefix('"') {
            if let Some(end) = stripped.find('"') {
                let filename = &stripped[..end];
                if !filename.trim().is_empty() {
                    return Some(filename.to_string());
                }
            }
        } else {
            let end = value.find(';').unwrap_or(value.len());
            let filename = value[..end].trim();
            if !filename.is_empty() {
                return Some(filename.to_string());
            }
        }
    }

    None
}

/// Sanitizes filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems
/// (`/ \ : * ? " < > |` and control characters) and neutralizes `.`/`..`.
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

/// Returns false for names that carry no information after sanitizing.
fn is_meaningful(name: &str) -> bool {
    !name.trim_matches('_').is_empty()
}

/// Last non-empty path segment of `url`, URL-decoded.
///
/// Bare endpoint segments such as `uc` or `download` are not file names.
pub(crate) fn filename_from_url(url: &Url) -> Option<String> {
    let last = url.path_segments()?.rfind(|segment| !segment.is_empty())?;
    if ENDPOINT_SEGMENTS.contains(&last) {
        return None;
    }
    let decoded = urlencoding::decode(last).map_or_else(
        |e| {
            debug!(segment = %last, error = %e, "URL decoding failed, using raw segment");
            last.to_string()
        },
        std::borrow::Cow::into_owned,
    );
    Some(decoded)
}

/// Fallback name when neither headers nor URL name the file.
#[must_use]
pub fn fallback_filename(file_id: &str) -> String {
    format!("gdrive_{}", sanitize_filename(file_id))
}

/// Picks the on-disk filename for a response.
#[must_use]
pub fn resolve_filename(
    content_disposition: Option<&str>,
    final_url: &Url,
    file_id: &str,
) -> String {
    let from_header = content_disposition.and_then(parse_content_disposition);
    let candidate = from_header
        .inspect(|name| debug!(filename = %name, "filename from Content-Disposition"))
        .or_else(|| filename_from_url(final_url))
        .map(|name| sanitize_filename(&name))
        .filter(|name| is_meaningful(name));

    candidate.unwrap_or_else(|| fallback_filename(file_id))
}

/// Resolves the destination path from the optional `-o` override.
///
/// An existing directory, or a path ending in a separator, receives the
/// resolved filename (the writer creates missing directories); any other path
/// is used verbatim. With no override the file lands in the working directory.
#[must_use]
pub fn resolve_destination(output: Option<&Path>, filename: &str) -> PathBuf {
    match output {
        Some(path) if path.is_dir() || names_directory(path) => path.join(filename),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(filename),
    }
}

fn names_directory(path: &Path) -> bool {
    path.as_os_str()
        .to_string_lossy()
        .ends_with(std::path::is_separator)
}

/// Path of the in-progress file for `destination`.
#[must_use]
pub fn part_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(super::constants::PART_SUFFIX);
    PathBuf::from(name)
}
