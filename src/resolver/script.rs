//! Inline-script strategy: `"downloadUrl":"..."` embedded in page scripts.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};
use url::Url;

use super::utils::{absolutize_url, compile_static_regex};
use super::{Extraction, LinkStrategy};

static DOWNLOAD_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#""downloadUrl"\s*:\s*"((?:[^"\\]|\\.)*)""#));

/// Resolves the link from a JSON-ish `downloadUrl` property in a script block.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptStrategy;

impl LinkStrategy for ScriptStrategy {
    fn name(&self) -> &'static str {
        "inline-script"
    }

    fn try_extract(&self, html: &str, origin: &Url) -> Option<Extraction> {
        let raw = DOWNLOAD_URL_RE
            .captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())?;

        let decoded = decode_js_string(raw);
        if decoded.trim().is_empty() {
            return None;
        }

        match absolutize_url(decoded.trim(), origin) {
            Some(url) => Some(Extraction::Link(url.to_string())),
            None => {
                warn!(value = %decoded, "downloadUrl is not a usable URL");
                None
            }
        }
    }
}

/// Decodes the body of a JavaScript string literal.
///
/// Valid JSON escapes go through `serde_json`. Anything else falls back to
/// decoding the two escapes the service actually emits in URLs.
fn decode_js_string(raw: &str) -> String {
    match serde_json::from_str::<String>(&format!("\"{raw}\"")) {
        Ok(decoded) => decoded,
        Err(error) => {
            debug!(error = %error, "downloadUrl is not a JSON string, using minimal unescape");
            raw.replace("\\u003d", "=")
                .replace("\\u0026", "&")
                .replace("\\/", "/")
        }
    }
}
