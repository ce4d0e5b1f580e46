//! Anchor strategy: `href="/uc?export=download..."` links.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;
use url::Url;

use super::utils::{compile_static_regex, unescape_html};
use super::{Extraction, LinkStrategy};

static DOWNLOAD_HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"href="(/uc\?export=download[^"]+)""#));

/// Resolves the link from an anchor whose `href` is a relative export URL.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnchorStrategy;

impl LinkStrategy for AnchorStrategy {
    fn name(&self) -> &'static str {
        "anchor"
    }

    fn try_extract(&self, html: &str, origin: &Url) -> Option<Extraction> {
        let href = DOWNLOAD_HREF_RE
            .captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| unescape_html(m.as_str()))?;

        match origin.join(&href) {
            Ok(url) => Some(Extraction::Link(url.to_string())),
            Err(error) => {
                warn!(href = %href, error = %error, "download anchor is not a usable URL");
                None
            }
        }
    }
}
