//! Error-caption strategy: detects the service's own error page.
//!
//! Quota and permission failures are rendered as a `uc-error-subcaption`
//! paragraph (older pages use `uc-error-caption`). Recognizing them turns a
//! generic "link not found" into the message the user would see in a browser.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use super::utils::{compile_static_regex, element_text};
use super::{Extraction, LinkStrategy};

static SUBCAPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?is)<p\s+class="uc-error-subcaption"\s*>(.*?)</p>"#)
});
static CAPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?is)<p\s+class="uc-error-caption"\s*>(.*?)</p>"#));

/// Reports the service error message instead of a link.
#[derive(Debug, Default, Clone, Copy)]
pub struct ErrorCaptionStrategy;

impl LinkStrategy for ErrorCaptionStrategy {
    fn name(&self) -> &'static str {
        "error-caption"
    }

    fn try_extract(&self, html: &str, _origin: &Url) -> Option<Extraction> {
        [&*SUBCAPTION_RE, &*CAPTION_RE]
            .into_iter()
            .filter_map(|re| re.captures(html).and_then(|caps| caps.get(1)))
            .map(|inner| element_text(inner.as_str()))
            .find(|text| !text.is_empty())
            .map(Extraction::ServiceError)
    }
}
