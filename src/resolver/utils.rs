//! Shared utilities for link strategies: static regexes, tag attributes, entity unescaping.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Compiles a regex at static init; panics on invalid pattern.
pub fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

static TAG_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#)
});

static INNER_TAG_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"(?s)<[^>]*>"));

static NUMERIC_ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"&#(?:x([0-9a-fA-F]{1,6})|([0-9]{1,7}));"));

/// Parses the attributes of a single HTML start tag.
///
/// Attribute names are lowercased; values are entity-unescaped. Later
/// duplicates do not replace earlier ones, matching browser behavior.
#[must_use]
pub fn parse_tag_attributes(tag: &str) -> HashMap<String, String> {
    let mut attributes = HashMap::new();
    for attr in TAG_ATTR_RE.captures_iter(tag) {
        let key = attr
            .get(1)
            .map_or("", |m| m.as_str())
            .trim()
            .to_ascii_lowercase();
        let value = attr
            .get(2)
            .or_else(|| attr.get(3))
            .or_else(|| attr.get(4))
            .map_or("", |m| m.as_str());
        attributes
            .entry(key)
            .or_insert_with(|| unescape_html(value));
    }
    attributes
}

/// Unescapes the HTML character references that appear in link attributes.
#[must_use]
pub fn unescape_html(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }

    let decoded = NUMERIC_ENTITY_RE.replace_all(value, |caps: &regex::Captures<'_>| {
        let code = caps
            .get(1)
            .and_then(|hex| u32::from_str_radix(hex.as_str(), 16).ok())
            .or_else(|| caps.get(2).and_then(|dec| dec.as_str().parse::<u32>().ok()));
        code.and_then(char::from_u32)
            .map_or_else(|| caps[0].to_string(), String::from)
    });

    // `&amp;` last so `&amp;lt;` decodes to `&lt;`, not `<`.
    decoded
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Strips markup from an element's inner HTML and collapses whitespace.
#[must_use]
pub fn element_text(inner_html: &str) -> String {
    let without_tags = INNER_TAG_RE.replace_all(inner_html, " ");
    unescape_html(&without_tags)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolves a possibly relative URL string against the service origin.
///
/// Absolute `http(s)` URLs are returned unchanged; `//host/...` gets the
/// origin's scheme; everything else is joined with `origin`.
#[must_use]
pub fn absolutize_url(value: &str, origin: &Url) -> Option<Url> {
    if value.starts_with("http://") || value.starts_with("https://") {
        return Url::parse(value).ok();
    }
    if value.starts_with("//") {
        return Url::parse(&format!("{}:{value}", origin.scheme())).ok();
    }
    origin.join(value).ok()
}
