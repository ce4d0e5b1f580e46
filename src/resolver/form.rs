//! Form strategy: the `download-form` action URL plus its hidden inputs.
//!
//! The service encodes the confirmation token and file identifier as hidden
//! form fields, which makes this the most robust of the strategies.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};
use url::Url;

use super::utils::{absolutize_url, compile_static_regex, parse_tag_attributes};
use super::{Extraction, LinkStrategy};

/// `id` attribute that marks the confirmation form.
const DOWNLOAD_FORM_ID: &str = "download-form";

static FORM_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?is)<form\b[^>]*>"));
static FORM_CLOSE_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"(?i)</form\s*>"));
static INPUT_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?is)<input\b[^>]*>"));

/// Resolves the link by submitting the `download-form` the way a browser would.
#[derive(Debug, Default, Clone, Copy)]
pub struct FormStrategy;

impl LinkStrategy for FormStrategy {
    fn name(&self) -> &'static str {
        "download-form"
    }

    fn try_extract(&self, html: &str, origin: &Url) -> Option<Extraction> {
        let (action, body) = find_download_form(html)?;
        let Some(mut url) = absolutize_url(&action, origin) else {
            warn!(action = %action, "download form action is not a usable URL");
            return None;
        };

        let inputs = hidden_inputs(body);
        debug!(inputs = inputs.len(), "collected hidden form inputs");
        merge_query(&mut url, &inputs);
        Some(Extraction::Link(url.to_string()))
    }
}

/// Locates the marked form and returns its action plus inner HTML.
fn find_download_form(html: &str) -> Option<(String, &str)> {
    FORM_OPEN_RE.find_iter(html).find_map(|open| {
        let attributes = parse_tag_attributes(open.as_str());
        if attributes.get("id").map(String::as_str) != Some(DOWNLOAD_FORM_ID) {
            return None;
        }
        let action = attributes
            .get("action")
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())?;
        let rest = &html[open.end()..];
        let body_end = FORM_CLOSE_RE.find(rest).map_or(rest.len(), |close| close.start());
        Some((action, &rest[..body_end]))
    })
}

/// Collects `name`/`value` pairs of hidden inputs, in document order.
fn hidden_inputs(form_body: &str) -> Vec<(String, String)> {
    INPUT_TAG_RE
        .find_iter(form_body)
        .filter_map(|tag| {
            let mut attributes = parse_tag_attributes(tag.as_str());
            let is_hidden = attributes
                .get("type")
                .is_some_and(|t| t.eq_ignore_ascii_case("hidden"));
            let name = attributes.remove("name").filter(|n| !n.is_empty())?;
            is_hidden.then(|| (name, attributes.remove("value").unwrap_or_default()))
        })
        .collect()
}

/// Merges `inputs` into the URL query.
///
/// Existing parameters keep their position; a same-named input overwrites
/// the existing value, and new names are appended.
pub(crate) fn merge_query(url: &mut Url, inputs: &[(String, String)]) {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    for (name, value) in inputs {
        let mut seen = false;
        pairs.retain_mut(|(existing, existing_value)| {
            if existing != name {
                return true;
            }
            if seen {
                return false;
            }
            seen = true;
            existing_value.clone_from(value);
            true
        });
        if !seen {
            pairs.push((name.clone(), value.clone()));
        }
    }

    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
}
