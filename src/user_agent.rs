//! Shared User-Agent strings for the download session.
//!
//! The service serves different markup to non-browser clients, so the
//! session identifies as a desktop browser by default.

/// Desktop browser User-Agent sent with every request unless overridden.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Returns the User-Agent to send, preferring a non-empty override.
#[must_use]
pub(crate) fn effective_user_agent(override_ua: Option<&str>) -> String {
    override_ua
        .map(str::trim)
        .filter(|ua| !ua.is_empty())
        .unwrap_or(BROWSER_USER_AGENT)
        .to_string()
}
