//! Confirmation-page negotiation.
//!
//! When a file is too large to virus-scan (or the service wants a click-through
//! for any other reason) the download endpoint answers with an HTML page
//! instead of the payload. The page markup is not a stable contract, so the
//! real link is recovered by several narrowly-scoped strategies tried in a
//! fixed priority order.
//!
//! # Architecture
//!
//! - [`LinkStrategy`] - Trait each extraction heuristic implements
//! - [`ConfirmationParser`] - Ordered strategy list with the resolution loop
//! - [`FormStrategy`] - `download-form` action plus hidden inputs
//! - [`AnchorStrategy`] - `href="/uc?export=download..."` anchors
//! - [`ScriptStrategy`] - `"downloadUrl":"..."` in inline scripts
//! - [`ErrorCaptionStrategy`] - Service error message detection
//!
//! # Example
//!
//! ```
//! use gget_core::resolver::ConfirmationParser;
//!
//! let parser = ConfirmationParser::default();
//! let html = r#"<a href="/uc?export=download&amp;confirm=t&amp;id=ABC">Download</a>"#;
//! let link = parser.resolve_download_url(html).unwrap();
//! assert_eq!(link.url, "https://docs.google.com/uc?export=download&confirm=t&id=ABC");
//! assert_eq!(link.strategy, "anchor");
//! ```

mod anchor;
mod caption;
mod error;
mod form;
mod script;
mod utils;

pub use anchor::AnchorStrategy;
pub use caption::ErrorCaptionStrategy;
pub use error::ResolveError;
pub use form::FormStrategy;
pub use script::ScriptStrategy;

use tracing::{debug, info, warn};
use url::Url;

/// Origin used to absolutize relative confirmation links.
pub const DEFAULT_LINK_ORIGIN: &str = "https://docs.google.com";

/// Outcome of a single strategy that recognized the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Absolute download URL.
    Link(String),
    /// The page carries an explicit service error message.
    ServiceError(String),
}

/// A download link recovered from a confirmation page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    /// The absolute URL of the binary content.
    pub url: String,
    /// Name of the strategy that produced the URL.
    pub strategy: &'static str,
}

/// Trait that all link extraction strategies implement.
///
/// A strategy returns `None` when the page does not carry the structure it
/// looks for, letting the parser move on to the next one.
pub trait LinkStrategy: Send + Sync {
    /// Returns the strategy's name (e.g., "download-form", "anchor").
    fn name(&self) -> &'static str;

    /// Attempts to recognize the page.
    fn try_extract(&self, html: &str, origin: &Url) -> Option<Extraction>;
}

/// Priority-ordered collection of link strategies.
pub struct ConfirmationParser {
    origin: Url,
    strategies: Vec<Box<dyn LinkStrategy>>,
}

impl ConfirmationParser {
    /// Creates a parser with the default strategies, resolving relative links
    /// against `origin`.
    #[must_use]
    pub fn new(origin: Url) -> Self {
        let mut parser = Self::empty(origin);
        parser.register(Box::new(FormStrategy));
        parser.register(Box::new(AnchorStrategy));
        parser.register(Box::new(ScriptStrategy));
        parser.register(Box::new(ErrorCaptionStrategy));
        parser
    }

    /// Creates a parser with no strategies.
    #[must_use]
    pub fn empty(origin: Url) -> Self {
        Self {
            origin,
            strategies: Vec::new(),
        }
    }

    /// Appends a strategy; strategies run in registration order.
    pub fn register(&mut self, strategy: Box<dyn LinkStrategy>) {
        debug!(name = strategy.name(), "Registering link strategy");
        self.strategies.push(strategy);
    }

    /// Returns the strategy names in the order they are tried.
    #[must_use]
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Recovers the real download URL from a confirmation page.
    ///
    /// Strategies are tried in order and the first one that recognizes the
    /// page wins, whether it produced a link or a service error.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::ServiceError` when the page carries an error
    /// message, and `ResolveError::LinkNotFound` when no strategy matched.
    #[tracing::instrument(skip(self, html), fields(html_len = html.len()))]
    pub fn resolve_download_url(&self, html: &str) -> Result<ResolvedLink, ResolveError> {
        for strategy in &self.strategies {
            match strategy.try_extract(html, &self.origin) {
                Some(Extraction::Link(url)) => {
                    info!(strategy = strategy.name(), url = %url, "resolved download link");
                    return Ok(ResolvedLink {
                        url,
                        strategy: strategy.name(),
                    });
                }
                Some(Extraction::ServiceError(message)) => {
                    warn!(strategy = strategy.name(), message = %message, "service reported an error");
                    return Err(ResolveError::service_error(message));
                }
                None => debug!(strategy = strategy.name(), "strategy did not match"),
            }
        }
        Err(ResolveError::link_not_found(&self.strategy_names()))
    }
}

impl Default for ConfirmationParser {
    fn default() -> Self {
        match Url::parse(DEFAULT_LINK_ORIGIN) {
            Ok(origin) => Self::new(origin),
            Err(_) => unreachable!("DEFAULT_LINK_ORIGIN is a valid URL"),
        }
    }
}

impl std::fmt::Debug for ConfirmationParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmationParser")
            .field("origin", &self.origin.as_str())
            .field("strategies", &self.strategy_names())
            .finish()
    }
}
