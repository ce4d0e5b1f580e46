//! HTTP session used for the probe and fetch requests.
//!
//! The session is built once from a [`SessionConfig`] and never mutated
//! afterwards; the only state that changes between requests is the cookie
//! jar, which the service updates through `Set-Cookie`.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Response, redirect};
use tracing::{debug, instrument, warn};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS, MAX_REDIRECTS};
use super::error::DownloadError;
use crate::user_agent::effective_user_agent;

/// Hosts that receive user-supplied cookies by default.
const DEFAULT_COOKIE_ORIGINS: &[&str] = &[
    "https://drive.google.com",
    "https://drive.usercontent.google.com",
    "https://docs.google.com",
];

/// Immutable configuration of an HTTP session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// `User-Agent` override; `None` or blank means the browser default.
    pub user_agent: Option<String>,
    /// Cookies (name, value) sent to every cookie origin.
    pub cookies: Vec<(String, String)>,
    /// Origins the configured cookies are scoped to.
    pub cookie_origins: Vec<Url>,
    /// Skip TLS certificate verification.
    pub accept_invalid_certs: bool,
    /// Total per-request timeout, body included.
    pub timeout: Duration,
    /// TCP/TLS connect timeout.
    pub connect_timeout: Duration,
    /// Redirect hops followed per request.
    pub max_redirects: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            cookies: Vec::new(),
            cookie_origins: DEFAULT_COOKIE_ORIGINS
                .iter()
                .filter_map(|origin| Url::parse(origin).ok())
                .collect(),
            accept_invalid_certs: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            max_redirects: MAX_REDIRECTS,
        }
    }
}

impl SessionConfig {
    /// Adds a cookie sent to every cookie origin.
    #[must_use]
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.push((name.into(), value.into()));
        self
    }

    /// Adds `origin` to the cookie scope unless already present.
    pub fn add_cookie_origin(&mut self, origin: &Url) {
        let origin = origin_of(origin);
        if !self.cookie_origins.iter().any(|o| origin_of(o) == origin) {
            self.cookie_origins.push(origin);
        }
    }
}

fn origin_of(url: &Url) -> Url {
    let mut origin = url.clone();
    origin.set_path("/");
    origin.set_query(None);
    origin.set_fragment(None);
    origin
}

/// HTTP client wrapper for the probe and fetch requests.
///
/// # Example
///
/// ```no_run
/// use gget_core::download::{HttpClient, SessionConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new(&SessionConfig::default())?;
/// let response = client.fetch("https://example.com/file.zip").await?;
/// println!("status: {}", response.status());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    jar: Arc<Jar>,
}

impl HttpClient {
    /// Builds the session.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::ClientBuild` when reqwest rejects the
    /// configuration (for example, no TLS backend could be initialized).
    #[instrument(level = "debug", skip(config), fields(cookies = config.cookies.len()))]
    pub fn new(config: &SessionConfig) -> Result<Self, DownloadError> {
        let jar = Arc::new(Jar::default());
        for origin in &config.cookie_origins {
            for (name, value) in &config.cookies {
                jar.add_cookie_str(&format!("{name}={value}; Path=/"), origin);
                debug!(origin = %origin, name = %name, "loaded cookie into jar");
            }
        }

        if config.accept_invalid_certs {
            warn!("TLS certificate verification is disabled for this session");
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

        let client = Client::builder()
            .user_agent(effective_user_agent(config.user_agent.as_deref()))
            .default_headers(headers)
            .cookie_provider(Arc::clone(&jar))
            .redirect(redirect::Policy::limited(config.max_redirects))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .gzip(true)
            .build()
            .map_err(DownloadError::client_build)?;

        Ok(Self { client, jar })
    }

    /// Sends the probe request.
    ///
    /// Non-success statuses are returned as-is: the service renders its
    /// error pages as HTML that the confirmation parser classifies.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::InvalidUrl`, `Timeout` or `Network`.
    #[instrument(skip(self))]
    pub async fn probe(&self, url: &str) -> Result<Response, DownloadError> {
        let response = self.send(url).await?;
        if !response.status().is_success() {
            debug!(status = response.status().as_u16(), "probe returned non-success status");
        }
        Ok(response)
    }

    /// Sends the fetch request for the resolved link.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::HttpStatus` for non-success statuses, plus
    /// the errors of [`probe`](Self::probe).
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<Response, DownloadError> {
        let response = self.send(url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }
        Ok(response)
    }

    async fn send(&self, url: &str) -> Result<Response, DownloadError> {
        let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;
        debug!(
            status = response.status().as_u16(),
            final_url = %response.url(),
            content_type = content_type(&response).unwrap_or(""),
            "response received"
        );
        Ok(response)
    }

    /// Value of the first cookie for `url` whose name starts with `prefix`.
    #[must_use]
    pub fn cookie_with_prefix(&self, url: &Url, prefix: &str) -> Option<String> {
        let header = self.jar.cookies(url)?;
        let header = header.to_str().ok()?;
        header.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name.starts_with(prefix) && !value.is_empty()).then(|| value.to_string())
        })
    }

}

/// `Content-Type` of a response, if present and valid ASCII.
#[must_use]
pub fn content_type(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
}

/// True when the response is an HTML page rather than file content.
#[must_use]
pub fn is_html(response: &Response) -> bool {
    content_type(response).is_some_and(|ct| {
        ct.split(';')
            .next()
            .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("text/html"))
    })
}

/// Declared body length, if any.
///
/// Read from the header rather than `Response::content_length`, which
/// reports the decoded size for compressed bodies.
#[must_use]
pub fn declared_length(response: &Response) -> Option<u64> {
    if response
        .headers()
        .get(reqwest::header::CONTENT_ENCODING)
        .is_some()
    {
        return None;
    }
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}
