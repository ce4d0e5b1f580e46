//! Download engine: identifier, probe, negotiation, fetch, write.
//!
//! One [`DownloadEngine::run`] call performs exactly one download. Each step
//! is awaited before the next starts; there are no retries.
//!
//! # Example
//!
//! ```no_run
//! use gget_core::download::{DownloadEngine, DownloadRequest, SessionConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = DownloadEngine::new(SessionConfig::default())?;
//! let request = DownloadRequest::new("https://drive.google.com/file/d/ABC123/view");
//! let outcome = engine.run(&request).await?;
//! println!("Saved {} bytes to {}", outcome.bytes_written, outcome.path.display());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use reqwest::Response;
use reqwest::header::CONTENT_DISPOSITION;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::client::{HttpClient, SessionConfig, declared_length, is_html};
use super::error::DownloadError;
use super::filename::{resolve_destination, resolve_filename};
use super::progress::{ProgressReporter, default_reporter};
use super::writer::write_response_body;
use crate::error::{FetchError, RequestStage};
use crate::parser::parse_file_id;
use crate::resolver::{ConfirmationParser, DEFAULT_LINK_ORIGIN, ResolveError};

/// Default service base URL; the probe goes to `<base>/uc`.
pub const DEFAULT_SERVICE_BASE: &str = "https://drive.google.com";

/// Cookie name prefix of the legacy confirmation token.
const CONFIRM_COOKIE_PREFIX: &str = "download_warning";

/// Strategy name reported when the probe already returned the payload.
pub const DIRECT_STRATEGY: &str = "direct";

/// Strategy name reported for the legacy cookie-token link.
pub const COOKIE_TOKEN_STRATEGY: &str = "cookie-token";

/// Where the engine sends its requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoints {
    /// Base of the export endpoint.
    pub base: Url,
    /// Origin that relative confirmation links are resolved against.
    pub link_origin: Url,
}

impl ServiceEndpoints {
    /// Endpoints for a single mock or mirror host.
    #[must_use]
    pub fn single_host(base: Url) -> Self {
        Self {
            link_origin: base.clone(),
            base,
        }
    }

    /// `<base>/uc?id=<id>&export=download`
    #[must_use]
    pub fn probe_url(&self, file_id: &str) -> String {
        let mut url = self.uc_url();
        url.query_pairs_mut()
            .append_pair("id", file_id)
            .append_pair("export", "download");
        url.to_string()
    }

    /// `<base>/uc?export=download&confirm=<token>&id=<id>`
    #[must_use]
    pub fn confirm_url(&self, file_id: &str, token: &str) -> String {
        let mut url = self.uc_url();
        url.query_pairs_mut()
            .append_pair("export", "download")
            .append_pair("confirm", token)
            .append_pair("id", file_id);
        url.to_string()
    }

    fn uc_url(&self) -> Url {
        let mut url = self.base.clone();
        let path = format!("{}/uc", self.base.path().trim_end_matches('/'));
        url.set_path(&path);
        url.set_query(None);
        url
    }
}

impl Default for ServiceEndpoints {
    fn default() -> Self {
        match (
            Url::parse(DEFAULT_SERVICE_BASE),
            Url::parse(DEFAULT_LINK_ORIGIN),
        ) {
            (Ok(base), Ok(link_origin)) => Self { base, link_origin },
            _ => unreachable!("default service URLs are valid"),
        }
    }
}

/// One download to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Share link or bare identifier as the user typed it.
    pub source: String,
    /// Destination override; an existing directory receives the resolved name.
    pub output: Option<PathBuf>,
    /// Suppress progress output.
    pub quiet: bool,
}

impl DownloadRequest {
    /// Creates a request with no destination override and progress enabled.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            output: None,
            quiet: false,
        }
    }

    /// Sets the destination override.
    #[must_use]
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Sets quiet mode.
    #[must_use]
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }
}

/// The link the payload is fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Resource identifier.
    pub file_id: String,
    /// URL the payload came from.
    pub url: String,
    /// Strategy that produced `url`, [`DIRECT_STRATEGY`] or [`COOKIE_TOKEN_STRATEGY`].
    pub strategy: &'static str,
    /// Filename chosen from the payload response.
    pub suggested_filename: Option<String>,
}

/// A completed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// Published file.
    pub path: PathBuf,
    /// Bytes written.
    pub bytes_written: u64,
    /// Declared length of the payload, when the service sent one.
    pub content_length: Option<u64>,
    /// How the payload was located.
    pub target: ResolvedTarget,
}

/// Sequential download driver.
#[derive(Debug)]
pub struct DownloadEngine {
    client: HttpClient,
    parser: ConfirmationParser,
    endpoints: ServiceEndpoints,
}

impl DownloadEngine {
    /// Creates an engine for the public service.
    ///
    /// # Errors
    ///
    /// Returns a `Transport` error at the probe stage when the HTTP session
    /// cannot be built.
    pub fn new(config: SessionConfig) -> Result<Self, FetchError> {
        Self::with_endpoints(config, ServiceEndpoints::default())
    }

    /// Creates an engine against custom endpoints; their hosts join the cookie scope.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn with_endpoints(
        mut config: SessionConfig,
        endpoints: ServiceEndpoints,
    ) -> Result<Self, FetchError> {
        config.add_cookie_origin(&endpoints.base);
        config.add_cookie_origin(&endpoints.link_origin);
        let client = HttpClient::new(&config)
            .map_err(|e| FetchError::transport(RequestStage::Probe, e))?;
        let parser = ConfirmationParser::new(endpoints.link_origin.clone());
        Ok(Self {
            client,
            parser,
            endpoints,
        })
    }

    /// Runs one download with the default progress reporter for `request.quiet`.
    ///
    /// # Errors
    ///
    /// See [`run_with_progress`](Self::run_with_progress).
    pub async fn run(&self, request: &DownloadRequest) -> Result<DownloadOutcome, FetchError> {
        let mut reporter = default_reporter(request.quiet);
        self.run_with_progress(request, reporter.as_mut()).await
    }

    /// Runs one download, reporting progress to `reporter`.
    ///
    /// # Errors
    ///
    /// - `FetchError::Input` when no identifier can be extracted (nothing is sent)
    /// - `FetchError::Transport` for request, status, or body-read failures
    /// - `FetchError::Negotiation` when the confirmation page yields no link
    /// - `FetchError::Storage` when the file cannot be written or published
    #[instrument(skip(self, reporter), fields(source = %request.source))]
    pub async fn run_with_progress(
        &self,
        request: &DownloadRequest,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<DownloadOutcome, FetchError> {
        let file_id = parse_file_id(&request.source)?;
        info!(file_id = %file_id, "extracted file ID");

        let (mut target, response) = self.locate_payload(&file_id).await?;

        let content_disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok());
        let filename = resolve_filename(content_disposition, response.url(), &file_id);
        let destination = resolve_destination(request.output.as_deref(), &filename);
        let content_length = declared_length(&response);
        debug!(
            filename = %filename,
            destination = %destination.display(),
            content_length = ?content_length,
            "resolved destination"
        );
        target.suggested_filename = Some(filename);

        let summary = write_response_body(
            response.bytes_stream(),
            content_length,
            &destination,
            &target.url,
            reporter,
        )
        .await
        .map_err(FetchError::from_write)?;

        Ok(DownloadOutcome {
            path: summary.path,
            bytes_written: summary.bytes_written,
            content_length,
            target,
        })
    }

    /// Probes the export endpoint and returns the payload response.
    async fn locate_payload(
        &self,
        file_id: &str,
    ) -> Result<(ResolvedTarget, Response), FetchError> {
        let probe_url = self.endpoints.probe_url(file_id);
        let probe = self
            .client
            .probe(&probe_url)
            .await
            .map_err(|e| FetchError::transport(RequestStage::Probe, e))?;

        if !is_html(&probe) {
            let status = probe.status();
            if !status.is_success() {
                return Err(FetchError::transport(
                    RequestStage::Probe,
                    DownloadError::http_status(&probe_url, status.as_u16()),
                ));
            }
            info!("probe returned the payload directly");
            let target = ResolvedTarget {
                file_id: file_id.to_string(),
                url: probe.url().to_string(),
                strategy: DIRECT_STRATEGY,
                suggested_filename: None,
            };
            return Ok((target, probe));
        }

        let landing_url = probe.url().clone();
        let html = probe.text().await.map_err(|e| {
            FetchError::transport(RequestStage::Probe, DownloadError::network(&probe_url, e))
        })?;
        let (url, strategy) = self.negotiate(file_id, &html, &landing_url)?;

        let response = self
            .client
            .fetch(&url)
            .await
            .map_err(|e| FetchError::transport(RequestStage::Fetch, e))?;
        if is_html(&response) {
            warn!(url = %url, "resolved link returned HTML again; saving it as-is");
        }

        let target = ResolvedTarget {
            file_id: file_id.to_string(),
            url,
            strategy,
            suggested_filename: None,
        };
        Ok((target, response))
    }

    /// Turns a confirmation page into a download link.
    /// Resolves the confirmation page, falling back to the `download_warning`
    /// cookie set on the page's final (post-redirect) host or on the base.
    fn negotiate(
        &self,
        file_id: &str,
        html: &str,
        landing_url: &Url,
    ) -> Result<(String, &'static str), FetchError> {
        match self.parser.resolve_download_url(html) {
            Ok(link) => Ok((link.url, link.strategy)),
            Err(ResolveError::LinkNotFound { tried }) => {
                let token = self
                    .client
                    .cookie_with_prefix(landing_url, CONFIRM_COOKIE_PREFIX)
                    .or_else(|| {
                        self.client
                            .cookie_with_prefix(&self.endpoints.base, CONFIRM_COOKIE_PREFIX)
                    });
                match token {
                    Some(token) => {
                        info!("using confirmation token from download_warning cookie");
                        Ok((
                            self.endpoints.confirm_url(file_id, &token),
                            COOKIE_TOKEN_STRATEGY,
                        ))
                    }
                    None => Err(ResolveError::LinkNotFound { tried }.into()),
                }
            }
            Err(error) => Err(error.into()),
        }
    }
}
