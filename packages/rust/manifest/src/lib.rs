//! Content manifest retrieval.
//!
//! The CMS publishes one `manifest.json` per comic at
//! `{api_base}/api/pub/v1/comics/{slug}/manifest.json`. This crate fetches and
//! parses it. Nothing is cached and nothing is retried; a caller that wants a
//! retry policy owns it.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::ACCEPT;
use sitepress_shared::{FetchConfig, Manifest, Result, SitepressError};
use tracing::{debug, info, instrument};
use url::Url;

/// Maximum number of redirects to follow when fetching the manifest.
const MAX_REDIRECTS: usize = 3;

/// Default timeout in seconds for the manifest request.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User-Agent string for manifest requests.
const USER_AGENT: &str = concat!("sitepress/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Fetch options
// ---------------------------------------------------------------------------

/// Transport settings for the manifest request.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Timeout for the whole request in seconds.
    pub timeout_secs: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Fetch and parse the manifest for the configured comic.
///
/// Errors:
/// - [`SitepressError::Transport`] when no response could be obtained
/// - [`SitepressError::Fetch`] on a non-2xx status
/// - [`SitepressError::Parse`] when the body is not a valid manifest
#[instrument(skip_all, fields(comic = %config.comic_slug()))]
pub async fn fetch_manifest(config: &FetchConfig, opts: &FetchOptions) -> Result<Manifest> {
    let url = manifest_url(config)?;

    info!(%url, "fetching manifest");

    let client = build_client(opts)?;

    let response = client
        .get(url.clone())
        .header(ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| SitepressError::Transport(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SitepressError::Fetch {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| SitepressError::Transport(format!("{url}: failed to read body: {e}")))?;

    debug!(bytes = body.len(), "manifest body received");

    let manifest = parse_manifest(&body)?;

    info!(
        chapters = manifest.chapters.len(),
        pages = manifest.page_count(),
        "manifest fetched"
    );

    Ok(manifest)
}

/// Parse a manifest document.
pub fn parse_manifest(body: &str) -> Result<Manifest> {
    serde_json::from_str(body)
        .map_err(|e| SitepressError::parse(format!("invalid manifest.json: {e}")))
}

/// Build the manifest URL for a comic. The slug is percent-encoded as a single
/// path segment, and any path prefix on the API base is kept.
pub fn manifest_url(config: &FetchConfig) -> Result<Url> {
    let mut url = config.api_base().clone();
    url.set_query(None);
    url.set_fragment(None);

    url.path_segments_mut()
        .map_err(|()| {
            SitepressError::config(format!(
                "CMS_API_URL cannot be used as a base URL: {}",
                config.api_base()
            ))
        })?
        .pop_if_empty()
        .extend([
            "api",
            "pub",
            "v1",
            "comics",
            config.comic_slug(),
            "manifest.json",
        ]);

    Ok(url)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a reqwest client with appropriate settings.
fn build_client(opts: &FetchOptions) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(Duration::from_secs(opts.timeout_secs))
        .build()
        .map_err(|e| SitepressError::Transport(format!("failed to build HTTP client: {e}")))
}
