//! Bundle upload to the deployer endpoint.
//!
//! One multipart POST per run: a `secret` text field and a `bundle` file field.
//! Any status below 400 is success and its body is the server's confirmation.

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use reqwest::multipart::{Form, Part};
use tracing::{info, instrument};
use url::Url;

use sitepress_shared::{Result, SitepressError};

/// File name the deployer expects for the bundle part.
pub const BUNDLE_FILE_NAME: &str = "site-bundle.zip";

/// Content type of the bundle part.
pub const BUNDLE_CONTENT_TYPE: &str = "application/zip";

/// Default timeout in seconds for the upload request.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// User-Agent string for upload requests.
const USER_AGENT: &str = concat!("sitepress/", env!("CARGO_PKG_VERSION"));

/// Transport settings for the upload request.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Timeout for the whole request (send + response) in seconds.
    pub timeout_secs: u64,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Multipart uploader. Single attempt, no retries.
pub struct Uploader {
    client: Client,
}

impl Uploader {
    /// Create an uploader with the given transport settings.
    pub fn new(opts: &UploadOptions) -> Result<Self> {
        // Redirects are not followed: a 3xx is already a success.
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .map_err(|e| SitepressError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Upload the bundle at `archive` and return the server's response text.
    ///
    /// Errors:
    /// - [`SitepressError::Archive`] if the bundle cannot be read
    /// - [`SitepressError::Transport`] if no response was received
    /// - [`SitepressError::ResponseStream`] if the body could not be read
    /// - [`SitepressError::Upload`] on status >= 400
    #[instrument(skip_all, fields(endpoint = %endpoint))]
    pub async fn upload(&self, endpoint: &Url, secret: &str, archive: &Path) -> Result<String> {
        let unreadable = |e: std::io::Error| {
            SitepressError::archive(archive, format!("failed to read bundle: {e}"))
        };
        let file = tokio::fs::File::open(archive).await.map_err(unreadable)?;
        let size = file.metadata().await.map_err(unreadable)?.len();

        // Streamed from disk; the known length keeps a Content-Length on the form.
        let bundle = Part::stream_with_length(file, size)
            .file_name(BUNDLE_FILE_NAME)
            .mime_str(BUNDLE_CONTENT_TYPE)
            .map_err(|e| SitepressError::Transport(format!("invalid bundle part: {e}")))?;

        let form = Form::new()
            .text("secret", secret.to_string())
            .part("bundle", bundle);

        info!(bytes = size, "uploading bundle");

        let response = self
            .client
            .post(endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| SitepressError::Transport(format!("upload failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SitepressError::ResponseStream(e.to_string()))?;

        if status.as_u16() >= 400 {
            return Err(SitepressError::Upload {
                status: status.as_u16(),
                body,
            });
        }

        info!(status = status.as_u16(), response = %body, "server response");

        Ok(body)
    }
}
