//! Error types for sitepress.
//!
//! Library crates use [`SitepressError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all sitepress operations.
#[derive(Debug, thiserror::Error)]
pub enum SitepressError {
    /// Missing or invalid required setting. Raised before any I/O happens.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network-level failure (DNS, connection refused, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The content source answered with a non-2xx status.
    #[error("failed to fetch manifest: {status} {status_text}")]
    Fetch { status: u16, status_text: String },

    /// Manifest body is not valid structured data.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// The directory to package does not exist.
    #[error("build directory not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    /// Reading a source file or writing the archive failed.
    #[error("archive error at {}: {message}", path.display())]
    Archive { path: PathBuf, message: String },

    /// The deployment endpoint rejected the upload (status >= 400).
    #[error("deploy failed ({status}): {body}")]
    Upload { status: u16, body: String },

    /// Headers were received but the response body could not be read.
    #[error("response error: {0}")]
    ResponseStream(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data-quality problem (duplicate slugs and similar).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SitepressError>;

impl SitepressError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create an archive error for the given path.
    pub fn archive(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Archive {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Short stable name of the variant, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Transport(_) => "transport",
            Self::Fetch { .. } => "fetch",
            Self::Parse { .. } => "parse",
            Self::SourceNotFound { .. } => "source_not_found",
            Self::Archive { .. } => "archive",
            Self::Upload { .. } => "upload",
            Self::ResponseStream(_) => "response_stream",
            Self::Io { .. } => "io",
            Self::Validation { .. } => "validation",
        }
    }
}
