//! Shared types, error model, and configuration for sitepress.
//!
//! This crate is the foundation depended on by all other sitepress crates.
//! It provides:
//! - [`SitepressError`]: the unified error type
//! - Domain types ([`Manifest`], [`Chapter`], [`Page`], [`PageRecord`], [`SiteData`])
//! - Configuration ([`AppConfig`], [`FetchConfig`], [`DeployConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DEFAULT_API_URL, DEFAULT_ARCHIVE_PATH, DEFAULT_BUILD_DIR, DeployConfig,
    DeploySection, FetchConfig, ManifestSection, SiteMetadata, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{Result, SitepressError};
pub use types::{
    Chapter, ChapterId, Manifest, NavigationSummary, Page, PageRecord, SiteData,
};
