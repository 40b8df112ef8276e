//! Package and deploy a generated site.
//!
//! This crate provides:
//! - [`archive`]: zips a build directory's contents
//! - [`upload`]: authenticated multipart upload to the deployer endpoint
//! - [`orchestrator`]: build, upload, then remove the bundle on every exit path

pub mod archive;
pub mod orchestrator;
pub mod upload;

pub use archive::{ArchiveSummary, build_archive};
pub use orchestrator::{
    ArchiveGuard, CleanupStatus, DeployProgress, DeployReport, DeployRun, DeployState,
    DeploymentOrchestrator, SilentProgress,
};
pub use upload::{BUNDLE_CONTENT_TYPE, BUNDLE_FILE_NAME, UploadOptions, Uploader};
