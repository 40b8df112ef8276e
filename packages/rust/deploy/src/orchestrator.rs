//! Deployment orchestration: build → upload → clean up.
//!
//! ```text
//! Idle ──(invalid config)──────────────────────────────► Failed
//!  │
//!  └─► Building ──► Uploading ──► CleaningUp ──► Succeeded
//!         │             │              ▲
//!         └─────────────┴──(error)─────┴────────────────► Failed
//! ```
//!
//! Once `Building` is entered the bundle path is held by an [`ArchiveGuard`],
//! so it is removed exactly once on every way out, including early returns
//! and panics.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use sitepress_shared::{DeployConfig, Result, SitepressError};

use crate::archive::{ArchiveSummary, build_archive};
use crate::upload::{UploadOptions, Uploader};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Deployment lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployState {
    Idle,
    Building,
    Uploading,
    CleaningUp,
    Succeeded,
    Failed,
}

impl DeployState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl std::fmt::Display for DeployState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Building => "building",
            Self::Uploading => "uploading",
            Self::CleaningUp => "cleaning up",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for reporting deployment status.
pub trait DeployProgress: Send + Sync {
    /// Called on every state transition.
    fn state_changed(&self, state: DeployState);
    /// Called once the bundle has been written.
    fn archive_built(&self, summary: &ArchiveSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl DeployProgress for SilentProgress {
    fn state_changed(&self, _state: DeployState) {}
    fn archive_built(&self, _summary: &ArchiveSummary) {}
}

// ---------------------------------------------------------------------------
// Archive guard
// ---------------------------------------------------------------------------

/// What happened to the bundle file during cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupStatus {
    /// The run never reached `Building`; there was nothing to release.
    NotNeeded,
    /// The bundle was deleted.
    Removed,
    /// No bundle existed at the path.
    Absent,
    /// Deletion failed. Logged; the run outcome is unaffected.
    Failed(String),
}

/// Scoped ownership of the bundle path for one run.
///
/// [`release`](Self::release) deletes the file and reports what happened. If
/// the guard is dropped without being released, `Drop` deletes it instead.
#[derive(Debug)]
pub struct ArchiveGuard {
    path: PathBuf,
    released: bool,
}

impl ArchiveGuard {
    pub fn acquire(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            released: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the bundle if it exists.
    pub fn release(mut self) -> CleanupStatus {
        self.released = true;
        remove_bundle(&self.path)
    }
}

impl Drop for ArchiveGuard {
    fn drop(&mut self) {
        if !self.released {
            self.released = true;
            remove_bundle(&self.path);
        }
    }
}

fn remove_bundle(path: &Path) -> CleanupStatus {
    match std::fs::remove_file(path) {
        Ok(()) => {
            info!(path = %path.display(), "cleaned up temporary ZIP file");
            CleanupStatus::Removed
        }
        Err(e)
            if matches!(
                e.kind(),
                std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory
            ) =>
        {
            debug!(path = %path.display(), "no bundle to clean up");
            CleanupStatus::Absent
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to remove bundle");
            CleanupStatus::Failed(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Run result
// ---------------------------------------------------------------------------

/// Details of a successful deployment.
#[derive(Debug, Clone)]
pub struct DeployReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// The bundle that was uploaded (already deleted by now).
    pub archive: ArchiveSummary,
    /// Free-form confirmation text returned by the deployer.
    pub response: String,
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct DeployRun {
    pub run_id: Uuid,
    /// Terminal state: `Succeeded` or `Failed`.
    pub state: DeployState,
    /// Every state the run passed through, starting with `Idle`.
    pub history: Vec<DeployState>,
    pub cleanup: CleanupStatus,
    pub outcome: Result<DeployReport>,
    pub elapsed: std::time::Duration,
}

impl DeployRun {
    pub fn succeeded(&self) -> bool {
        self.state == DeployState::Succeeded
    }

    /// Drop the bookkeeping and keep only the outcome.
    pub fn into_result(self) -> Result<DeployReport> {
        self.outcome
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// One deployment run. Consumed by [`run`](Self::run); build a new one for the
/// next deployment.
pub struct DeploymentOrchestrator {
    config: DeployConfig,
    upload: UploadOptions,
    run_id: Uuid,
    state: DeployState,
    history: Vec<DeployState>,
}

impl DeploymentOrchestrator {
    pub fn new(config: DeployConfig, upload: UploadOptions) -> Self {
        Self {
            config,
            upload,
            run_id: Uuid::now_v7(),
            state: DeployState::Idle,
            history: vec![DeployState::Idle],
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn state(&self) -> DeployState {
        self.state
    }

    /// Run the deployment to a terminal state.
    ///
    /// Never returns early with `Err`: every failure is captured in
    /// [`DeployRun::outcome`] after cleanup has run.
    #[instrument(
        skip_all,
        fields(run_id = %self.run_id, source = %self.config.source_dir.display())
    )]
    pub async fn run(mut self, progress: &dyn DeployProgress) -> DeployRun {
        let start = Instant::now();
        let started_at = Utc::now();

        info!(
            build_dir = %self.config.source_dir.display(),
            target = %self.config.endpoint_url,
            "starting deployment"
        );

        let endpoint = match self.config.validate() {
            Ok(endpoint) => endpoint,
            Err(e) => {
                error!(error = %e, "invalid deploy configuration");
                self.transition(DeployState::Failed, progress);
                return self.finish(Err(e), CleanupStatus::NotNeeded, start);
            }
        };

        let guard = ArchiveGuard::acquire(&self.config.archive_path);
        let result = self.build_and_upload(&endpoint, progress).await;

        self.transition(DeployState::CleaningUp, progress);
        let cleanup = guard.release();

        let outcome = match result {
            Ok((archive, response)) => {
                self.transition(DeployState::Succeeded, progress);
                info!(files = archive.files, "deployment successful");
                Ok(DeployReport {
                    run_id: self.run_id,
                    started_at,
                    finished_at: Utc::now(),
                    archive,
                    response,
                })
            }
            Err(e) => {
                self.transition(DeployState::Failed, progress);
                error!(kind = e.kind(), error = %e, "deployment failed");
                Err(e)
            }
        };

        self.finish(outcome, cleanup, start)
    }

    async fn build_and_upload(
        &mut self,
        endpoint: &Url,
        progress: &dyn DeployProgress,
    ) -> Result<(ArchiveSummary, String)> {
        self.transition(DeployState::Building, progress);

        let source = self.config.source_dir.clone();
        let archive_path = self.config.archive_path.clone();
        let summary = tokio::task::spawn_blocking(move || build_archive(&source, &archive_path))
            .await
            .map_err(|e| {
                SitepressError::archive(
                    &self.config.archive_path,
                    format!("archive task failed: {e}"),
                )
            })??;
        progress.archive_built(&summary);

        self.transition(DeployState::Uploading, progress);
        info!(target = %endpoint, "uploading");

        let uploader = Uploader::new(&self.upload)?;
        let response = uploader
            .upload(endpoint, &self.config.shared_secret, &summary.path)
            .await?;

        Ok((summary, response))
    }

    fn transition(&mut self, next: DeployState, progress: &dyn DeployProgress) {
        debug!(from = %self.state, to = %next, "state transition");
        self.state = next;
        self.history.push(next);
        progress.state_changed(next);
    }

    fn finish(
        self,
        outcome: Result<DeployReport>,
        cleanup: CleanupStatus,
        start: Instant,
    ) -> DeployRun {
        DeployRun {
            run_id: self.run_id,
            state: self.state,
            history: self.history,
            cleanup,
            outcome,
            elapsed: start.elapsed(),
        }
    }
}
