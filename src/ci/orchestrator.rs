use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{error, info, warn};

use super::models::{BuildState, TriggerOutcome};
use super::registry::{ProjectEntry, ProjectRegistry, SlotClaim};
use super::runner::{ScriptOutcome, ScriptRunner};
use crate::errors::RunnerError;

/// Runs build attempts and owns the per-project trigger protocol.
///
/// An attempt is two shell phases in `workspace_dir/<project>`: the build
/// phase (`before`) and, only if that succeeded, the post-build phase
/// (`after`). Attempts for one project never overlap; a trigger that
/// arrives mid-attempt is folded into a single follow-up attempt.
pub struct BuildOrchestrator {
    registry: Arc<ProjectRegistry>,
    runner: Arc<dyn ScriptRunner>,
    workspace_dir: PathBuf,
}

impl BuildOrchestrator {
    pub fn new(
        registry: Arc<ProjectRegistry>,
        runner: Arc<dyn ScriptRunner>,
        workspace_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            registry,
            runner,
            workspace_dir: workspace_dir.into(),
        }
    }

    pub fn registry(&self) -> &Arc<ProjectRegistry> {
        &self.registry
    }

    /// Working directory for a project's scripts.
    pub fn project_dir(&self, name: &str) -> PathBuf {
        self.workspace_dir.join(name)
    }

    /// Schedule an attempt without waiting for it.
    pub fn trigger(self: &Arc<Self>, name: &str) -> TriggerOutcome {
        let Some(entry) = self.registry.get(name).cloned() else {
            warn!(project = %name, "trigger for unknown project ignored");
            return TriggerOutcome::UnknownProject;
        };

        match entry.claim() {
            SlotClaim::Queued => {
                info!(project = %name, "build in progress, follow-up queued");
                TriggerOutcome::Queued
            }
            SlotClaim::Start => {
                tokio::spawn(Arc::clone(self).drive(entry));
                TriggerOutcome::Started
            }
        }
    }

    /// Run attempts until no follow-up is queued, then free the slot.
    ///
    /// Each attempt runs in its own task so a panicking runner still ends
    /// the attempt and releases the slot.
    async fn drive(self: Arc<Self>, entry: Arc<ProjectEntry>) {
        loop {
            let attempt = {
                let this = Arc::clone(&self);
                let entry = Arc::clone(&entry);
                tokio::spawn(async move { this.attempt(&entry).await })
            };
            if let Err(e) = attempt.await {
                error!(project = %entry.name(), error = %e, "build attempt aborted");
                let message = format!("build aborted: {e}");
                entry.record_build(String::new(), Some(message), Utc::now());
            }
            if !entry.finish_attempt() {
                break;
            }
            info!(project = %entry.name(), "running queued follow-up build");
        }
    }

    /// Run one attempt for `name` and wait for it. Returns `None` for an
    /// unknown project.
    ///
    /// This bypasses the build slot; callers that may race with `trigger`
    /// should go through `trigger` instead.
    pub async fn run_attempt(&self, name: &str) -> Option<BuildState> {
        let entry = self.registry.get(name)?;
        Some(self.attempt(entry).await)
    }

    async fn attempt(&self, entry: &ProjectEntry) -> BuildState {
        let name = entry.name();
        let dir = self.project_dir(name);
        entry.mark_pending();
        info!(project = %name, dir = %dir.display(), "build started");

        let build = match tokio::fs::create_dir_all(&dir).await {
            Ok(()) => self.phase(name, "build", &dir, &entry.spec().before).await,
            Err(source) => ScriptOutcome::failed(
                String::new(),
                RunnerError::WorkingDir {
                    path: dir.clone(),
                    source,
                },
            ),
        };
        let build_ok = build.succeeded();
        let build_error = build.error_text();
        if let Some(err) = &build_error {
            warn!(project = %name, error = %err, "build phase failed");
        }
        entry.record_build(build.output, build_error, Utc::now());

        if !build_ok {
            return BuildState::Failing;
        }

        let post = self
            .phase(name, "post-build", &dir, &entry.spec().after)
            .await;
        if let Some(err) = post.error_text() {
            warn!(project = %name, error = %err, "post-build phase failed");
            entry.record_post_build_failure(post.output, err);
        }

        let state = entry.state();
        info!(project = %name, state = state.as_str(), "build finished");
        state
    }

    async fn phase(&self, project: &str, phase: &str, dir: &Path, script: &str) -> ScriptOutcome {
        let started = Instant::now();
        let outcome = self.runner.run(dir, script).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            project = %project,
            phase,
            success = outcome.succeeded(),
            elapsed_ms,
            "phase completed"
        );
        outcome
    }
}
