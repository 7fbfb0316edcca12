use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use tokio::sync::watch;

use super::models::{BuildRecord, BuildState, ProjectSpec};
use crate::errors::ConfigError;

/// Names double as directory names and URL path segments.
static PROJECT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("project name pattern is valid")
});

pub fn is_valid_project_name(name: &str) -> bool {
    PROJECT_NAME.is_match(name)
}

/// Whether a project has an attempt in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildSlot {
    Idle,
    Running,
    /// Running, and another trigger arrived meanwhile.
    RerunRequested,
}

/// What a trigger got when it tried to claim the build slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotClaim {
    Start,
    Queued,
}

/// One configured project and its last recorded build.
pub struct ProjectEntry {
    name: String,
    spec: ProjectSpec,
    record: RwLock<BuildRecord>,
    slot: watch::Sender<BuildSlot>,
}

impl ProjectEntry {
    pub fn new(name: impl Into<String>, spec: ProjectSpec) -> Self {
        let (slot, _) = watch::channel(BuildSlot::Idle);
        Self {
            name: name.into(),
            spec,
            record: RwLock::new(BuildRecord::default()),
            slot,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &ProjectSpec {
        &self.spec
    }

    /// Consistent copy of the `(output, error, finished_at)` triple.
    pub fn snapshot(&self) -> BuildRecord {
        self.record
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn state(&self) -> BuildState {
        self.snapshot().state()
    }

    pub fn slot(&self) -> BuildSlot {
        *self.slot.borrow()
    }

    /// Resolves once no attempt is running or queued for this project.
    pub async fn wait_idle(&self) {
        let mut rx = self.slot.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|slot| *slot == BuildSlot::Idle).await;
    }

    pub(crate) fn mark_pending(&self) {
        self.write().finished_at = None;
    }

    pub(crate) fn record_build(
        &self,
        output: String,
        error: Option<String>,
        finished_at: DateTime<Utc>,
    ) {
        *self.write() = BuildRecord {
            output,
            error,
            finished_at: Some(finished_at),
        };
    }

    /// Post-build failures replace the visible output and error but keep the
    /// build phase's completion time.
    pub(crate) fn record_post_build_failure(&self, output: String, error: String) {
        let mut record = self.write();
        record.output = output;
        record.error = Some(error);
    }

    pub(crate) fn claim(&self) -> SlotClaim {
        let mut claim = SlotClaim::Start;
        self.slot.send_modify(|slot| {
            *slot = match *slot {
                BuildSlot::Idle => BuildSlot::Running,
                BuildSlot::Running | BuildSlot::RerunRequested => {
                    claim = SlotClaim::Queued;
                    BuildSlot::RerunRequested
                }
            };
        });
        claim
    }

    /// Ends the current attempt. Returns `true` when a queued follow-up
    /// should run now; the slot then stays `Running`.
    pub(crate) fn finish_attempt(&self) -> bool {
        let mut rerun = false;
        self.slot.send_modify(|slot| {
            *slot = match *slot {
                BuildSlot::RerunRequested => {
                    rerun = true;
                    BuildSlot::Running
                }
                BuildSlot::Running | BuildSlot::Idle => BuildSlot::Idle,
            };
        });
        rerun
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BuildRecord> {
        self.record.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ProjectEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectEntry")
            .field("name", &self.name)
            .field("slot", &self.slot())
            .field("state", &self.state())
            .finish()
    }
}

/// Every configured project, keyed by name. Membership is fixed at startup.
#[derive(Debug, Default)]
pub struct ProjectRegistry {
    projects: BTreeMap<String, Arc<ProjectEntry>>,
}

impl ProjectRegistry {
    pub fn from_specs(specs: BTreeMap<String, ProjectSpec>) -> Result<Self, ConfigError> {
        let mut projects = BTreeMap::new();
        for (name, spec) in specs {
            if !is_valid_project_name(&name) {
                return Err(ConfigError::InvalidProjectName { name });
            }
            let entry = Arc::new(ProjectEntry::new(name.clone(), spec));
            projects.insert(name, entry);
        }
        Ok(Self { projects })
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ProjectEntry>> {
        self.projects.get(name)
    }

    /// Project names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.projects.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}
