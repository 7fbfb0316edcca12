//! Read-only views of the registry for the status page and the badge.
//!
//! Both go through `BuildState::of` on a single snapshot, so the page and the
//! badge can never disagree about a project.

use chrono::{DateTime, Utc};

use super::models::BuildState;
use super::registry::ProjectRegistry;

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectStatus {
    pub state: BuildState,
    pub last_build_time: Option<DateTime<Utc>>,
    pub output: String,
    pub error: Option<String>,
}

/// Status of a known project, `None` for names not in the registry.
pub fn project_status(registry: &ProjectRegistry, name: &str) -> Option<ProjectStatus> {
    let entry = registry.get(name)?;
    let record = entry.snapshot();
    Some(ProjectStatus {
        state: record.state(),
        last_build_time: record.finished_at,
        output: record.output,
        error: record.error,
    })
}

/// Badge selector. Unknown projects look pending so the badge never errors.
pub fn badge_state(registry: &ProjectRegistry, name: &str) -> BuildState {
    registry
        .get(name)
        .map(|entry| entry.state())
        .unwrap_or(BuildState::Pending)
}
