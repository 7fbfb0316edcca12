use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Scripts configured for one project.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProjectSpec {
    /// Build phase, run in the project's working directory.
    #[serde(default, alias = "Before")]
    pub before: String,
    /// Post-build phase, only run when the build phase succeeded.
    #[serde(default, alias = "After")]
    pub after: String,
}

/// Result of the most recently recorded phase of a project.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildRecord {
    pub output: String,
    pub error: Option<String>,
    /// `None` until an attempt completes its build phase, and again while a
    /// new attempt is in flight.
    pub finished_at: Option<DateTime<Utc>>,
}

impl BuildRecord {
    pub fn state(&self) -> BuildState {
        BuildState::of(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Pending,
    Passing,
    Failing,
}

impl BuildState {
    /// The single place project state is derived from a record.
    pub fn of(record: &BuildRecord) -> Self {
        match (&record.finished_at, &record.error) {
            (None, _) => Self::Pending,
            (Some(_), None) => Self::Passing,
            (Some(_), Some(_)) => Self::Failing,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Passing => "passing",
            Self::Failing => "failing",
        }
    }

    /// Badge asset served for this state.
    pub fn badge_file(&self) -> &'static str {
        match self {
            Self::Pending => "pending.png",
            Self::Passing => "passing.png",
            Self::Failing => "failing.png",
        }
    }

    pub const ALL: [BuildState; 3] = [Self::Pending, Self::Passing, Self::Failing];
}

/// Answer to a trigger request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The project was idle; a new attempt is running.
    Started,
    /// An attempt is running; one follow-up attempt will run after it.
    Queued,
    /// No project by that name. Nothing was scheduled.
    UnknownProject,
}
