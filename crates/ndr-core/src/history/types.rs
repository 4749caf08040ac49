//! Types stored in the history database.

use crate::scheduler::Trigger;

pub type RunId = i64;

/// Lifecycle of a scheduled resolution, stored as a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl RunState {
    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Queued => "queued",
            RunState::Running => "running",
            RunState::Completed => "completed",
            RunState::Failed => "failed",
            RunState::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "queued" => RunState::Queued,
            "running" => RunState::Running,
            "completed" => RunState::Completed,
            "cancelled" => RunState::Cancelled,
            _ => RunState::Failed,
        }
    }
}

/// One history row, as shown by `ndr history`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub id: RunId,
    pub trigger: Trigger,
    pub force: bool,
    pub state: RunState,
    pub created_at: i64,
    pub finished_at: Option<i64>,
    pub copied: i64,
    pub missing: i64,
    pub error: Option<String>,
}

/// Figures recorded when a run finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub copied: i64,
    pub missing: i64,
    pub error: Option<String>,
}
