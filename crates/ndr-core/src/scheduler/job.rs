//! Resolution job types.

use async_trait::async_trait;

use crate::resolve::ResolutionOutcome;

/// Who asked for a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Raised by a change in the project; collapsible.
    Automatic,
    /// Requested by the user; never dropped.
    Explicit,
}

impl Trigger {
    pub fn as_str(self) -> &'static str {
        match self {
            Trigger::Automatic => "automatic",
            Trigger::Explicit => "explicit",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "automatic" => Trigger::Automatic,
            _ => Trigger::Explicit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionRequest {
    pub trigger: Trigger,
    /// Resolve even if nothing changed since the last pass.
    pub force: bool,
}

impl ResolutionRequest {
    pub fn explicit(force: bool) -> Self {
        Self {
            trigger: Trigger::Explicit,
            force,
        }
    }

    pub fn automatic() -> Self {
        Self {
            trigger: Trigger::Automatic,
            force: false,
        }
    }
}

/// What a submitter eventually receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobResult {
    Finished(ResolutionOutcome),
    /// Superseded by a newer automatic request before it started.
    Cancelled,
}

/// One full resolution pass; implemented by the resolver.
#[async_trait]
pub trait ResolutionPass: Send + Sync {
    async fn resolve(&self, force: bool) -> ResolutionOutcome;
}
