//! Failure taxonomy of a resolution pass.
//!
//! None of these escape the pipeline as `Err`: each one ends up in the
//! [`ResolutionOutcome`](crate::resolve::ResolutionOutcome) handed back to the
//! caller.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// Missing or invalid SDK root, unreadable project layout. Raised before
    /// any external tool runs.
    #[error("environment error: {0}")]
    Environment(String),
    /// The fetch tool could not be started or exited non-zero.
    #[error("`{command}` failed: {detail}")]
    ToolInvocation { command: String, detail: String },
    /// Platform packages could not be installed.
    #[error("failed to install {} (required by {})", .packages.join(", "), .dependents.join(", "))]
    Install {
        packages: Vec<String>,
        dependents: Vec<String>,
    },
    /// Some files in a deletion batch could not be removed.
    #[error("failed to delete {} path(s): {}", .failures.len(), .failures.join("; "))]
    Cleanup { failures: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_list_every_item() {
        let err = ResolveError::Install {
            packages: vec!["extras;google;m2repository".into()],
            dependents: vec!["a:b:1".into(), "c:d:2".into()],
        };
        assert_eq!(
            err.to_string(),
            "failed to install extras;google;m2repository (required by a:b:1, c:d:2)"
        );
        let err = ResolveError::Cleanup {
            failures: vec!["x: denied".into(), "y: busy".into()],
        };
        assert_eq!(err.to_string(), "failed to delete 2 path(s): x: denied; y: busy");
    }
}
