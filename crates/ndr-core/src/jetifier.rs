//! Detection of legacy support-library artifacts that need the Jetifier
//! namespace rewrite.

use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::prompt::Question;

fn legacy_namespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(com\.android\.support|android\.arch)\..*\.(aar|jar|srcaar)$")
            .expect("valid regex")
    })
}

/// What to do after a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JetifierDecision {
    /// No legacy artifacts, or the rewrite was enabled before this pass.
    NotNeeded,
    /// Legacy artifacts found with the rewrite off: ask the user.
    Prompt(Vec<PathBuf>),
    /// Legacy artifacts remain after the single retry; never ask twice.
    AlreadyRetried,
}

/// Copied files whose names fall in a legacy namespace.
pub fn legacy_artifacts(copied: &[PathBuf]) -> Vec<PathBuf> {
    copied
        .iter()
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| legacy_namespace().is_match(n))
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

/// `already_retried` is checked before `enabled`, since the retry itself runs
/// with the rewrite on.
pub fn decide(copied: &[PathBuf], enabled: bool, already_retried: bool) -> JetifierDecision {
    let legacy = legacy_artifacts(copied);
    if legacy.is_empty() {
        JetifierDecision::NotNeeded
    } else if already_retried {
        JetifierDecision::AlreadyRetried
    } else if enabled {
        JetifierDecision::NotNeeded
    } else {
        JetifierDecision::Prompt(legacy)
    }
}

pub fn question(legacy: &[PathBuf]) -> Question {
    let names: Vec<String> = legacy
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect();
    Question::new(
        "Enable Jetifier?",
        &format!(
            "These libraries use the legacy support namespace and will not link against \
             AndroidX libraries unless Jetifier rewrites them:\n{}\n\n\
             Enable Jetifier and fetch again? Declining removes the fetched libraries.",
            names.join("\n")
        ),
    )
    .with_choices("Enable", "Disable")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| PathBuf::from("dest").join(n)).collect()
    }

    #[test]
    fn pattern_matches_legacy_namespaces_only() {
        let copied = paths(&[
            "com.android.support.support-v4-27.1.0.aar",
            "android.arch.lifecycle.runtime-1.1.0.srcaar",
            "androidx.core.core-1.0.0.aar",
            "com.android.support.notes.txt",
            "com.google.firebase.firebase-common-16.0.0.jar",
        ]);
        let legacy = legacy_artifacts(&copied);
        assert_eq!(legacy, copied[..2].to_vec());
    }

    #[test]
    fn decision_table() {
        let legacy = paths(&["com.android.support.appcompat-v7-27.1.0.aar"]);
        let clean = paths(&["androidx.core.core-1.0.0.aar"]);
        assert_eq!(decide(&clean, false, false), JetifierDecision::NotNeeded);
        assert_eq!(decide(&legacy, true, false), JetifierDecision::NotNeeded);
        assert_eq!(decide(&legacy, false, false), JetifierDecision::Prompt(legacy.clone()));
        assert_eq!(decide(&legacy, false, true), JetifierDecision::AlreadyRetried);
        assert_eq!(decide(&legacy, true, true), JetifierDecision::AlreadyRetried);
        assert_eq!(decide(&clean, true, true), JetifierDecision::NotNeeded);
    }

    #[test]
    fn question_names_the_files() {
        let q = question(&paths(&["com.android.support.support-v4-27.1.0.aar"]));
        assert!(q.message.contains("support-v4-27.1.0.aar"));
        assert_eq!(q.accept, "Enable");
    }
}
