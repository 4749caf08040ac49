//! Modal yes/no decisions requested by the pipeline (license acceptance,
//! Jetifier enablement, conflict cleanup). The CLI supplies an interactive
//! implementation; [`AutoPrompter`] answers without asking.

use std::sync::Mutex;

/// A binary choice shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub title: String,
    pub message: String,
    pub accept: String,
    pub decline: String,
}

impl Question {
    pub fn new(title: &str, message: &str) -> Self {
        Self {
            title: title.to_string(),
            message: message.to_string(),
            accept: "Yes".to_string(),
            decline: "No".to_string(),
        }
    }

    pub fn with_choices(mut self, accept: &str, decline: &str) -> Self {
        self.accept = accept.to_string();
        self.decline = decline.to_string();
        self
    }
}

pub trait Prompter: Send + Sync {
    /// Returns true when the user picks the accept option.
    fn confirm(&self, question: &Question) -> bool;

    /// Show license text and ask for acceptance.
    fn accept_license(&self, license: &str) -> bool {
        self.confirm(
            &Question::new("License agreement", license).with_choices("Accept", "Decline"),
        )
    }
}

/// Answers every question the same way and records the titles asked.
#[derive(Debug, Default)]
pub struct AutoPrompter {
    answer: bool,
    asked: Mutex<Vec<String>>,
}

impl AutoPrompter {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Titles of the questions asked so far.
    pub fn asked(&self) -> Vec<String> {
        self.asked
            .lock()
            .map(|a| a.clone())
            .unwrap_or_else(|p| p.into_inner().clone())
    }
}

impl Prompter for AutoPrompter {
    fn confirm(&self, question: &Question) -> bool {
        tracing::info!(
            answer = self.answer,
            "{}: {}",
            question.title,
            question.message.lines().next().unwrap_or_default()
        );
        match self.asked.lock() {
            Ok(mut asked) => asked.push(question.title.clone()),
            Err(p) => p.into_inner().push(question.title.clone()),
        }
        self.answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_prompter_records_questions() {
        let p = AutoPrompter::new(false);
        assert!(!p.confirm(&Question::new("Enable Jetifier?", "details")));
        assert!(!p.accept_license("terms"));
        assert_eq!(p.asked(), vec!["Enable Jetifier?", "License agreement"]);
    }
}
