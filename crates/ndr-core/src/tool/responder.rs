//! Answers a yes/no question printed by an interactive tool.
//!
//! Output arrives in arbitrary chunks, so a question can be split across two
//! reads. The responder keeps the last few lines it has seen and matches the
//! question against `tail + chunk`. It fires at most once per run.

/// Lines of earlier output kept for matching questions split across reads.
const DEFAULT_HISTORY_LINES: usize = 3;

#[derive(Debug, Clone)]
pub struct PromptResponder {
    question: String,
    response: String,
    history_lines: usize,
    tail: String,
    fired: bool,
}

impl PromptResponder {
    /// Respond with `response` (plus a newline) once `question` is seen.
    pub fn new(question: &str, response: &str) -> Self {
        Self {
            question: question.to_string(),
            response: response.to_string(),
            history_lines: DEFAULT_HISTORY_LINES,
            tail: String::new(),
            fired: false,
        }
    }

    pub fn with_history_lines(mut self, lines: usize) -> Self {
        self.history_lines = lines.max(1);
        self
    }

    /// Feed a new chunk of stdout. Returns the text to write to stdin on the
    /// first match, `None` otherwise.
    pub fn feed(&mut self, chunk: &str) -> Option<String> {
        if self.fired {
            return None;
        }
        let mut window = std::mem::take(&mut self.tail);
        window.push_str(chunk);

        if window.contains(&self.question) {
            self.fired = true;
            return Some(format!("{}\n", self.response));
        }

        let cut = window
            .rmatch_indices('\n')
            .nth(self.history_lines)
            .map(|(i, _)| i + 1)
            .unwrap_or(0);
        self.tail = window[cut..].to_string();
        None
    }

    pub fn fired(&self) -> bool {
        self.fired
    }

    pub fn question(&self) -> &str {
        &self.question
    }
}
