//! Interactive prompts on stdin/stdout.

use ndr_core::prompt::{Prompter, Question};
use std::io::{self, BufRead, Write};
use tokio::runtime::{Handle, RuntimeFlavor};

/// Asks on the terminal. EOF or an unreadable stdin counts as "decline".
pub struct ConsolePrompter;

fn parse_answer(line: &str, question: &Question) -> Option<bool> {
    let answer = line.trim().to_ascii_lowercase();
    if answer.is_empty() {
        return None;
    }
    if answer == "y" || answer == "yes" || answer == question.accept.to_ascii_lowercase() {
        Some(true)
    } else if answer == "n" || answer == "no" || answer == question.decline.to_ascii_lowercase() {
        Some(false)
    } else {
        None
    }
}

/// Ask until an answer parses, or the input ends.
fn ask<R: BufRead, W: Write>(question: &Question, input: &mut R, output: &mut W) -> bool {
    let _ = writeln!(output, "\n{}\n{}", question.title, question.message);
    loop {
        let _ = write!(output, "[{}/{}]: ", question.accept, question.decline);
        let _ = output.flush();
        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) | Err(_) => {
                tracing::warn!("no answer to '{}', declining", question.title);
                return false;
            }
            Ok(_) => {}
        }
        if let Some(answer) = parse_answer(&line, question) {
            tracing::info!(answer, "{}", question.title);
            return answer;
        }
    }
}

/// Run a blocking read without stalling the runtime's other tasks.
fn blocking_read<T>(read: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(read)
        }
        _ => read(),
    }
}

impl Prompter for ConsolePrompter {
    fn confirm(&self, question: &Question) -> bool {
        blocking_read(|| ask(question, &mut io::stdin().lock(), &mut io::stdout()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::Duration;

    #[test]
    fn answers_accept_choice_labels() {
        let q = Question::new("Enable Jetifier?", "details").with_choices("Enable", "Disable");
        assert_eq!(parse_answer("enable\n", &q), Some(true));
        assert_eq!(parse_answer("Disable", &q), Some(false));
        assert_eq!(parse_answer(" y ", &q), Some(true));
        assert_eq!(parse_answer("no", &q), Some(false));
        assert_eq!(parse_answer("", &q), None);
        assert_eq!(parse_answer("maybe", &q), None);
    }

    #[test]
    fn ask_repeats_until_an_answer_parses() {
        let q = Question::new("Remove conflicting libraries?", "foo-1.0.aar")
            .with_choices("Delete", "Keep");
        let mut output = Vec::new();
        assert!(ask(&q, &mut Cursor::new("\nmaybe\ndelete\n"), &mut output));
        let shown = String::from_utf8(output).unwrap();
        assert_eq!(shown.matches("[Delete/Keep]: ").count(), 3);
        assert!(!ask(&q, &mut Cursor::new(""), &mut Vec::new()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn blocked_read_leaves_other_tasks_running() {
        let (tx, rx) = std::sync::mpsc::channel::<&str>();
        let ticker = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            tx.send("y\n").unwrap();
        });
        let q = Question::new("Enable Jetifier?", "details");
        let answer = blocking_read(|| {
            let line = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            ask(&q, &mut Cursor::new(line), &mut Vec::new())
        });
        assert!(answer);
        ticker.await.unwrap();
    }

    #[tokio::test]
    async fn current_thread_runtime_reads_inline() {
        let q = Question::new("Enable Jetifier?", "details");
        assert!(!blocking_read(|| ask(&q, &mut Cursor::new("n\n"), &mut Vec::new())));
    }
}
