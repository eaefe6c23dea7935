//! The human at the terminal.
//!
//! Everything the update flow and the shell need from the operator goes
//! through [`Operator`]: reading a line, asking a yes/no question, showing a
//! message. [`ConsoleOperator`] talks to stdin/stdout; tests script it.

use std::io::{self, BufRead, Write};

/// Severity of an operator-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Success,
    Warning,
    Error,
}

pub trait Operator {
    /// Show `prompt` and read one line. `None` means end of input.
    fn read_line(&mut self, prompt: &str) -> Option<String>;

    /// Show a message.
    fn notify(&mut self, tone: Tone, message: &str);

    /// Ask a yes/no question. Only `y`/`Y` counts as yes; anything else,
    /// including an empty line or end of input, is no.
    fn confirm(&mut self, question: &str) -> bool {
        self.read_line(&format!("{question} (y/N): "))
            .map(|answer| answer.trim().eq_ignore_ascii_case("y"))
            .unwrap_or(false)
    }
}

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}

/// [`Operator`] on the process's stdin and stdout.
#[derive(Debug, Default)]
pub struct ConsoleOperator {
    color: bool,
}

impl ConsoleOperator {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, tone: Tone, message: &str) -> String {
        if !self.color {
            return message.to_string();
        }
        match tone {
            Tone::Info => message.to_string(),
            Tone::Success => green(message),
            Tone::Warning => yellow(message),
            Tone::Error => red(message),
        }
    }
}

impl Operator for ConsoleOperator {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        let mut stdout = io::stdout().lock();
        // A broken stdout only loses the prompt text.
        let _ = stdout.write_all(prompt.as_bytes());
        let _ = stdout.flush();
        drop(stdout);

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }

    fn notify(&mut self, tone: Tone, message: &str) {
        let text = self.paint(tone, message);
        match tone {
            Tone::Error => eprintln!("{text}"),
            _ => println!("{text}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct Canned(VecDeque<String>);

    impl Operator for Canned {
        fn read_line(&mut self, _prompt: &str) -> Option<String> {
            self.0.pop_front()
        }
        fn notify(&mut self, _tone: Tone, _message: &str) {}
    }

    fn canned(lines: &[&str]) -> Canned {
        Canned(lines.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn only_y_confirms() {
        assert!(canned(&["y"]).confirm("Apply?"));
        assert!(canned(&[" Y "]).confirm("Apply?"));
        assert!(!canned(&["yes"]).confirm("Apply?"));
        assert!(!canned(&[""]).confirm("Apply?"));
        assert!(!canned(&["n"]).confirm("Apply?"));
    }

    #[test]
    fn end_of_input_declines() {
        assert!(!canned(&[]).confirm("Apply?"));
    }

    #[test]
    fn plain_console_does_not_colour() {
        let op = ConsoleOperator::new(false);
        assert_eq!(op.paint(Tone::Error, "boom"), "boom");
        let op = ConsoleOperator::new(true);
        assert!(op.paint(Tone::Error, "boom").contains("\x1b[31m"));
    }
}
