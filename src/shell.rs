//! Interactive command loop.
//!
//! Grammar (one command per line, surrounding whitespace ignored):
//!
//! | Input            | Action                                              |
//! |------------------|-----------------------------------------------------|
//! | `ls`             | list `*.html` files in the project root             |
//! | `update resume`  | update the first existing conventional resume path  |
//! | `update <path>`  | update `<path>`, relative to the project root       |
//! | `exit`           | leave the loop (end of input does the same)         |
//!
//! Blank lines are ignored. Anything else prints a diagnostic and prompts
//! again; no input ends the process except `exit` or end of input.

use crate::operator::{Operator, Tone};
use crate::output::SyncOutcome;
use crate::sync::Synchronizer;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Empty,
    List,
    UpdateResume,
    Update(String),
    /// `update` with no argument.
    UpdateUsage,
    Exit,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        match line {
            "" => Command::Empty,
            "exit" => Command::Exit,
            "ls" => Command::List,
            "update" => Command::UpdateUsage,
            "update resume" => Command::UpdateResume,
            _ => match line.split_once(char::is_whitespace) {
                Some(("update", rest)) if !rest.trim().is_empty() => {
                    Command::Update(rest.trim().to_string())
                }
                Some(("update", _)) => Command::UpdateUsage,
                _ => Command::Unknown(line.to_string()),
            },
        }
    }
}

pub const HELP: &str = "Commands:
  update <htmlfile>  - Update specific HTML file
  update resume      - Update the resume page (common paths)
  ls                 - List HTML files in root
  exit               - Exit program";

/// The read–evaluate loop over a project root.
pub struct Shell {
    root: PathBuf,
    synchronizer: Synchronizer,
}

impl Shell {
    pub fn new(root: impl Into<PathBuf>, synchronizer: Synchronizer) -> Self {
        Self {
            root: root.into(),
            synchronizer,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn synchronizer(&self) -> &Synchronizer {
        &self.synchronizer
    }

    /// Run until `exit` or end of input.
    pub fn run(&mut self, operator: &mut dyn Operator) {
        operator.notify(Tone::Info, &format!("\nProject root: {}", self.root.display()));
        operator.notify(Tone::Info, HELP);

        while let Some(line) = operator.read_line("\n> ") {
            if !self.execute(Command::parse(&line), operator) {
                return;
            }
        }
        debug!("End of input, leaving shell");
    }

    /// Execute one command. Returns `false` when the loop should stop.
    pub fn execute(&mut self, command: Command, operator: &mut dyn Operator) -> bool {
        match command {
            Command::Empty => {}
            Command::Exit => return false,
            Command::List => self.list(operator),
            Command::UpdateUsage => operator.notify(Tone::Warning, "Usage: update <htmlfile>"),
            Command::UpdateResume => {
                match self.find_resume() {
                    Some(rel) => {
                        self.update(&rel, operator);
                    }
                    None => operator.notify(
                        Tone::Error,
                        "✗ Could not find resume.html. Try 'update <fullpath>'",
                    ),
                }
            }
            Command::Update(path) => {
                self.update(Path::new(&path), operator);
            }
            Command::Unknown(_) => operator.notify(Tone::Warning, "Unknown command."),
        }
        true
    }

    fn update(&mut self, rel: &Path, operator: &mut dyn Operator) -> SyncOutcome {
        self.synchronizer.update(&self.root, rel, operator)
    }

    /// First configured candidate that exists under the root.
    pub fn find_resume(&self) -> Option<PathBuf> {
        self.synchronizer
            .config()
            .resume_candidates
            .iter()
            .find(|rel| self.root.join(rel).exists())
            .cloned()
    }

    fn list(&self, operator: &mut dyn Operator) {
        match html_files(&self.root) {
            Ok(files) if files.is_empty() => operator.notify(Tone::Info, "  (no HTML files)"),
            Ok(files) => {
                for file in files {
                    operator.notify(Tone::Info, &format!("  {file}"));
                }
            }
            Err(e) => operator.notify(
                Tone::Error,
                &format!("✗ Cannot list {}: {e}", self.root.display()),
            ),
        }
    }
}

/// Names of `*.html` entries directly under `root`, sorted.
pub fn html_files(root: &Path) -> std::io::Result<Vec<String>> {
    let mut names: Vec<String> = std::fs::read_dir(root)?
        .filter_map(Result::ok)
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".html"))
        .collect();
    names.sort();
    Ok(names)
}
