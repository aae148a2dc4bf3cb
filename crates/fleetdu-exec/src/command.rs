//! Structured command lines.
//!
//! Commands are kept as argument vectors until the very last moment. When a
//! command has to travel as a single shell string (through ssh, or through
//! `sh -c` for pipelines), every word is quoted on the way out, so paths and
//! patterns can never inject shell syntax.

use std::borrow::Cow;
use std::fmt;

use itertools::Itertools;

/// One or more argument vectors joined by pipes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    stages: Vec<Vec<String>>,
}

impl ShellCommand {
    /// Create a single-stage command.
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            stages: vec![argv.into_iter().map(Into::into).collect()],
        }
    }

    /// Pipe this command's output into another stage.
    pub fn pipe<I, S>(mut self, argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stages.push(argv.into_iter().map(Into::into).collect());
        self
    }

    /// All stages, in pipe order.
    pub fn stages(&self) -> &[Vec<String>] {
        &self.stages
    }

    /// The argument vector when this is a single-stage command.
    pub fn argv(&self) -> Option<&[String]> {
        match self.stages.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    /// Whether this command needs a shell to wire up pipes.
    pub fn is_pipeline(&self) -> bool {
        self.stages.len() > 1
    }

    /// Render as a POSIX shell string with every word quoted.
    pub fn render(&self) -> String {
        self.stages
            .iter()
            .map(|stage| stage.iter().map(|w| quote(w)).join(" "))
            .join(" | ")
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Quote a word for a POSIX shell.
///
/// Words made only of unambiguous characters pass through unchanged; anything
/// else is wrapped in single quotes, with embedded single quotes spliced in
/// as `'"'"'`.
pub fn quote(word: &str) -> Cow<'_, str> {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "@%+=:,./-_".contains(c));

    if safe {
        Cow::Borrowed(word)
    } else {
        Cow::Owned(format!("'{}'", word.replace('\'', r#"'"'"'"#)))
    }
}
