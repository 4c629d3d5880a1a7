//! Line protocol of the store executable.
//!
//! Output is one message per line. Only the first line starting with `+` or
//! `-` matters; everything after it is ignored.

use std::fmt;

/// Store command verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    InstallFromPath,
    Edit,
    Commit,
    Revert,
    Echo,
}

impl Verb {
    /// Spelling on the store's command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::InstallFromPath => "installfrompath",
            Verb::Edit => "edit",
            Verb::Commit => "commit",
            Verb::Revert => "revert",
            Verb::Echo => "echo",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First decisive line of a store reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decisive<'a> {
    Success(&'a str),
    Failure(&'a str),
}

fn lines(stdout: &str) -> impl Iterator<Item = &str> {
    stdout.split('\n').map(|line| line.trim_end_matches('\r'))
}

/// Scan `stdout` for the first `+` or `-` line.
pub fn first_decisive(stdout: &str) -> Option<Decisive<'_>> {
    lines(stdout).find_map(|line| {
        if line.starts_with('-') {
            Some(Decisive::Failure(line))
        } else if line.starts_with('+') {
            Some(Decisive::Success(line))
        } else {
            None
        }
    })
}

/// Text after the first `:` that follows the first `>`, trimmed.
///
/// Used for failure messages and for the directory returned by `edit`. When a
/// delimiter is missing the search starts from the beginning of the remaining
/// text instead.
pub fn tagged_text(line: &str) -> &str {
    let after_tag = line.split_once('>').map_or(line, |(_, rest)| rest);
    after_tag
        .split_once(':')
        .map_or(after_tag, |(_, rest)| rest)
        .trim()
}

/// Text between the first `<` and the next `>`.
pub fn bracketed(line: &str) -> Option<&str> {
    let (_, rest) = line.split_once('<')?;
    Some(rest.split('>').next().unwrap_or(rest))
}

/// `true` if some output line equals `text` verbatim.
pub fn echoed(stdout: &str, text: &str) -> bool {
    lines(stdout).any(|line| line == text)
}
