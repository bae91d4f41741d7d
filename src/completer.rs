//! Completion of the word under the cursor.

use crate::env::expand_tilde_with;
use rustyline::completion::Pair;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::fs;
use std::path::{Path, PathBuf};

/// What a candidate completes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    Command,
    Alias,
    Bookmark,
    File,
    Directory,
}

/// A single completion suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Text that replaces the input from `start` up to the cursor.
    pub replacement: String,
    /// Text shown in the completion list.
    pub display: String,
    pub kind: CandidateKind,
    /// Byte offset in the line where replacement begins.
    pub start: usize,
}

/// Names known at the time of the snapshot.
///
/// Taken after every dispatched line, so aliases and bookmarks created by that
/// line are offered on the next one.
#[derive(Debug, Clone, Default)]
pub struct Completer {
    commands: Vec<String>,
    aliases: Vec<String>,
    bookmarks: Vec<String>,
    home: Option<PathBuf>,
}

fn has_prefix_ignore_case(candidate: &str, prefix: &str) -> bool {
    candidate.to_lowercase().starts_with(&prefix.to_lowercase())
}

impl Completer {
    pub fn new(commands: Vec<String>, aliases: Vec<String>, bookmarks: Vec<String>) -> Self {
        Self {
            commands,
            aliases,
            bookmarks,
            home: dirs::home_dir(),
        }
    }

    /// Use `home` for `~` instead of the user's home directory.
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    /// Candidates for the last word of `line`, which ends at the cursor.
    ///
    /// Yields nothing for an empty line or when the cursor follows whitespace.
    pub fn complete<'a>(&'a self, line: &'a str) -> Box<dyn Iterator<Item = Candidate> + 'a> {
        if line.is_empty() || line.ends_with(char::is_whitespace) {
            return Box::new(std::iter::empty());
        }
        let mut words = line.split_whitespace();
        let Some(word) = words.next_back() else {
            return Box::new(std::iter::empty());
        };
        let start = line.len() - word.len();

        if words.next().is_none() {
            Box::new(self.command_candidates(word, start))
        } else {
            Box::new(self.path_candidates(word, line.len()))
        }
    }

    fn command_candidates<'a>(
        &'a self,
        word: &'a str,
        start: usize,
    ) -> impl Iterator<Item = Candidate> + 'a {
        let commands = self
            .commands
            .iter()
            .filter(move |name| has_prefix_ignore_case(name, word))
            .map(move |name| Candidate {
                replacement: name.clone(),
                display: name.clone(),
                kind: CandidateKind::Command,
                start,
            });

        let aliases = self
            .aliases
            .iter()
            .filter(move |name| has_prefix_ignore_case(name, word))
            .map(move |name| Candidate {
                replacement: name.clone(),
                display: format!("{name} (alias)"),
                kind: CandidateKind::Alias,
                start,
            });

        let bookmark_prefix = word.strip_prefix('@');
        let bookmarks = self
            .bookmarks
            .iter()
            .filter(move |name| bookmark_prefix.is_some_and(|p| has_prefix_ignore_case(name, p)))
            .map(move |name| Candidate {
                replacement: format!("@{name}"),
                display: format!("@{name}"),
                kind: CandidateKind::Bookmark,
                start,
            });

        commands.chain(aliases).chain(bookmarks)
    }

    fn path_candidates(&self, word: &str, end: usize) -> impl Iterator<Item = Candidate> + use<> {
        let (dir, partial) = match word.rfind('/') {
            Some(i) => (&word[..=i], &word[i + 1..]),
            None => ("", word),
        };
        let dir = if dir.is_empty() {
            PathBuf::from(".")
        } else {
            expand_tilde_with(dir, self.home.as_deref())
        };
        let start = end - partial.len();
        let partial = partial.to_string();

        // Unreadable or missing directories simply produce no candidates.
        fs::read_dir(&dir)
            .ok()
            .into_iter()
            .flatten()
            .flatten()
            .filter_map(move |entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                if !has_prefix_ignore_case(&name, &partial) {
                    return None;
                }
                let is_dir = is_directory(&entry.path());
                Some(Candidate {
                    display: if is_dir { format!("{name}/") } else { name.clone() },
                    replacement: name,
                    kind: if is_dir {
                        CandidateKind::Directory
                    } else {
                        CandidateKind::File
                    },
                    start,
                })
            })
    }
}

fn is_directory(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}

/// Line editor glue around a [`Completer`] snapshot.
#[derive(Debug, Default)]
pub struct ShellHelper {
    pub completer: Completer,
}

impl rustyline::completion::Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let before_cursor = &line[..pos];
        let mut start = pos;
        let pairs: Vec<Pair> = self
            .completer
            .complete(before_cursor)
            .map(|candidate| {
                start = candidate.start;
                Pair {
                    display: candidate.display,
                    replacement: candidate.replacement,
                }
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;
}

impl Highlighter for ShellHelper {}

impl Validator for ShellHelper {}

impl Helper for ShellHelper {}
