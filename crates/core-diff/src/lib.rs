//! Diff grammar interpreter.
//!
//! Turns the line stream of a diff backend (normal, context or unified
//! format) into [`Unit`]s: hunks with their bodies already aligned into
//! [`Triple`] display blocks, file header pairs, and verbatim passthrough
//! lines for anything that is not recognized.
//!
//! Invariants:
//! - Every input line ends up in exactly one unit (hunk body, header, or
//!   passthrough), except unified-body annotations such as
//!   `\ No newline at end of file`, which are dropped.
//! - Per slot, the concatenation of a hunk's blocks reproduces its old and
//!   new bodies in original order.
//! - Malformed hunks never abort the run; their lines come back as
//!   [`Unit::Passthrough`].

use std::io;

use thiserror::Error;

pub mod align;
pub mod context;
pub mod interpret;
pub mod normal;
pub mod source;
pub mod unified;

pub use align::{AlignError, align};
pub use interpret::Interpreter;
pub use source::{Lookahead, LineSource, ReaderSource, VecSource};

#[derive(Debug, Error)]
pub enum DiffError {
    #[error("failed reading diff input: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Align(#[from] AlignError),
}

/// One body line with its diff marker removed from `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub text: String,
    /// `' '`, `'-'`, `'+'` or `'!'`; `None` for normal-diff bodies.
    pub marker: Option<char>,
}

impl RawLine {
    pub fn new(text: impl Into<String>, marker: Option<char>) -> Self {
        Self {
            text: text.into(),
            marker,
        }
    }

    pub fn is_context(&self) -> bool {
        self.marker == Some(' ')
    }
}

/// Line span within one file; `count` is `end - start + 1` and may be zero,
/// in which case `start` is the first line after the insertion point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineRange {
    pub start: usize,
    pub count: usize,
}

impl LineRange {
    pub const fn new(start: usize, count: usize) -> Self {
        Self { start, count }
    }

    /// Range from inclusive header bounds; `end < start` yields an empty range.
    pub fn from_bounds(start: usize, end: usize) -> Self {
        if end < start {
            Self::new(end + 1, 0)
        } else {
            Self::new(start, end - start + 1)
        }
    }

    /// One past the last line of the range.
    pub const fn end(&self) -> usize {
        self.start + self.count
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Add,
    Delete,
    Change,
}

impl OpKind {
    pub fn from_counts(old: usize, new: usize) -> Self {
        match (old, new) {
            (0, _) => OpKind::Add,
            (_, 0) => OpKind::Delete,
            _ => OpKind::Change,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Normal,
    Context,
    Unified,
}

/// Header text shown above a hunk, one per column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HunkHeader {
    pub old: String,
    pub new: String,
}

/// Aligned display block: shared lines, then old-only and new-only lines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Triple {
    pub same: Vec<RawLine>,
    pub old: Vec<RawLine>,
    pub new: Vec<RawLine>,
}

impl Triple {
    pub fn is_empty(&self) -> bool {
        self.same.is_empty() && self.old.is_empty() && self.new.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub format: Format,
    pub op: OpKind,
    pub old: LineRange,
    pub new: LineRange,
    pub header: HunkHeader,
    pub old_lines: Vec<RawLine>,
    pub new_lines: Vec<RawLine>,
    pub blocks: Vec<Triple>,
}

/// Result of one parser entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Recognized(Hunk),
    /// Lines consumed while trying, to be printed verbatim.
    Unparsed(Vec<String>),
}

/// One interpreted piece of the diff stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    Hunk(Hunk),
    FileHeader { old: String, new: String },
    Passthrough(Vec<String>),
}

pub(crate) fn parse_num(s: Option<regex::Match<'_>>) -> Option<usize> {
    s.and_then(|m| m.as_str().parse().ok())
}
