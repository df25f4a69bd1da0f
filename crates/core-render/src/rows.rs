//! Row emission: interpreted units to logical two-column rows.
//!
//! A logical row may print as several physical lines once the composer
//! folds its cells; numbering is assigned here, once per logical row.

use std::borrow::Cow;

use core_diff::{Hunk, RawLine, Triple};

use crate::session::RenderSession;

/// Text of one side of a row with its line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub number: usize,
    pub text: String,
}

impl Cell {
    pub fn new(number: usize, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    /// Hunk header text, one per column.
    Command { old: String, new: String },
    /// File header pair.
    File { old: String, new: String },
    Unchanged { old: Cell, new: Cell },
    /// Positional pairing of old-only and new-only lines; a missing side
    /// renders blank.
    Changed { old: Option<Cell>, new: Option<Cell> },
    /// Unrecognized input printed verbatim across the full width.
    Passthrough(String),
}

/// Fold a hunk's blocks into one: later blocks' shared lines are appended to
/// both sides so the whole hunk reads as one old/new pair.
pub fn accumulate(blocks: &[Triple]) -> Triple {
    let mut blocks = blocks.iter();
    let mut acc = blocks.next().cloned().unwrap_or_default();
    for t in blocks {
        acc.old.extend(t.same.iter().cloned());
        acc.old.extend(t.old.iter().cloned());
        acc.new.extend(t.same.iter().cloned());
        acc.new.extend(t.new.iter().cloned());
    }
    acc
}

fn changed_rows(session: &mut RenderSession, old: &[RawLine], new: &[RawLine], rows: &mut Vec<Row>) {
    for i in 0..old.len().max(new.len()) {
        let old = old.get(i).map(|l| Cell::new(session.take_old(), l.text.as_str()));
        let new = new.get(i).map(|l| Cell::new(session.take_new(), l.text.as_str()));
        rows.push(Row::Changed { old, new });
    }
}

/// Rows for one hunk: the command row, then every block in order.
pub fn hunk_rows(session: &mut RenderSession, hunk: &Hunk) -> Vec<Row> {
    session.begin_hunk(hunk);
    let mut rows = vec![Row::Command {
        old: hunk.header.old.clone(),
        new: hunk.header.new.clone(),
    }];
    let blocks: Cow<'_, [Triple]> = if session.config().view {
        Cow::Owned(vec![accumulate(&hunk.blocks)])
    } else {
        Cow::Borrowed(&hunk.blocks)
    };
    for t in blocks.iter() {
        for line in &t.same {
            rows.push(unchanged_row(session, &line.text, &line.text));
        }
        changed_rows(session, &t.old, &t.new, &mut rows);
    }
    rows
}

/// Row for a line shared by both files.
pub fn unchanged_row(session: &mut RenderSession, old: &str, new: &str) -> Row {
    Row::Unchanged {
        old: Cell::new(session.take_old(), old),
        new: Cell::new(session.take_new(), new),
    }
}

pub fn file_row(session: &mut RenderSession, old: String, new: String) -> Row {
    session.begin_file();
    Row::File { old, new }
}

pub fn passthrough_rows(lines: Vec<String>) -> Vec<Row> {
    lines.into_iter().map(Row::Passthrough).collect()
}
