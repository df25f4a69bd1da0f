//! Context-diff line aligner.
//!
//! Pairs the old and new bodies of one context hunk into ordered [`Triple`]s.
//! The strategy is greedy and relies on diff(1) grouping: inside a change
//! block deletions come before insertions, which come before the paired
//! `!` modifications. No LCS realignment is attempted.

use std::collections::VecDeque;

use thiserror::Error;
use tracing::trace;

use crate::{RawLine, Triple};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AlignError {
    #[error("{side} line {index} has no context-diff marker ({marker:?})")]
    BadMarker {
        side: &'static str,
        index: usize,
        marker: Option<char>,
    },
}

fn check(side: &'static str, lines: &[RawLine]) -> Result<(), AlignError> {
    for (index, line) in lines.iter().enumerate() {
        if !matches!(line.marker, Some(' ' | '-' | '+' | '!')) {
            return Err(AlignError::BadMarker {
                side,
                index,
                marker: line.marker,
            });
        }
    }
    Ok(())
}

fn front_is(q: &VecDeque<RawLine>, marker: char) -> bool {
    q.front().is_some_and(|l| l.marker == Some(marker))
}

fn take_run(q: &mut VecDeque<RawLine>, marker: char, into: &mut Vec<RawLine>) {
    while front_is(q, marker) {
        if let Some(line) = q.pop_front() {
            into.push(line);
        }
    }
}

/// Align one context hunk. Every line must carry one of the four
/// context-diff markers; the interpreter validates before calling.
pub fn align(old: Vec<RawLine>, new: Vec<RawLine>) -> Result<Vec<Triple>, AlignError> {
    check("old", &old)?;
    check("new", &new)?;
    let mut old: VecDeque<RawLine> = old.into();
    let mut new: VecDeque<RawLine> = new.into();
    let mut out = Vec::new();

    while !old.is_empty() || !new.is_empty() {
        let mut t = Triple::default();
        if front_is(&old, ' ') && front_is(&new, ' ') {
            while front_is(&old, ' ') && front_is(&new, ' ') {
                if let (Some(line), Some(_)) = (old.pop_front(), new.pop_front()) {
                    t.same.push(line);
                }
            }
        } else {
            take_run(&mut old, '-', &mut t.old);
            if t.old.is_empty() {
                take_run(&mut new, '+', &mut t.new);
            }
            if t.old.is_empty() && t.new.is_empty() {
                take_run(&mut old, '!', &mut t.old);
                take_run(&mut new, '!', &mut t.new);
            }
        }
        if t.is_empty() {
            // Unpaired context or misplaced marker: keep the line, keep the order.
            if let Some(line) = old.pop_front() {
                trace!(target: "diff.align", marker = ?line.marker, "unpaired_old_line");
                t.old.push(line);
            } else if let Some(line) = new.pop_front() {
                trace!(target: "diff.align", marker = ?line.marker, "unpaired_new_line");
                t.new.push(line);
            }
        }
        out.push(t);
    }
    Ok(out)
}
