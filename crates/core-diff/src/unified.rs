//! Unified diff: `@@ -N[,M] +N[,M] @@ section` headers.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::source::{LineSource, Lookahead};
use crate::{DiffError, Format, Hunk, HunkHeader, LineRange, OpKind, Parsed, RawLine, Triple};

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@(.*)$").expect("unified header regex")
});

pub fn is_header(line: &str) -> bool {
    HEADER.is_match(line)
}

/// A zero count means the number names the line before the gap.
fn range(start: usize, count: usize) -> LineRange {
    if count == 0 {
        LineRange::new(start + 1, 0)
    } else {
        LineRange::new(start, count)
    }
}

fn parse_header(line: &str) -> Option<(LineRange, LineRange)> {
    let caps = HEADER.captures(line)?;
    let o1 = crate::parse_num(caps.get(1))?;
    let oc = crate::parse_num(caps.get(2)).unwrap_or(1);
    let n1 = crate::parse_num(caps.get(3))?;
    let nc = crate::parse_num(caps.get(4)).unwrap_or(1);
    Some((range(o1, oc), range(n1, nc)))
}

fn slot(marker: char) -> Option<usize> {
    match marker {
        ' ' => Some(0),
        '-' => Some(1),
        '+' => Some(2),
        _ => None,
    }
}

/// Rotating classifier: the index only moves forward, to the next position
/// whose residue matches the slot, so runs of one kind share a block and
/// a context line after a change always opens a new block.
#[derive(Default)]
struct Blocks {
    index: usize,
    blocks: Vec<Triple>,
}

impl Blocks {
    fn push(&mut self, slot: usize, line: RawLine) {
        while self.index % 3 != slot {
            self.index += 1;
        }
        let block = self.index / 3;
        if self.blocks.len() <= block {
            self.blocks.resize_with(block + 1, Triple::default);
        }
        let t = &mut self.blocks[block];
        match slot {
            0 => t.same.push(line),
            1 => t.old.push(line),
            _ => t.new.push(line),
        }
    }
}

/// Parse one unified hunk whose `@@` line has already been read.
///
/// The body ends when the header's old and new line budgets are both spent
/// or the stream ends; a short body still yields a hunk.
pub fn parse<S: LineSource>(header: String, src: &mut Lookahead<S>) -> Result<Parsed, DiffError> {
    let Some((old, new)) = parse_header(&header) else {
        return Ok(Parsed::Unparsed(vec![header]));
    };
    let mut old_left = old.count;
    let mut new_left = new.count;
    let mut old_lines = Vec::new();
    let mut new_lines = Vec::new();
    let mut blocks = Blocks::default();

    while old_left > 0 || new_left > 0 {
        let Some(line) = src.next()? else {
            debug!(target: "diff.interpret", old_left, new_left, "unified_body_truncated");
            break;
        };
        let mut chars = line.chars();
        // Unmarked lines, empty ones included, spend no budget.
        let Some(marker) = chars.next() else {
            continue;
        };
        let Some(slot) = slot(marker) else {
            continue;
        };
        let raw = RawLine::new(chars.as_str(), Some(marker));
        match slot {
            0 => {
                old_left = old_left.saturating_sub(1);
                new_left = new_left.saturating_sub(1);
                old_lines.push(raw.clone());
                new_lines.push(raw.clone());
            }
            1 => {
                old_left = old_left.saturating_sub(1);
                old_lines.push(raw.clone());
            }
            _ => {
                new_left = new_left.saturating_sub(1);
                new_lines.push(raw.clone());
            }
        }
        blocks.push(slot, raw);
    }
    // Annotation for the hunk's last line.
    if src.peek()?.is_some_and(|l| l.starts_with('\\')) {
        src.next()?;
    }

    Ok(Parsed::Recognized(Hunk {
        format: Format::Unified,
        op: OpKind::from_counts(old.count, new.count),
        old,
        new,
        header: HunkHeader {
            old: header.clone(),
            new: header,
        },
        old_lines,
        new_lines,
        blocks: blocks.blocks,
    }))
}
