//! Context diff: `*** N[,M] ****` / `--- N[,M] ----` header pairs.
//!
//! Either body may be omitted by the backend when that side holds nothing
//! but context lines; the missing side is rebuilt from the other side's
//! context lines so the aligner always sees both.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::source::{LineSource, Lookahead};
use crate::{DiffError, Format, Hunk, HunkHeader, LineRange, OpKind, Parsed, RawLine, align};

static FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\*\*\* (\d+)(?:,(\d+))? \*\*\*\*$").expect("context old header regex")
});
static SECOND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^--- (\d+)(?:,(\d+))? ----$").expect("context new header regex")
});

/// Line separating context hunks.
pub const SEPARATOR: &str = "***************";

pub fn is_header(line: &str) -> bool {
    FIRST.is_match(line)
}

fn bounds(line: &str, re: &Regex) -> Option<(usize, usize)> {
    let caps = re.captures(line)?;
    let a = crate::parse_num(caps.get(1))?;
    let b = crate::parse_num(caps.get(2)).unwrap_or(a);
    Some((a, b))
}

fn count((a, b): (usize, usize)) -> usize {
    if b < a { 0 } else { b - a + 1 }
}

/// Range for a body that was actually present (or rebuilt); an empty body
/// means the header number named the line before the gap.
fn range((a, b): (usize, usize), lines: usize) -> LineRange {
    if lines == 0 {
        LineRange::new(b + 1, 0)
    } else {
        LineRange::from_bounds(a, b)
    }
}

/// Split a body line into its two-character marker and text.
pub fn body_line(line: &str) -> Option<RawLine> {
    let mut chars = line.chars();
    let marker = chars.next()?;
    if !matches!(marker, ' ' | '-' | '+' | '!') {
        return None;
    }
    let rest = chars.as_str();
    if rest.is_empty() {
        return Some(RawLine::new("", Some(marker)));
    }
    rest.strip_prefix(' ')
        .map(|text| RawLine::new(text, Some(marker)))
}

enum Body {
    Complete(Vec<String>),
    /// The stream ended or a foreign line was met (already pushed back).
    Broken,
}

/// Read `n` body lines, passing over `\ No newline` annotations.
fn read_lines<S: LineSource>(
    src: &mut Lookahead<S>,
    n: usize,
    mut body: Vec<String>,
    consumed: &mut Vec<String>,
) -> Result<Body, DiffError> {
    while body.len() < n {
        let Some(line) = src.next()? else {
            return Ok(Body::Broken);
        };
        if line.starts_with('\\') {
            consumed.push(line);
            continue;
        }
        if body_line(&line).is_none() {
            src.push_back(line);
            return Ok(Body::Broken);
        }
        consumed.push(line.clone());
        body.push(line);
    }
    Ok(Body::Complete(body))
}

fn to_raw(lines: &[String]) -> Option<Vec<RawLine>> {
    lines.iter().map(|l| body_line(l)).collect()
}

fn context_only(lines: &[RawLine]) -> Vec<RawLine> {
    lines.iter().filter(|l| l.is_context()).cloned().collect()
}

/// Parse one context-diff hunk whose `*** N,M ****` line has already been read.
pub fn parse<S: LineSource>(header: String, src: &mut Lookahead<S>) -> Result<Parsed, DiffError> {
    let Some(old_bounds) = bounds(&header, &FIRST) else {
        return Ok(Parsed::Unparsed(vec![header]));
    };
    let old_count = count(old_bounds);
    let mut consumed = vec![header.clone()];

    let Some(line) = src.next()? else {
        return Ok(Parsed::Unparsed(consumed));
    };
    let (old_raw, second) = if SECOND.is_match(&line) {
        consumed.push(line.clone());
        (Vec::new(), line)
    } else {
        // No second header yet: what we read starts the old body.
        if body_line(&line).is_none() && !line.starts_with('\\') {
            src.push_back(line);
            return Ok(Parsed::Unparsed(consumed));
        }
        consumed.push(line.clone());
        let first = if line.starts_with('\\') { Vec::new() } else { vec![line] };
        let old_raw = match read_lines(src, old_count.max(1), first, &mut consumed)? {
            Body::Complete(lines) => lines,
            Body::Broken => return Ok(Parsed::Unparsed(consumed)),
        };
        match src.next()? {
            Some(l) if SECOND.is_match(&l) => {
                consumed.push(l.clone());
                (old_raw, l)
            }
            Some(l) => {
                debug!(target: "diff.interpret", header = header.as_str(), "context_second_header_missing");
                src.push_back(l);
                return Ok(Parsed::Unparsed(consumed));
            }
            None => return Ok(Parsed::Unparsed(consumed)),
        }
    };
    let Some(new_bounds) = bounds(&second, &SECOND) else {
        return Ok(Parsed::Unparsed(consumed));
    };
    let new_count = count(new_bounds);
    let Some(mut old_lines) = to_raw(&old_raw) else {
        return Ok(Parsed::Unparsed(consumed));
    };

    let deleted = old_lines.iter().filter(|l| l.marker == Some('-')).count();
    let has_change = old_lines.iter().any(|l| l.marker == Some('!'));
    let pure_deletion =
        !old_lines.is_empty() && !has_change && old_count.saturating_sub(deleted) == new_count;
    let next_is_body = src.peek()?.is_some_and(|l| body_line(l).is_some());

    let new_lines = if pure_deletion || !next_is_body {
        context_only(&old_lines)
    } else {
        let raw = match read_lines(src, new_count, Vec::new(), &mut consumed)? {
            Body::Complete(lines) => lines,
            Body::Broken => return Ok(Parsed::Unparsed(consumed)),
        };
        match to_raw(&raw) {
            Some(lines) => lines,
            None => return Ok(Parsed::Unparsed(consumed)),
        }
    };
    if old_lines.is_empty() {
        old_lines = context_only(&new_lines);
    }
    // Trailing annotation after the last new line.
    if src.peek()?.is_some_and(|l| l.starts_with('\\')) {
        src.next()?;
    }

    let old = range(old_bounds, old_lines.len());
    let new = range(new_bounds, new_lines.len());
    let blocks = align(old_lines.clone(), new_lines.clone())?;
    Ok(Parsed::Recognized(Hunk {
        format: Format::Context,
        op: OpKind::from_counts(old.count, new.count),
        old,
        new,
        header: HunkHeader {
            old: header,
            new: second,
        },
        old_lines,
        new_lines,
        blocks,
    }))
}
