//! Normal diff: `N[,M]{a,c,d}N[,M]` headers with `< ` / `> ` bodies.

use std::sync::LazyLock;

use regex::Regex;

use crate::source::{LineSource, Lookahead};
use crate::{DiffError, Format, Hunk, HunkHeader, LineRange, OpKind, Parsed, RawLine, Triple};

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)(?:,(\d+))?([acd])(\d+)(?:,(\d+))?$").expect("normal header regex")
});

pub fn is_header(line: &str) -> bool {
    HEADER.is_match(line)
}

struct Header {
    op: char,
    old: LineRange,
    new: LineRange,
}

fn parse_header(line: &str) -> Option<Header> {
    let caps = HEADER.captures(line)?;
    let o1 = crate::parse_num(caps.get(1))?;
    let o2 = crate::parse_num(caps.get(2)).unwrap_or(o1);
    let op = caps.get(3)?.as_str().chars().next()?;
    let n1 = crate::parse_num(caps.get(4))?;
    let n2 = crate::parse_num(caps.get(5)).unwrap_or(n1);
    // For `a` the old number names the line the insertion follows; `d` mirrors it.
    let old = if op == 'a' {
        LineRange::new(o1 + 1, 0)
    } else {
        LineRange::from_bounds(o1, o2)
    };
    let new = if op == 'd' {
        LineRange::new(n1 + 1, 0)
    } else {
        LineRange::from_bounds(n1, n2)
    };
    Some(Header { op, old, new })
}

/// Read `count` body lines carrying `prefix` (`'<'` or `'>'`).
///
/// Returns `Ok(false)` when a line does not belong to the body; that line is
/// pushed back so it can start the next unit.
fn read_body<S: LineSource>(
    src: &mut Lookahead<S>,
    prefix: char,
    count: usize,
    body: &mut Vec<RawLine>,
    consumed: &mut Vec<String>,
) -> Result<bool, DiffError> {
    while body.len() < count {
        let Some(line) = src.next()? else {
            return Ok(false);
        };
        if line.starts_with('\\') {
            // "\ No newline at end of file"
            consumed.push(line);
            continue;
        }
        let mut chars = line.chars();
        if chars.next() != Some(prefix) {
            src.push_back(line);
            return Ok(false);
        }
        let text = chars.as_str();
        let text = text.strip_prefix(' ').unwrap_or(text);
        body.push(RawLine::new(text, None));
        consumed.push(line);
    }
    // Trailing annotation right after the last body line.
    if src.peek()?.is_some_and(|l| l.starts_with('\\')) {
        if let Some(line) = src.next()? {
            consumed.push(line);
        }
    }
    Ok(true)
}

/// Parse one normal-diff hunk whose header line has already been read.
pub fn parse<S: LineSource>(header: String, src: &mut Lookahead<S>) -> Result<Parsed, DiffError> {
    let Some(h) = parse_header(&header) else {
        return Ok(Parsed::Unparsed(vec![header]));
    };
    let mut consumed = vec![header];
    let mut old_lines = Vec::new();
    let mut new_lines = Vec::new();

    if matches!(h.op, 'd' | 'c')
        && !read_body(src, '<', h.old.count, &mut old_lines, &mut consumed)?
    {
        return Ok(Parsed::Unparsed(consumed));
    }
    if h.op == 'c' {
        match src.next()? {
            Some(sep) if sep == "---" => consumed.push(sep),
            Some(other) => {
                src.push_back(other);
                return Ok(Parsed::Unparsed(consumed));
            }
            None => return Ok(Parsed::Unparsed(consumed)),
        }
    }
    if matches!(h.op, 'a' | 'c')
        && !read_body(src, '>', h.new.count, &mut new_lines, &mut consumed)?
    {
        return Ok(Parsed::Unparsed(consumed));
    }

    let op = match h.op {
        'a' => OpKind::Add,
        'd' => OpKind::Delete,
        _ => OpKind::Change,
    };
    let text = consumed.into_iter().next().unwrap_or_default();
    let blocks = vec![Triple {
        same: Vec::new(),
        old: old_lines.clone(),
        new: new_lines.clone(),
    }];
    Ok(Parsed::Recognized(Hunk {
        format: Format::Normal,
        op,
        old: h.old,
        new: h.new,
        header: HunkHeader {
            old: text.clone(),
            new: text,
        },
        old_lines,
        new_lines,
        blocks,
    }))
}
