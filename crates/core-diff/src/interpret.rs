//! Dispatch over the three hunk grammars plus file headers.
//!
//! Hunk headers are tried first (normal, unified, context), then file
//! header pairs. Anything else, including `diff ...` command lines,
//! `Only in ...` notices and the context hunk separator, is handed back as
//! passthrough.

use tracing::{debug, trace};

use crate::source::{LineSource, Lookahead};
use crate::{DiffError, Parsed, Unit, context, normal, unified};

pub struct Interpreter<S> {
    src: Lookahead<S>,
}

/// Which entry point a line opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grammar {
    Normal,
    Unified,
    Context,
    Other,
}

impl Grammar {
    fn of(line: &str) -> Self {
        if normal::is_header(line) {
            Grammar::Normal
        } else if unified::is_header(line) {
            Grammar::Unified
        } else if context::is_header(line) {
            Grammar::Context
        } else {
            Grammar::Other
        }
    }
}

impl<S: LineSource> Interpreter<S> {
    pub fn new(src: S) -> Self {
        Self {
            src: Lookahead::new(src),
        }
    }

    /// Backend status; only meaningful once [`Self::next_unit`] returned `None`.
    pub fn exit_status(&mut self) -> Result<Option<i32>, DiffError> {
        Ok(self.src.exit_status()?)
    }

    pub fn next_unit(&mut self) -> Result<Option<Unit>, DiffError> {
        let Some(line) = self.src.next()? else {
            return Ok(None);
        };

        let parsed = match Grammar::of(&line) {
            Grammar::Normal => normal::parse(line, &mut self.src)?,
            Grammar::Unified => unified::parse(line, &mut self.src)?,
            Grammar::Context => context::parse(line, &mut self.src)?,
            Grammar::Other => return self.file_header_or_passthrough(line).map(Some),
        };
        match parsed {
            Parsed::Recognized(hunk) => {
                trace!(
                    target: "diff.interpret",
                    format = ?hunk.format,
                    op = ?hunk.op,
                    old_start = hunk.old.start,
                    new_start = hunk.new.start,
                    "hunk"
                );
                Ok(Some(Unit::Hunk(hunk)))
            }
            Parsed::Unparsed(lines) => {
                debug!(
                    target: "diff.interpret",
                    lines = lines.len(),
                    header = lines.first().map(String::as_str).unwrap_or_default(),
                    "malformed_hunk_passthrough"
                );
                Ok(Some(Unit::Passthrough(lines)))
            }
        }
    }

    /// `--- a` + `+++ b` or `*** a` + `--- b`; a lone header line passes
    /// through.
    fn file_header_or_passthrough(&mut self, line: String) -> Result<Unit, DiffError> {
        let second = if line.starts_with("--- ") {
            "+++ "
        } else if line.starts_with("*** ") {
            "--- "
        } else {
            return Ok(Unit::Passthrough(vec![line]));
        };
        if !self.src.peek()?.is_some_and(|l| l.starts_with(second)) {
            return Ok(Unit::Passthrough(vec![line]));
        }
        match self.src.next()? {
            Some(new) => Ok(Unit::FileHeader { old: line, new }),
            None => Ok(Unit::Passthrough(vec![line])),
        }
    }
}

impl<S: LineSource> Iterator for Interpreter<S> {
    type Item = Result<Unit, DiffError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_unit().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Format, VecSource};
    use pretty_assertions::assert_eq;

    fn units(text: &str) -> Vec<Unit> {
        Interpreter::new(VecSource::from_text(text))
            .collect::<Result<_, _>>()
            .unwrap()
    }

    fn kinds(units: &[Unit]) -> Vec<&'static str> {
        units
            .iter()
            .map(|u| match u {
                Unit::Hunk(h) => match h.format {
                    Format::Normal => "normal",
                    Format::Context => "context",
                    Format::Unified => "unified",
                },
                Unit::FileHeader { .. } => "files",
                Unit::Passthrough(_) => "pass",
            })
            .collect()
    }

    #[test]
    fn unified_stream_with_headers() {
        let u = units(
            "diff -u a b\n--- a\t2024-01-01\n+++ b\t2024-01-02\n@@ -1,2 +1,2 @@\n-foo\n+bar\n ctx\n",
        );
        assert_eq!(kinds(&u), vec!["pass", "files", "unified"]);
        assert_eq!(
            u[1],
            Unit::FileHeader {
                old: "--- a\t2024-01-01".into(),
                new: "+++ b\t2024-01-02".into()
            }
        );
    }

    #[test]
    fn context_stream_with_separator() {
        let u = units(
            "*** a\n--- b\n***************\n*** 1 ****\n! x\n--- 1 ----\n! y\n",
        );
        assert_eq!(kinds(&u), vec!["files", "pass", "context"]);
    }

    #[test]
    fn consecutive_normal_hunks() {
        let u = units("1c1\n< a\n---\n> b\n3d2\n< c\n");
        assert_eq!(kinds(&u), vec!["normal", "normal"]);
    }

    #[test]
    fn header_lines_reach_every_branch() {
        let u = units("*** a\n--- b\n@@ -1 +1 @@\n-x\n+y\n*** 2 ****\n--- 2 ----\n+ z\nplain\n");
        assert_eq!(kinds(&u), vec!["files", "unified", "context", "pass"]);
        assert_eq!(u[3], Unit::Passthrough(vec!["plain".into()]));
    }

    #[test]
    fn lone_file_header_passes_through() {
        let u = units("--- only\nOnly in a: x\n");
        assert_eq!(
            u,
            vec![
                Unit::Passthrough(vec!["--- only".into()]),
                Unit::Passthrough(vec!["Only in a: x".into()]),
            ]
        );
    }

    #[test]
    fn malformed_hunk_then_recovery() {
        let u = units("2c2\n< a\nBinary files differ\n1a2\n> z\n");
        assert_eq!(kinds(&u), vec!["pass", "pass", "normal"]);
        assert_eq!(u[0], Unit::Passthrough(vec!["2c2".into(), "< a".into()]));
    }

    #[test]
    fn status_comes_from_source() {
        let mut it = Interpreter::new(VecSource::from_text("").with_status(2));
        assert_eq!(it.next_unit().unwrap(), None);
        assert_eq!(it.exit_status().unwrap(), Some(2));
    }
}
