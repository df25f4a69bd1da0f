//! Two-column rendering of interpreted diff units.
//!
//! Pipeline per unit:
//! 1. `rows` turns a hunk, file header or passthrough into logical rows,
//!    assigning line numbers from the `session` counters. View mode folds a
//!    hunk's blocks into a single old/new pair first.
//! 2. `compose` lays each row out as one or more printed lines: mark, line
//!    number and folded, colorized text per side.
//! 3. `writer` batches the printed lines and flushes once per unit.
//!
//! `driver` runs the loop, reads the original files in lock-step when they
//! are available, and maps the backend's status to the process exit code.
//!
//! Invariants:
//! - Line counters never decrease within one file and restart at 1 on each
//!   file header.
//! - A composed line never exceeds the configured width, except for a single
//!   grapheme cluster wider than its whole cell. Passthrough lines are
//!   printed as they came.
//! - Color runs are closed on every printed line.

use std::io;

use core_color::ColorError;
use core_diff::DiffError;
use thiserror::Error;

pub mod compose;
pub mod driver;
pub mod rows;
pub mod session;
pub mod writer;

pub use compose::Composer;
pub use driver::{Originals, render};
pub use rows::{Cell, Row};
pub use session::RenderSession;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("width {width} leaves no room for text; at least {needed} columns are needed")]
    WidthTooSmall { width: usize, needed: usize },
    #[error("diff and original files are out of step: at old line {old_line} / new line {new_line}, next hunk starts at {old_start} / {new_start}")]
    Unsynchronized {
        old_line: usize,
        new_line: usize,
        old_start: usize,
        new_start: usize,
    },
    #[error("failed reading {side} original file: {source}")]
    Original {
        side: &'static str,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Color(#[from] ColorError),
    #[error(transparent)]
    Diff(#[from] DiffError),
    #[error("failed writing output: {0}")]
    Io(#[from] io::Error),
}
