//! Render loop: line source -> interpreter -> rows -> composer -> writer.
//!
//! When both original files are available they are read in lock-step with
//! the diff so the unchanged stretches between hunks (and after the last
//! one) are shown too.

use std::io::Write;

use core_config::RenderConfig;
use core_diff::{Hunk, Interpreter, LineSource, Unit};
use tracing::{debug, info, warn};

use crate::RenderError;
use crate::compose::Composer;
use crate::rows::{self, Cell, Row};
use crate::session::RenderSession;
use crate::writer::Writer;

/// The two compared files, read alongside the diff.
pub struct Originals {
    old: Box<dyn LineSource>,
    new: Box<dyn LineSource>,
    /// Line numbers of the next unread line.
    old_next: usize,
    new_next: usize,
}

fn read(src: &mut dyn LineSource, side: &'static str) -> Result<Option<String>, RenderError> {
    src.next_line()
        .map_err(|source| RenderError::Original { side, source })
}

impl Originals {
    pub fn new(old: Box<dyn LineSource>, new: Box<dyn LineSource>) -> Self {
        Self {
            old,
            new,
            old_next: 1,
            new_next: 1,
        }
    }

    /// Unchanged lines between the previous hunk and `hunk`.
    pub fn leading_rows(&mut self, session: &mut RenderSession, hunk: &Hunk) -> Result<Vec<Row>, RenderError> {
        let old_gap = hunk.old.start.saturating_sub(self.old_next);
        let new_gap = hunk.new.start.saturating_sub(self.new_next);
        if old_gap != new_gap {
            return Err(RenderError::Unsynchronized {
                old_line: self.old_next,
                new_line: self.new_next,
                old_start: hunk.old.start,
                new_start: hunk.new.start,
            });
        }
        let mut rows = Vec::with_capacity(old_gap);
        for _ in 0..old_gap {
            let old = read(self.old.as_mut(), "old")?;
            let new = read(self.new.as_mut(), "new")?;
            match (old, new) {
                (Some(old), Some(new)) => {
                    self.old_next += 1;
                    self.new_next += 1;
                    rows.push(rows::unchanged_row(session, &old, &new));
                }
                _ => {
                    warn!(target: "render.driver", old_line = self.old_next, new_line = self.new_next, "original_ended_early");
                    break;
                }
            }
        }
        Ok(rows)
    }

    /// Step over the lines the hunk itself displays.
    pub fn skip(&mut self, hunk: &Hunk) -> Result<(), RenderError> {
        for _ in 0..hunk.old.count {
            if read(self.old.as_mut(), "old")?.is_none() {
                break;
            }
            self.old_next += 1;
        }
        for _ in 0..hunk.new.count {
            if read(self.new.as_mut(), "new")?.is_none() {
                break;
            }
            self.new_next += 1;
        }
        Ok(())
    }

    /// Remaining lines after the last hunk. They are identical when the diff
    /// was complete; a longer side is shown against a blank cell.
    pub fn trailing_rows(&mut self, session: &mut RenderSession) -> Result<Vec<Row>, RenderError> {
        let mut rows = Vec::new();
        loop {
            let old = read(self.old.as_mut(), "old")?;
            let new = read(self.new.as_mut(), "new")?;
            match (old, new) {
                (None, None) => break,
                (Some(old), Some(new)) => rows.push(rows::unchanged_row(session, &old, &new)),
                (old, new) => {
                    debug!(target: "render.driver", "trailing_length_mismatch");
                    rows.push(Row::Changed {
                        old: old.map(|t| Cell::new(session.take_old(), t)),
                        new: new.map(|t| Cell::new(session.take_new(), t)),
                    });
                }
            }
        }
        Ok(rows)
    }
}

fn emit<W: Write>(writer: &mut Writer<W>, composer: &Composer, session: &RenderSession, rows: &[Row]) {
    for row in rows {
        for line in composer.compose(session.colorizer(), row) {
            writer.line(line);
        }
    }
}

/// Render the whole diff stream and return the process exit status:
/// 0 identical, 1 differences, 2 backend trouble.
pub fn render<S, W>(
    src: S,
    mut originals: Option<Originals>,
    config: RenderConfig,
    out: W,
) -> Result<i32, RenderError>
where
    S: LineSource,
    W: Write,
{
    let composer = Composer::new(&config)?;
    let mut session = RenderSession::new(config)?;
    let mut writer = Writer::new(out);
    let mut interp = Interpreter::new(src);

    while let Some(unit) = interp.next_unit()? {
        match unit {
            Unit::Hunk(hunk) => {
                if let Some(o) = originals.as_mut() {
                    let rows = o.leading_rows(&mut session, &hunk)?;
                    emit(&mut writer, &composer, &session, &rows);
                    o.skip(&hunk)?;
                }
                let rows = rows::hunk_rows(&mut session, &hunk);
                emit(&mut writer, &composer, &session, &rows);
            }
            Unit::FileHeader { old, new } => {
                let row = rows::file_row(&mut session, old, new);
                emit(&mut writer, &composer, &session, &[row]);
            }
            Unit::Passthrough(lines) => {
                emit(&mut writer, &composer, &session, &rows::passthrough_rows(lines));
            }
        }
        writer.flush()?;
    }

    let backend = interp.exit_status()?;
    let status = session.exit_status(backend);
    if status < 2 {
        if let Some(o) = originals.as_mut() {
            let rows = o.trailing_rows(&mut session)?;
            emit(&mut writer, &composer, &session, &rows);
        }
    }
    writer.flush()?;
    info!(
        target: "render.driver",
        hunks = session.hunks(),
        lines = writer.lines_written(),
        backend_status = backend,
        status,
        "render_complete"
    );
    Ok(status)
}
