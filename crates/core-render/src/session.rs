//! Per-run render state.
//!
//! One `RenderSession` lives for a whole run and is threaded explicitly
//! through row emission: the old/new line counters, the compiled color
//! cache, and the hunk count that decides the exit status when the backend
//! does not report one.

use core_color::{Colorizer, Colormap};
use core_config::RenderConfig;
use core_diff::Hunk;
use tracing::warn;

use crate::RenderError;

#[derive(Debug)]
pub struct RenderSession {
    config: RenderConfig,
    colorizer: Colorizer,
    old_line: usize,
    new_line: usize,
    hunks: usize,
}

impl RenderSession {
    pub fn new(config: RenderConfig) -> Result<Self, RenderError> {
        let colormap = Colormap::with_overrides(&config.colormap)?;
        let colorizer = Colorizer::new(colormap, config.palette, config.color);
        Ok(Self {
            config,
            colorizer,
            old_line: 1,
            new_line: 1,
            hunks: 0,
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn colorizer(&self) -> &Colorizer {
        &self.colorizer
    }

    /// Next old and new line numbers to be displayed.
    pub fn counters(&self) -> (usize, usize) {
        (self.old_line, self.new_line)
    }

    pub fn hunks(&self) -> usize {
        self.hunks
    }

    /// Position the counters at the hunk's first lines. Counters never move
    /// backwards inside one file.
    pub fn begin_hunk(&mut self, hunk: &Hunk) {
        self.hunks += 1;
        if hunk.old.start < self.old_line || hunk.new.start < self.new_line {
            warn!(
                target: "render.driver",
                old_counter = self.old_line,
                new_counter = self.new_line,
                old_start = hunk.old.start,
                new_start = hunk.new.start,
                "hunk_counter_regression"
            );
        }
        self.old_line = self.old_line.max(hunk.old.start);
        self.new_line = self.new_line.max(hunk.new.start);
    }

    /// A new file pair starts; numbering restarts at 1.
    pub fn begin_file(&mut self) {
        self.old_line = 1;
        self.new_line = 1;
    }

    pub fn take_old(&mut self) -> usize {
        let n = self.old_line;
        self.old_line += 1;
        n
    }

    pub fn take_new(&mut self) -> usize {
        let n = self.new_line;
        self.new_line += 1;
        n
    }

    /// Backend status when it has one, otherwise 1 if any hunk was seen.
    pub fn exit_status(&self, backend: Option<i32>) -> i32 {
        backend.unwrap_or(if self.hunks > 0 { 1 } else { 0 })
    }
}
