//! Output writer.
//!
//! Composed lines are queued as commands and written in one batch per
//! interpreted unit, so a long hunk costs one flush rather than one per line.
//!
//! Invariants:
//! * Commands preserve ordering; nothing reaches the sink before `flush`.
//! * Every queued line is terminated with `\n`, passthrough lines included.

use std::io::{self, Write};

use crossterm::{queue, style::Print};

#[derive(Debug)]
pub enum Command {
    Print(String),
    EndLine,
}

pub struct Writer<W: Write> {
    out: W,
    cmds: Vec<Command>,
    lines_written: u64,
}

impl<W: Write> Writer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            cmds: Vec::new(),
            lines_written: 0,
        }
    }

    pub fn print<S: Into<String>>(&mut self, s: S) {
        let s: String = s.into();
        if !s.is_empty() {
            self.cmds.push(Command::Print(s));
        }
    }

    pub fn end_line(&mut self) {
        self.cmds.push(Command::EndLine);
    }

    /// Queue one complete line.
    pub fn line<S: Into<String>>(&mut self, s: S) {
        self.print(s);
        self.end_line();
    }

    /// Lines that reached the sink so far.
    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    pub fn flush(&mut self) -> io::Result<()> {
        for c in self.cmds.drain(..) {
            match c {
                Command::Print(s) => queue!(self.out, Print(s))?,
                Command::EndLine => {
                    queue!(self.out, Print('\n'))?;
                    self.lines_written += 1;
                }
            }
        }
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_written_before_flush() {
        let mut out = Vec::new();
        let mut w = Writer::new(&mut out);
        w.line("a");
        w.print("");
        w.line("b");
        assert_eq!(w.lines_written(), 0);
        w.flush().unwrap();
        assert_eq!(w.lines_written(), 2);
        w.flush().unwrap();
        assert_eq!(w.lines_written(), 2);
        assert_eq!(out, b"a\nb\n");
    }

    #[test]
    fn queued_lines_stay_out_of_the_sink() {
        let mut out = Vec::new();
        {
            let mut w = Writer::new(&mut out);
            w.line("held");
        }
        assert!(out.is_empty());
    }

    #[test]
    fn empty_line_still_terminates() {
        let mut out = Vec::new();
        let mut w = Writer::new(&mut out);
        w.line("");
        w.flush().unwrap();
        assert_eq!(out, b"\n");
    }
}
