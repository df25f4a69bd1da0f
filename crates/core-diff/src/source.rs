//! Line sources feeding the interpreter.
//!
//! The backend (a `diff` child process, a file, stdin, or a test fixture) is
//! reached only through [`LineSource`]: blocking next-line, end of stream, and
//! the backend's exit status once the stream is drained.

use std::collections::VecDeque;
use std::io::{self, BufRead};

pub trait LineSource {
    /// Next line without its terminator; `Ok(None)` at end of stream.
    fn next_line(&mut self) -> io::Result<Option<String>>;

    /// Exit status of the producing backend, available after end of stream.
    /// Sources without a backend process return `Ok(None)`.
    fn exit_status(&mut self) -> io::Result<Option<i32>> {
        Ok(None)
    }
}

impl<S: LineSource + ?Sized> LineSource for &mut S {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        (**self).next_line()
    }

    fn exit_status(&mut self) -> io::Result<Option<i32>> {
        (**self).exit_status()
    }
}

impl<S: LineSource + ?Sized> LineSource for Box<S> {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        (**self).next_line()
    }

    fn exit_status(&mut self) -> io::Result<Option<i32>> {
        (**self).exit_status()
    }
}

/// Strip one trailing `\n` (and a preceding `\r`).
pub fn chomp(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
}

/// Any buffered reader; invalid UTF-8 is replaced rather than rejected.
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(256),
        }
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        chomp(&mut self.buf);
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }
}

/// In-memory lines with an optional fixed exit status.
#[derive(Debug, Clone, Default)]
pub struct VecSource {
    lines: VecDeque<String>,
    status: Option<i32>,
}

impl VecSource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            status: None,
        }
    }

    /// Split `text` on newlines; a trailing newline does not add an empty line.
    pub fn from_text(text: &str) -> Self {
        Self::new(text.lines())
    }

    pub fn with_status(mut self, status: i32) -> Self {
        self.status = Some(status);
        self
    }
}

impl LineSource for VecSource {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.lines.pop_front())
    }

    fn exit_status(&mut self) -> io::Result<Option<i32>> {
        Ok(self.status)
    }
}

/// Pushback wrapper giving parsers arbitrary lookahead.
#[derive(Debug)]
pub struct Lookahead<S> {
    inner: S,
    pending: VecDeque<String>,
}

impl<S: LineSource> Lookahead<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            pending: VecDeque::new(),
        }
    }

    pub fn next(&mut self) -> io::Result<Option<String>> {
        match self.pending.pop_front() {
            Some(line) => Ok(Some(line)),
            None => self.inner.next_line(),
        }
    }

    pub fn peek(&mut self) -> io::Result<Option<&str>> {
        if self.pending.is_empty() {
            if let Some(line) = self.inner.next_line()? {
                self.pending.push_back(line);
            }
        }
        Ok(self.pending.front().map(String::as_str))
    }

    /// Return `line` to the front of the stream.
    pub fn push_back(&mut self, line: String) {
        self.pending.push_front(line);
    }

    pub fn exit_status(&mut self) -> io::Result<Option<i32>> {
        self.inner.exit_status()
    }
}
