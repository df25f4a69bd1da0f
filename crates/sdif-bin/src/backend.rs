//! Line sources backed by the `diff` child process and by plain files.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};

use anyhow::{Context, Result};
use core_diff::{LineSource, ReaderSource};
use tracing::{debug, warn};

/// A running `diff` whose stdout is the diff stream.
pub struct DiffProcess {
    child: Child,
    reader: Option<ReaderSource<BufReader<ChildStdout>>>,
    status: Option<i32>,
}

impl DiffProcess {
    pub fn spawn(program: &str, options: &[String], old: &Path, new: &Path) -> Result<Self> {
        let mut child = Command::new(program)
            .args(options)
            .arg(old)
            .arg(new)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to run `{program}`"))?;
        let stdout = child
            .stdout
            .take()
            .with_context(|| format!("`{program}` has no stdout pipe"))?;
        debug!(
            target: "runtime",
            program,
            options = ?options,
            old = %old.display(),
            new = %new.display(),
            "diff_spawned"
        );
        Ok(Self {
            child,
            reader: Some(ReaderSource::new(BufReader::new(stdout))),
            status: None,
        })
    }
}

impl LineSource for DiffProcess {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        match self.reader.as_mut() {
            Some(reader) => reader.next_line(),
            None => Ok(None),
        }
    }

    /// Waits for the child; the pipe is closed first so it cannot block on a
    /// full buffer.
    fn exit_status(&mut self) -> io::Result<Option<i32>> {
        if self.status.is_none() {
            self.reader = None;
            let status = self.child.wait()?;
            // Killed by a signal: report as trouble.
            let code = status.code().unwrap_or(2);
            if code > 1 {
                warn!(target: "runtime", code, "diff_exit_trouble");
            }
            self.status = Some(code);
        }
        Ok(self.status)
    }
}

pub fn open_file(path: &Path) -> Result<ReaderSource<BufReader<File>>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    Ok(ReaderSource::new(BufReader::new(file)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_source_reads_lines() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, "one\ntwo\n").unwrap();
        let mut src = open_file(tmp.path()).unwrap();
        assert_eq!(src.next_line().unwrap().as_deref(), Some("one"));
        assert_eq!(src.next_line().unwrap().as_deref(), Some("two"));
        assert_eq!(src.next_line().unwrap(), None);
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = open_file(Path::new("__no_such_sdif_input__")).err().unwrap();
        assert!(format!("{err:#}").contains("__no_such_sdif_input__"));
    }
}
