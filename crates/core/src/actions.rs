//! Console channel of a CI job.
//!
//! Lines are plain text or GitHub workflow commands (`::error::msg`), which
//! other runners print verbatim. Every write is best effort: a broken console
//! never fails the run.

use std::{
    fs::OpenOptions,
    io::{self, Write},
    path::{Path, PathBuf},
};

pub struct ActionConsole<W: Write> {
    out: W,
    output_file: Option<PathBuf>,
    summary_file: Option<PathBuf>,
    failed: bool,
}

impl ActionConsole<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ActionConsole<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            output_file: None,
            summary_file: None,
            failed: false,
        }
    }

    /// File receiving `name=value` step outputs (`GITHUB_OUTPUT`).
    pub fn with_output_file(mut self, path: Option<PathBuf>) -> Self {
        self.output_file = path;
        self
    }

    /// File receiving markdown for the job summary (`GITHUB_STEP_SUMMARY`).
    pub fn with_summary_file(mut self, path: Option<PathBuf>) -> Self {
        self.summary_file = path;
        self
    }

    pub fn info(&mut self, msg: &str) {
        let _ = writeln!(self.out, "{msg}");
    }

    pub fn debug(&mut self, msg: &str) {
        self.command("debug", msg);
    }

    pub fn warning(&mut self, msg: &str) {
        self.command("warning", msg);
    }

    pub fn error(&mut self, msg: &str) {
        self.command("error", msg);
    }

    /// Report `msg` as an error and mark the job as failed.
    pub fn set_failed(&mut self, msg: &str) {
        self.error(msg);
        self.failed = true;
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn set_output(&mut self, name: &str, value: &str) {
        let Some(path) = self.output_file.clone() else {
            self.debug(&format!("output {name}={value}"));
            return;
        };
        let line = format!("{name}={}\n", value.replace(['\r', '\n'], " "));
        if let Err(e) = append(&path, &line) {
            tracing::warn!(path = %path.display(), error = %e, "failed to write step output");
        }
    }

    pub fn append_summary(&mut self, markdown: &str) {
        let Some(path) = &self.summary_file else {
            return;
        };
        if let Err(e) = append(path, markdown) {
            tracing::warn!(path = %path.display(), error = %e, "failed to write step summary");
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn command(&mut self, name: &str, msg: &str) {
        let _ = writeln!(self.out, "::{name}::{}", escape_data(msg));
    }
}

fn append(path: &Path, contents: &str) -> io::Result<()> {
    let mut f = OpenOptions::new().create(true).append(true).open(path)?;
    f.write_all(contents.as_bytes())
}

fn escape_data(msg: &str) -> String {
    msg.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
