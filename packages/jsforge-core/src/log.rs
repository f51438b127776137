//! Per-task line buffer.
//!
//! Every (artifact, step) task accumulates its lines here; the buffer is
//! flushed to the step's log file on completion and echoed to the global
//! tracing sink line by line when the step fails, so concurrent tasks never
//! interleave within a line.

use crate::error::{BuildError, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, error};

pub struct TaskLog {
    prefix: String,
    indent: usize,
    lines: Vec<String>,
}

impl TaskLog {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            indent: 0,
            lines: Vec::new(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = format!("{}{}", "  ".repeat(self.indent), text.as_ref());
        debug!("{} {}", self.prefix, text);
        self.lines.push(text);
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn outdent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Writes the buffered lines to `path`, one per line.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let mut text = self.lines.join("\n");
        text.push('\n');
        fs::write(path, text).map_err(|e| BuildError::io(path, e))
    }

    /// Echoes every buffered line to the global sink at error level.
    pub fn echo_failure(&self) {
        for line in &self.lines {
            error!("{} {}", self.prefix, line);
        }
    }
}
