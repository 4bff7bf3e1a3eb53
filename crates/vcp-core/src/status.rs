//! Human-readable progress log, optionally persisted to a timestamped file.

use chrono::{DateTime, Local};
use log::{debug, info, warn};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// File name for a status log created at `at`, e.g. `log2026-10-19_14-03-05.123.txt`.
pub fn log_file_name(at: DateTime<Local>) -> String {
    format!("log{}.txt", at.format("%Y-%m-%d_%H-%M-%S%.3f"))
}

/// Accumulates newline-separated status lines for one run.
#[derive(Debug, Default, Clone)]
pub struct StatusLog {
    lines: Vec<String>,
}

impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, text: impl Into<String>) {
        let text = text.into();
        debug!("status: {}", text);
        self.lines.push(text);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn contents(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    /// Write to a new file in `dir`. Fails if the file already exists.
    pub fn write_to_dir(&self, dir: &Path) -> io::Result<PathBuf> {
        self.write_to_dir_at(dir, Local::now())
    }

    pub fn write_to_dir_at(&self, dir: &Path, at: DateTime<Local>) -> io::Result<PathBuf> {
        let path = dir.join(log_file_name(at));
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;
        file.write_all(self.contents().as_bytes())?;
        Ok(path)
    }

    /// Like [`write_to_dir`](Self::write_to_dir) but a failed write is only
    /// logged.
    pub fn persist(&self, dir: &Path) -> Option<PathBuf> {
        match self.write_to_dir(dir) {
            Ok(path) => {
                info!("Status log written to {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("Could not write status log in {}: {}", dir.display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/status_tests.rs"]
mod tests;
