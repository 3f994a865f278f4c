//! Append-only checkpoint log
//!
//! Progress markers are written as one JSON object per line to
//! `__checkpoint_file.ckpt` in the working directory. The newest marker is
//! the last line. The file survives failed runs and is removed on success.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Well-known checkpoint file name
pub const CHECKPOINT_FILE_NAME: &str = "__checkpoint_file.ckpt";

/// Errors raised by the checkpoint log
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// Log could not be opened or created
    #[error("Failed to open checkpoint log {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Append, read or delete failed
    #[error("Checkpoint log I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line could not be encoded or decoded
    #[error("Malformed checkpoint record: {0}")]
    Parse(#[from] serde_json::Error),
}

impl CheckpointError {
    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            CheckpointError::Open { path, .. } => {
                format!(
                    "{self}\n\nHint: Check that {} is writable.",
                    path.parent().unwrap_or(path).display()
                )
            }
            CheckpointError::Parse(_) => format!(
                "{self}\n\nHint: Inspect or delete {CHECKPOINT_FILE_NAME} before rerunning."
            ),
            _ => self.to_string(),
        }
    }
}

/// One progress marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    /// Name of the process that wrote the marker
    pub process: String,
    pub step: String,
    pub payload: String,
    pub startpoint: i64,
    pub endpoint: i64,
}

/// Handle on the checkpoint log
///
/// Dropping the handle closes the file; only [`CheckpointLog::clear`]
/// deletes it.
#[derive(Debug)]
pub struct CheckpointLog {
    file: File,
    path: PathBuf,
    process: String,
}

impl CheckpointLog {
    /// Open (creating if absent) the checkpoint log in `dir`
    pub fn open(dir: &Path, process: impl Into<String>) -> Result<Self, CheckpointError> {
        let path = dir.join(CHECKPOINT_FILE_NAME);
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)
            .map_err(|source| CheckpointError::Open {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path.display(), "Opened checkpoint log");
        Ok(Self {
            file,
            path,
            process: process.into(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a marker as a single line
    pub fn record(
        &mut self,
        step: &str,
        payload: &str,
        startpoint: i64,
        endpoint: i64,
    ) -> Result<(), CheckpointError> {
        let record = CheckpointRecord {
            process: self.process.clone(),
            step: step.to_string(),
            payload: payload.to_string(),
            startpoint,
            endpoint,
        };
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        self.file
            .write_all(line.as_bytes())
            .and_then(|_| self.file.flush())
            .map_err(|source| self.io_error(source))?;

        debug!(step, payload, startpoint, endpoint, "Checkpoint recorded");
        Ok(())
    }

    /// Most recently appended line, without its terminator
    pub fn last(&mut self) -> Result<Option<String>, CheckpointError> {
        Ok(self.lines()?.pop())
    }

    /// Most recent marker, parsed
    pub fn last_record(&mut self) -> Result<Option<CheckpointRecord>, CheckpointError> {
        match self.last()? {
            Some(line) => Ok(Some(serde_json::from_str(&line)?)),
            None => Ok(None),
        }
    }

    /// Every marker in append order
    pub fn records(&mut self) -> Result<Vec<CheckpointRecord>, CheckpointError> {
        self.lines()?
            .iter()
            .map(|line| serde_json::from_str(line).map_err(CheckpointError::from))
            .collect()
    }

    /// Close the log and delete its file
    pub fn clear(self) -> Result<(), CheckpointError> {
        let CheckpointLog { file, path, .. } = self;
        drop(file);
        std::fs::remove_file(&path).map_err(|source| CheckpointError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "Checkpoint log cleared");
        Ok(())
    }

    fn lines(&mut self) -> Result<Vec<String>, CheckpointError> {
        self.file
            .seek(SeekFrom::Start(0))
            .map_err(|source| self.io_error(source))?;

        let mut lines = Vec::new();
        for line in BufReader::new(&self.file).lines() {
            let line = line.map_err(|source| self.io_error(source))?;
            if !line.trim().is_empty() {
                lines.push(line);
            }
        }
        Ok(lines)
    }

    fn io_error(&self, source: std::io::Error) -> CheckpointError {
        CheckpointError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
