//! Human-readable progress note file

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::error::LoadError;

/// Progress note file name
pub const PROGRESS_FILE_NAME: &str = "load_progress.txt";

/// Appends `"<N> records inserted"` after each committed batch
///
/// The file is left behind when a load fails and removed by
/// [`ProgressNotes::finish`] on success.
#[derive(Debug)]
pub struct ProgressNotes {
    file: File,
    path: PathBuf,
}

impl ProgressNotes {
    /// Open (creating if absent) the note file in `dir`
    pub fn open(dir: &Path) -> Result<Self, LoadError> {
        let path = dir.join(PROGRESS_FILE_NAME);
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .map_err(|source| LoadError::Progress {
                path: path.clone(),
                source,
            })?;
        Ok(Self { file, path })
    }

    /// Record the number of rows a committed batch inserted
    pub fn note(&mut self, inserted: usize) -> Result<(), LoadError> {
        let line = format!("{inserted} records inserted\n");
        self.file
            .write_all(line.as_bytes())
            .and_then(|_| self.file.flush())
            .map_err(|source| LoadError::Progress {
                path: self.path.clone(),
                source,
            })
    }

    /// Close and delete the note file
    pub fn finish(self) -> Result<(), LoadError> {
        let ProgressNotes { file, path } = self;
        drop(file);
        std::fs::remove_file(&path).map_err(|source| LoadError::Progress { path, source })
    }
}
