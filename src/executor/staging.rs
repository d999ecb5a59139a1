//! Staging file — an on-disk hand-off of stage input.
//!
//! One file per executor, overwritten on every stage and removed when the
//! owner is dropped. The file is always fully written and closed before the
//! next child opens it.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::buffer::Buffer;

#[derive(Debug)]
pub struct StagingFile {
    path: PathBuf,
}

impl StagingFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the file's content with `input` (truncate, write, flush).
    pub fn write(&self, input: &Buffer) -> io::Result<()> {
        let mut file = File::create(&self.path)?;
        file.write_all(input.as_bytes())?;
        file.flush()?;
        debug!(path = %self.path.display(), bytes = input.len(), "staged stage input");
        Ok(())
    }

    /// Open the staged input for reading, to become a child's stdin.
    pub fn open(&self) -> io::Result<File> {
        File::open(&self.path)
    }
}

impl Drop for StagingFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed staging file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "could not remove staging file"),
        }
    }
}
