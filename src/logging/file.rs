//! Size-rotated append-only log file.
//!
//! # Responsibilities
//! - Append formatted lines to the active file
//! - Roll the file when it exceeds the size cap
//! - Bound the number of retained rotated files, discarding the oldest
//!
//! # Design Decisions
//! - Rotation renames `api.log` → `api.log.1` → `api.log.2` …; the active
//!   file is always the bare path
//! - Only the master writes the file, so no cross-process locking is needed

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

/// Default size cap per file: 5 MiB.
pub const DEFAULT_MAX_SIZE: u64 = 5 * 1024 * 1024;

/// Default retained-file bound, counting the active file.
pub const DEFAULT_MAX_FILES: usize = 10;

/// Append-only writer with size-based rotation.
pub struct RotatingFileWriter {
    path: PathBuf,
    max_size: u64,
    max_files: usize,
    file: Option<File>,
    written: u64,
}

impl RotatingFileWriter {
    /// Open (or create) the active file, creating parent directories.
    pub fn open(path: impl Into<PathBuf>, max_size: u64, max_files: usize) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path,
            max_size: max_size.max(1),
            max_files: max_files.max(1),
            file: Some(file),
            written,
        })
    }

    /// Append one line, rotating first if the line would exceed the cap.
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        let len = line.len() as u64 + 1;
        if self.written > 0 && self.written + len > self.max_size {
            self.rotate()?;
        }
        if self.file.is_none() {
            // previous rotation failed; try to reopen
            let f = OpenOptions::new().create(true).append(true).open(&self.path)?;
            self.written = f.metadata()?.len();
            self.file = Some(f);
        }
        let Some(file) = self.file.as_mut() else {
            return Ok(());
        };
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        self.written += len;
        Ok(())
    }

    fn rotated_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file = None;

        // drop the oldest, then shift the rest up by one
        let oldest = self.rotated_path(self.max_files - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for i in (1..self.max_files - 1).rev() {
            let from = self.rotated_path(i);
            if from.exists() {
                fs::rename(&from, self.rotated_path(i + 1))?;
            }
        }
        if self.max_files > 1 {
            fs::rename(&self.path, self.rotated_path(1))?;
        } else {
            fs::remove_file(&self.path)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        self.file = Some(file);
        self.written = 0;
        Ok(())
    }
}
