//! File target implementation

use crate::core::{LogEvent, Result, Target, WrapperError};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub struct FileTarget {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    exclusive_lock: bool,
    locked: bool,
}

impl FileTarget {
    /// Open (or create) `path` for appending
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                WrapperError::io_operation(
                    "opening log file",
                    format!("cannot open '{}'", path.display()),
                    e,
                )
            })?;

        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
            exclusive_lock: false,
            locked: false,
        })
    }

    /// Hold an exclusive advisory lock on the file while the target is open
    ///
    /// The lock is taken in [`Target::initialize`], so a second process
    /// wrapping the same file fails to initialize instead of interleaving.
    #[must_use]
    pub fn with_exclusive_lock(mut self, exclusive_lock: bool) -> Self {
        self.exclusive_lock = exclusive_lock;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>> {
        self.writer
            .as_mut()
            .ok_or_else(|| WrapperError::target_write("file", "file target already closed"))
    }
}

impl Target for FileTarget {
    fn name(&self) -> &str {
        "file"
    }

    fn initialize(&mut self) -> Result<()> {
        if self.exclusive_lock && !self.locked {
            let path = self.path.display().to_string();
            self.writer()?
                .get_ref()
                .try_lock_exclusive()
                .map_err(|e| {
                    WrapperError::io_operation(
                        "locking log file",
                        format!("'{}' is locked by another writer", path),
                        e,
                    )
                })?;
            self.locked = true;
        }
        Ok(())
    }

    fn write(&mut self, event: &LogEvent) -> Result<()> {
        let line = event.format_line();
        self.writer()?.write_all(line.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }

    fn close(&mut self) {
        if let Err(e) = self.flush() {
            eprintln!("[ASYNC WRAPPER ERROR] Failed to flush '{}' on close: {}", self.path.display(), e);
        }
        if let Some(writer) = self.writer.take() {
            if self.locked {
                let _ = writer.get_ref().unlock();
                self.locked = false;
            }
        }
    }
}

impl Drop for FileTarget {
    fn drop(&mut self) {
        // Ensure all buffered data is flushed to disk
        let _ = self.flush();
    }
}
