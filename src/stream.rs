use std::fmt;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::clock::hour_bucket;

/// Size at which a stream rotates to its next index.
pub const MAX_FILE_SIZE: u64 = 1 << 30;

/// Why a stream is being rotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateTrigger {
    /// The size since the last rotation reached the limit.
    Size,
    /// The wall-clock hour moved on. `reset_index` is false only for the
    /// very first open, which keeps the index recovered at startup.
    Hour { reset_index: bool },
    /// An earlier open failed; try again with the same index.
    Reopen,
}

/// Output for a single level: a buffered writer plus rotation bookkeeping.
///
/// Only the worker thread ever touches a stream, so nothing here locks.
pub struct FileStream {
    writer: Option<BufWriter<Box<dyn Write + Send>>>,
    path: Option<PathBuf>,
    written: u64,
    created_hour: Option<i64>,
    index: u32,
    max_size: u64,
}

impl FileStream {
    pub fn new(max_size: u64) -> Self {
        Self {
            writer: None,
            path: None,
            written: 0,
            created_hour: None,
            index: 0,
            max_size,
        }
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    /// Index of the current (or next) file within the hour.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Bytes written since the last rotation.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Hour bucket the current file was opened in.
    pub fn created_hour(&self) -> Option<i64> {
        self.created_hour
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Seeds the index and size found on disk at startup.
    pub(crate) fn recover(&mut self, index: u32, written: u64) {
        self.index = index;
        self.written = written;
    }

    /// Checks whether the next write must go to a fresh file.
    pub fn rotation_due(&self, now: &DateTime<Local>) -> Option<RotateTrigger> {
        if self.written >= self.max_size {
            return Some(RotateTrigger::Size);
        }
        match self.created_hour {
            None => Some(RotateTrigger::Hour { reset_index: false }),
            Some(hour) if hour < hour_bucket(now) => Some(RotateTrigger::Hour { reset_index: true }),
            Some(_) if !self.is_open() => Some(RotateTrigger::Reopen),
            Some(_) => None,
        }
    }

    /// Releases the current file and moves the index for `trigger`. The
    /// caller opens the next file and hands it to [`FileStream::attach`].
    pub fn begin_rotation(&mut self, trigger: RotateTrigger, now: &DateTime<Local>) {
        self.release();
        match trigger {
            RotateTrigger::Size => {
                self.index += 1;
                self.written = 0;
            }
            RotateTrigger::Hour { reset_index: true } => {
                self.index = 0;
                self.written = 0;
            }
            RotateTrigger::Hour { reset_index: false } | RotateTrigger::Reopen => {}
        }
        self.created_hour = Some(hour_bucket(now));
    }

    /// Starts writing to `writer`, which already holds `existing` bytes.
    pub fn attach(&mut self, writer: Box<dyn Write + Send>, path: Option<PathBuf>, existing: u64) {
        self.writer = Some(BufWriter::new(writer));
        self.path = path;
        self.written = existing;
    }

    /// Appends `data`. A stream without a file silently drops the write;
    /// the failure that closed it has already been reported.
    pub fn write(&mut self, data: &[u8]) -> io::Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        writer.write_all(data)?;
        self.written += data.len() as u64;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }

    /// Flushes and closes the file, moving on to the next index.
    pub fn close(&mut self) {
        if !self.is_open() {
            return;
        }
        self.release();
        self.index += 1;
        self.written = 0;
    }

    fn release(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                tracing::error!(error = %e, path = ?self.path, "flush before close failed");
            }
        }
    }
}

impl fmt::Debug for FileStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStream")
            .field("open", &self.is_open())
            .field("path", &self.path)
            .field("written", &self.written)
            .field("created_hour", &self.created_hour)
            .field("index", &self.index)
            .finish()
    }
}
