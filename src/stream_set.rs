//! Per-level output streams and the cascading write.
//!
//! In directory mode every enabled level owns a file under the output
//! directory:
//!
//! ```text
//! <dir>/<name>.<YYYYMMDDHH>.<idx>.<ext>.log
//! <dir>/<name>.<ext> -> <name>.<YYYYMMDDHH>.<idx>.<ext>.log
//! ```
//!
//! A record at level `L` is appended to every enabled stream at or below
//! `L`, so `inf` holds everything from INFO up and `err` only errors.
//! Console mode instead writes each record once, to stdout or stderr.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};

use crate::buffer::Buffer;
use crate::clock::{hour_stamp, Clock};
use crate::level::{Level, LevelGate};
use crate::stream::{FileStream, RotateTrigger};

#[derive(Debug)]
enum Sink {
    Directory { dir: PathBuf, name: String },
    Console,
}

/// The worker-owned set of per-level streams.
#[derive(Debug)]
pub struct StreamSet {
    streams: [FileStream; Level::COUNT],
    gate: LevelGate,
    sink: Sink,
    clock: Arc<dyn Clock>,
}

impl StreamSet {
    /// Opens directory mode under `dir`. Files are created lazily on the
    /// first write of each level; existing files from the current hour are
    /// picked up so a restart appends instead of starting over at index 0.
    pub fn open_dir(
        dir: impl Into<PathBuf>,
        name: impl Into<String>,
        gate: LevelGate,
        max_size: u64,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let dir = dir.into();
        if let Err(e) = create_dir(&dir) {
            tracing::error!(error = %e, dir = %dir.display(), "failed to create log directory");
        }
        let mut set = Self {
            streams: std::array::from_fn(|_| FileStream::new(max_size)),
            gate,
            sink: Sink::Directory {
                dir,
                name: name.into(),
            },
            clock,
        };
        set.recover_indices();
        set
    }

    /// Console mode: DEBUG, INFO and WARN to stdout, ERROR to stderr.
    pub fn console(gate: LevelGate, clock: Arc<dyn Clock>) -> Self {
        Self::console_with(gate, clock, |level| -> Box<dyn Write + Send> {
            match level {
                Level::Error => Box::new(io::stderr()),
                _ => Box::new(io::stdout()),
            }
        })
    }

    /// Console mode with caller-supplied writers, one per enabled level.
    pub fn console_with<F>(gate: LevelGate, clock: Arc<dyn Clock>, mut make: F) -> Self
    where
        F: FnMut(Level) -> Box<dyn Write + Send>,
    {
        let mut streams: [FileStream; Level::COUNT] = std::array::from_fn(|_| FileStream::new(u64::MAX));
        for level in Level::ALL {
            if gate.allows(level) {
                streams[level.index()].attach(make(level), None, 0);
            }
        }
        Self {
            streams,
            gate,
            sink: Sink::Console,
            clock,
        }
    }

    /// True when records go to stdout/stderr instead of files.
    pub fn is_console(&self) -> bool {
        matches!(self.sink, Sink::Console)
    }

    /// Whether `level` has a stream, per the level gate.
    #[inline]
    pub fn enabled(&self, level: Level) -> bool {
        self.gate.allows(level)
    }

    /// The stream that holds `level`'s records.
    pub fn stream(&self, level: Level) -> &FileStream {
        &self.streams[level.index()]
    }

    /// Writes one rendered record.
    ///
    /// Directory mode cascades `data` into every enabled stream from DEBUG
    /// up to `level`, rotating each first when it is due. Console mode
    /// writes to `level`'s stream only. The first write error aborts the
    /// call.
    pub fn write(&mut self, level: Level, data: &[u8]) -> io::Result<()> {
        if self.is_console() {
            if !self.enabled(level) {
                return Ok(());
            }
            return self.streams[level.index()].write(data);
        }

        let now = self.clock.now();
        for lv in level.up_to() {
            if !self.enabled(lv) {
                continue;
            }
            if let Some(trigger) = self.streams[lv.index()].rotation_due(&now) {
                self.rotate(lv, trigger, &now);
            }
            self.streams[lv.index()].write(data)?;
        }
        Ok(())
    }

    /// Flushes every open stream. Failures are reported and skipped.
    pub fn flush(&mut self) {
        for (level, stream) in Level::ALL.into_iter().zip(self.streams.iter_mut()) {
            if let Err(e) = stream.flush() {
                tracing::error!(error = %e, level = %level, "flush failed");
            }
        }
    }

    /// Flushes and closes every stream; the next write reopens.
    pub fn close(&mut self) {
        for stream in self.streams.iter_mut() {
            stream.close();
        }
    }

    fn rotate(&mut self, level: Level, trigger: RotateTrigger, now: &DateTime<Local>) {
        let Sink::Directory { dir, name } = &self.sink else {
            return;
        };
        let stream = &mut self.streams[level.index()];
        stream.begin_rotation(trigger, now);

        let file_name = file_name(name, &hour_stamp(now), stream.index(), level);
        let path = dir.join(&file_name);
        let file = match open_append(&path) {
            Ok(file) => file,
            Err(e) => {
                tracing::error!(error = %e, path = %path.display(), "failed to open log file");
                return;
            }
        };
        let existing = file.metadata().map(|m| m.len()).unwrap_or(0);
        stream.attach(Box::new(file), Some(path.clone()), existing);
        tracing::debug!(path = %path.display(), ?trigger, "log file opened");

        relink(&dir.join(link_name(name, level)), Path::new(&file_name));
    }

    /// Adopts the highest index written during the current hour for each
    /// level, together with that file's size.
    fn recover_indices(&mut self) {
        let Sink::Directory { dir, name } = &self.sink else {
            return;
        };
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!(error = %e, dir = %dir.display(), "failed to scan log directory");
                return;
            }
        };

        let stamp = hour_stamp(&self.clock.now());
        let owner = format!("{}.", name);
        let mut found: [Option<(u32, u64)>; Level::COUNT] = [None; Level::COUNT];
        for entry in entries.flatten() {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if !file_name.starts_with(&owner) {
                continue;
            }
            let Some((index, level)) = parse_index_and_level(&stamp, file_name) else {
                continue;
            };
            let size = match entry.metadata() {
                Ok(meta) if meta.is_file() => meta.len(),
                _ => continue,
            };
            let slot = &mut found[level.index()];
            if slot.map_or(true, |(best, _)| index > best) {
                *slot = Some((index, size));
            }
        }

        for (stream, slot) in self.streams.iter_mut().zip(found) {
            if let Some((index, size)) = slot {
                stream.recover(index, size);
            }
        }
    }
}

/// `<name>.<stamp>.<index>.<ext>.log`
pub fn file_name(name: &str, stamp: &str, index: u32, level: Level) -> String {
    let mut buf = Buffer::with_capacity(name.len() + stamp.len() + 20);
    buf.write_str(name);
    buf.write_byte(b'.');
    buf.write_str(stamp);
    buf.write_byte(b'.');
    buf.append_uint(u64::from(index));
    buf.write_byte(b'.');
    buf.write_str(level.ext());
    buf.write_str(".log");
    buf.to_string_lossy().into_owned()
}

/// `<name>.<ext>`
pub fn link_name(name: &str, level: Level) -> String {
    format!("{}.{}", name, level.ext())
}

/// Extracts the index and level from a log file name stamped with `stamp`.
///
/// Names that do not carry the stamp, a known level tag and a numeric
/// index yield `None`.
///
/// ```
/// # use cascade_logger::stream_set::parse_index_and_level;
/// # use cascade_logger::Level;
/// let parsed = parse_index_and_level("2021030709", "app.2021030709.3.wrn.log");
/// assert_eq!(parsed, Some((3, Level::Warn)));
/// assert_eq!(parse_index_and_level("2021030709", "app.2021030708.3.wrn.log"), None);
/// ```
pub fn parse_index_and_level(stamp: &str, file_name: &str) -> Option<(u32, Level)> {
    let at = file_name.find(stamp)?;
    let rest = file_name[at + stamp.len()..].strip_prefix('.')?;
    let rest = rest.strip_suffix(".log")?;
    let (index, ext) = rest.split_once('.')?;
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((index.parse().ok()?, Level::from_ext(ext)?))
}

fn create_dir(dir: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o774);
    }
    builder.create(dir)
}

fn open_append(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o664);
    }
    options.open(path)
}

// Points `link` at `target`, relative to the link's directory.
fn relink(link: &Path, target: &Path) {
    match fs::remove_file(link) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::error!(error = %e, link = %link.display(), "failed to remove stale symlink");
            return;
        }
    }
    #[cfg(unix)]
    {
        if let Err(e) = std::os::unix::fs::symlink(target, link) {
            tracing::error!(error = %e, link = %link.display(), "failed to create symlink");
        }
    }
    #[cfg(not(unix))]
    let _ = target;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        assert_eq!(file_name("svc", "2021030709", 12, Level::Error), "svc.2021030709.12.err.log");
        assert_eq!(link_name("svc", Level::Debug), "svc.dbg");
    }

    #[test]
    fn test_parse_rejects_foreign_names() {
        let stamp = "2021030709";
        assert_eq!(parse_index_and_level(stamp, "svc.2021030709.0.inf.log"), Some((0, Level::Info)));
        assert_eq!(parse_index_and_level(stamp, "svc.inf"), None);
        assert_eq!(parse_index_and_level(stamp, "svc.2021030709.x.inf.log"), None);
        assert_eq!(parse_index_and_level(stamp, "svc.2021030709.1.txt.log"), None);
        assert_eq!(parse_index_and_level(stamp, "svc.2021030709.1.inf.log.gz"), None);
    }
}
