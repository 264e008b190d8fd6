//! Routes the `log` crate's macros into a [`Logger`].

use std::sync::Arc;

use crate::error::{LogError, Result};
use crate::leveled::LeveledLogger;
use crate::level::Level;
use crate::logger::Logger;
use crate::record::{Body, LogRecord, SourceLocation};

/// A [`log::Log`] implementation backed by a [`Logger`]. `TRACE` is
/// treated as `DEBUG`.
#[derive(Debug)]
pub struct LogBridge {
    logger: Arc<Logger>,
}

impl LogBridge {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        self.logger.enabled(Level::from(metadata.level()))
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut entry = LogRecord::new(Level::from(record.level()), Body::Text(record.args().to_string()));
        if self.logger.source_location() {
            if let (Some(file), Some(line)) = (record.file(), record.line()) {
                entry = entry.with_location(SourceLocation::new(file.to_owned(), line));
            }
        }
        self.logger.submit(entry);
    }

    fn flush(&self) {}
}

/// Installs `logger` as the process-wide `log` backend.
///
/// Fails with [`LogError::AlreadyInitialized`] when some `log` backend is
/// already installed.
pub fn install_log_facade(logger: Arc<Logger>) -> Result<()> {
    let filter = logger.gate().log_filter();
    log::set_boxed_logger(Box::new(LogBridge::new(logger))).map_err(|_| LogError::AlreadyInitialized)?;
    log::set_max_level(filter);
    Ok(())
}
