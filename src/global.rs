//! An optional process-wide default logger.
//!
//! Nothing is installed implicitly: call [`init_default`] once at startup
//! and [`shutdown_default`] before exit to get queued records on disk.

use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::RwLock;

use crate::config::LoggerConfig;
use crate::error::{LogError, Result};
use crate::logger::Logger;

lazy_static! {
    static ref DEFAULT_LOGGER: RwLock<Option<Arc<Logger>>> = RwLock::new(None);
}

/// Builds the default logger from `config`.
///
/// Returns [`LogError::AlreadyInitialized`] if one is installed already.
pub fn init_default(config: LoggerConfig) -> Result<Arc<Logger>> {
    let mut slot = DEFAULT_LOGGER.write();
    if slot.is_some() {
        return Err(LogError::AlreadyInitialized);
    }
    let logger = Arc::new(Logger::new(config)?);
    *slot = Some(Arc::clone(&logger));
    Ok(logger)
}

/// The logger installed by [`init_default`], if any.
pub fn default_logger() -> Option<Arc<Logger>> {
    DEFAULT_LOGGER.read().clone()
}

/// Uninstalls the default logger and waits for its worker to finish.
/// Other handles to it keep working, but their records take the fallback
/// path from now on.
pub fn shutdown_default() {
    let logger = DEFAULT_LOGGER.write().take();
    if let Some(logger) = logger {
        logger.shutdown();
    }
}
