use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{LogError, Result};
use crate::level::{Level, LevelGate};
use crate::stream::MAX_FILE_SIZE;

pub const DEFAULT_QUEUE_CAPACITY: usize = 64;
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 5_000;

pub const ENV_LEVEL: &str = "CASCADE_LOG_LEVEL";
pub const ENV_DIR: &str = "CASCADE_LOG_DIR";
pub const ENV_DEBUG: &str = "CASCADE_LOG_DEBUG";
pub const ENV_STD: &str = "CASCADE_LOG_STD";

/// Logger settings.
///
/// Deserializes from any serde format; missing fields take their defaults.
///
/// ```
/// use cascade_logger::{Level, LoggerConfig};
///
/// let config: LoggerConfig = serde_json::from_str(r#"{"level": "warn", "debug": true}"#).unwrap();
/// assert_eq!(config.level, Level::Warn);
/// assert!(config.debug);
/// assert_eq!(config.queue_capacity, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Lowest non-debug level written.
    pub level: Level,
    /// Output directory. Without one, records go to stdout and stderr.
    pub directory: Option<PathBuf>,
    /// Enables the DEBUG channel.
    pub debug: bool,
    /// Use stdout and stderr even when a directory is set.
    pub force_std: bool,
    /// Append ` [file:line]` to each record.
    pub source_location: bool,
    /// File name prefix. Defaults to the executable's name.
    pub name: Option<String>,
    pub queue_capacity: usize,
    pub flush_interval_ms: u64,
    pub max_file_size: u64,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: Level::Info,
            directory: None,
            debug: false,
            force_std: false,
            source_location: false,
            name: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL_MS,
            max_file_size: MAX_FILE_SIZE,
        }
    }
}

impl LoggerConfig {
    /// Defaults overlaid with `CASCADE_LOG_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::default().overlay(|key| env::var(key).ok())
    }

    /// Applies settings from `lookup`, which maps a variable name to its value.
    pub fn overlay<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup(ENV_LEVEL) {
            self.level = level.parse()?;
        }
        if let Some(dir) = lookup(ENV_DIR) {
            self.directory = if dir.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(dir))
            };
        }
        if let Some(debug) = lookup(ENV_DEBUG) {
            self.debug = parse_flag(ENV_DEBUG, &debug)?;
        }
        if let Some(force) = lookup(ENV_STD) {
            self.force_std = parse_flag(ENV_STD, &force)?;
        }
        Ok(self)
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directory = Some(dir.into());
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_force_std(mut self, force: bool) -> Self {
        self.force_std = force;
        self
    }

    pub fn with_source_location(mut self, on: bool) -> Self {
        self.source_location = on;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval_ms = interval.as_millis().min(u128::from(u64::MAX)) as u64;
        self
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn gate(&self) -> LevelGate {
        LevelGate::new(self.level, self.debug)
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    /// The directory to write to, or `None` for console mode.
    pub fn output_dir(&self) -> Option<&Path> {
        if self.force_std {
            return None;
        }
        self.directory.as_deref()
    }

    /// The configured name, or the running executable's file stem.
    pub fn base_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => default_base_name(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(LogError::Config("queue_capacity must be at least 1".into()));
        }
        if self.flush_interval_ms == 0 {
            return Err(LogError::Config("flush_interval_ms must be positive".into()));
        }
        if self.max_file_size == 0 {
            return Err(LogError::Config("max_file_size must be positive".into()));
        }
        if let Some(name) = &self.name {
            if name.is_empty() || name.contains(|c: char| c == '/' || c == '\\') {
                return Err(LogError::Config(format!("invalid log name {:?}", name)));
            }
        }
        Ok(())
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(LogError::Config(format!("{} expects a boolean, got {:?}", key, other))),
    }
}

fn default_base_name() -> String {
    env::args_os()
        .next()
        .as_deref()
        .map(Path::new)
        .and_then(Path::file_stem)
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "app".to_owned())
}
