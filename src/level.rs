use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LogError;

/// Severity of a log record. The order is total: `Debug < Info < Warn < Error`.
///
/// `Debug` is special: it is enabled by its own flag rather than by the
/// minimum-level threshold (see [`LevelGate`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    #[serde(alias = "debug", alias = "dbg")]
    Debug = 0,
    #[serde(alias = "info", alias = "inf")]
    Info = 1,
    #[serde(alias = "warn", alias = "wrn")]
    Warn = 2,
    #[serde(alias = "error", alias = "err")]
    Error = 3,
}

impl Level {
    pub const ALL: [Level; 4] = [Level::Debug, Level::Info, Level::Warn, Level::Error];

    pub const COUNT: usize = 4;

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }

    /// Single character written into each record header.
    pub fn flag(self) -> u8 {
        match self {
            Level::Debug => b'D',
            Level::Info => b'I',
            Level::Warn => b'W',
            Level::Error => b'E',
        }
    }

    /// Tag used in file names and symlink names.
    pub fn ext(self) -> &'static str {
        match self {
            Level::Debug => "dbg",
            Level::Info => "inf",
            Level::Warn => "wrn",
            Level::Error => "err",
        }
    }

    pub fn from_ext(ext: &str) -> Option<Level> {
        Level::ALL.into_iter().find(|lv| lv.ext() == ext)
    }

    /// Levels from `Debug` up to and including `self`, ascending.
    pub fn up_to(self) -> impl Iterator<Item = Level> {
        Level::ALL.into_iter().take(self.index() + 1)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Level {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Level::ALL
            .into_iter()
            .find(|lv| lv.name().eq_ignore_ascii_case(trimmed) || lv.ext().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| LogError::InvalidLevel(s.to_owned()))
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Trace | log::Level::Debug => Level::Debug,
            log::Level::Info => Level::Info,
            log::Level::Warn => Level::Warn,
            log::Level::Error => Level::Error,
        }
    }
}

/// Decides which levels a sink accepts.
///
/// Non-debug levels pass when they are at or above `min_level`; `Debug`
/// passes only when `debug` is set, whatever the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelGate {
    pub min_level: Level,
    pub debug: bool,
}

impl LevelGate {
    pub fn new(min_level: Level, debug: bool) -> Self {
        Self { min_level, debug }
    }

    #[inline]
    pub fn allows(&self, level: Level) -> bool {
        match level {
            Level::Debug => self.debug,
            _ => level >= self.min_level,
        }
    }

    /// The most verbose `log` crate filter matching this gate.
    pub fn log_filter(&self) -> log::LevelFilter {
        if self.debug {
            return log::LevelFilter::Trace;
        }
        match self.min_level {
            Level::Debug | Level::Info => log::LevelFilter::Info,
            Level::Warn => log::LevelFilter::Warn,
            Level::Error => log::LevelFilter::Error,
        }
    }
}

impl Default for LevelGate {
    fn default() -> Self {
        Self::new(Level::Info, false)
    }
}
