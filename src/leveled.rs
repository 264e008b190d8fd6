use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use crate::level::Level;
use crate::record::{Arg, Body};

/// The logging surface shared by [`Logger`](crate::Logger) and its
/// decorators.
///
/// Implementors provide [`enabled`](LeveledLogger::enabled) and
/// [`output`](LeveledLogger::output); the leveled methods are built on
/// those. Calls with no arguments, and calls at a disabled level, do
/// nothing. The call site is captured through `#[track_caller]`.
///
/// The plain methods take owned [`Arg`]s, rendered later on the worker
/// thread. The `*f` methods format their arguments immediately on the
/// calling thread.
pub trait LeveledLogger: Send + Sync {
    fn enabled(&self, level: Level) -> bool;

    /// Delivers a record that already passed [`LeveledLogger::enabled`].
    fn output(&self, level: Level, prefix: Option<&str>, body: Body, location: &'static Location<'static>);

    #[track_caller]
    fn log(&self, level: Level, args: Vec<Arg>) {
        if args.is_empty() || !self.enabled(level) {
            return;
        }
        self.output(level, None, Body::Args(args), Location::caller());
    }

    #[track_caller]
    fn logf(&self, level: Level, args: fmt::Arguments<'_>) {
        if !self.enabled(level) {
            return;
        }
        self.output(level, None, Body::Text(fmt::format(args)), Location::caller());
    }

    /// Defers rendering to `render`, which runs on the worker thread.
    #[track_caller]
    fn log_with<F>(&self, level: Level, render: F)
    where
        F: FnOnce(&mut crate::buffer::Buffer) + Send + 'static,
        Self: Sized,
    {
        if !self.enabled(level) {
            return;
        }
        self.output(level, None, Body::Render(Box::new(render)), Location::caller());
    }

    #[track_caller]
    fn debug(&self, args: Vec<Arg>) {
        self.log(Level::Debug, args)
    }

    #[track_caller]
    fn info(&self, args: Vec<Arg>) {
        self.log(Level::Info, args)
    }

    #[track_caller]
    fn warn(&self, args: Vec<Arg>) {
        self.log(Level::Warn, args)
    }

    #[track_caller]
    fn error(&self, args: Vec<Arg>) {
        self.log(Level::Error, args)
    }

    #[track_caller]
    fn debugf(&self, args: fmt::Arguments<'_>) {
        self.logf(Level::Debug, args)
    }

    #[track_caller]
    fn infof(&self, args: fmt::Arguments<'_>) {
        self.logf(Level::Info, args)
    }

    #[track_caller]
    fn warnf(&self, args: fmt::Arguments<'_>) {
        self.logf(Level::Warn, args)
    }

    #[track_caller]
    fn errorf(&self, args: fmt::Arguments<'_>) {
        self.logf(Level::Error, args)
    }
}

impl<L: LeveledLogger + ?Sized> LeveledLogger for Arc<L> {
    fn enabled(&self, level: Level) -> bool {
        (**self).enabled(level)
    }

    fn output(&self, level: Level, prefix: Option<&str>, body: Body, location: &'static Location<'static>) {
        (**self).output(level, prefix, body, location)
    }
}

impl<L: LeveledLogger + ?Sized> LeveledLogger for &L {
    fn enabled(&self, level: Level) -> bool {
        (**self).enabled(level)
    }

    fn output(&self, level: Level, prefix: Option<&str>, body: Body, location: &'static Location<'static>) {
        (**self).output(level, prefix, body, location)
    }
}

/// A decorator that tags every record with `[prefix]` and drops records
/// below its own minimum level.
///
/// ```
/// use cascade_logger::{Level, LeveledLogger, Logger, LoggerConfig, PrefixLogger};
/// use std::sync::Arc;
///
/// let logger = Arc::new(Logger::new(LoggerConfig::default().with_debug(true)).unwrap());
/// let http = PrefixLogger::new(Arc::clone(&logger), "http").with_min_level(Level::Warn);
/// assert!(!http.enabled(Level::Info));
/// assert!(http.enabled(Level::Error));
/// http.errorf(format_args!("upstream timed out after {}ms", 250));
/// ```
#[derive(Debug, Clone)]
pub struct PrefixLogger<L> {
    inner: L,
    prefix: String,
    min_level: Level,
}

impl<L: LeveledLogger> PrefixLogger<L> {
    /// Passes every level `inner` accepts.
    pub fn new(inner: L, prefix: impl Into<String>) -> Self {
        Self {
            inner,
            prefix: prefix.into(),
            min_level: Level::Debug,
        }
    }

    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }
}

impl<L: LeveledLogger> LeveledLogger for PrefixLogger<L> {
    fn enabled(&self, level: Level) -> bool {
        level >= self.min_level && self.inner.enabled(level)
    }

    fn output(&self, level: Level, prefix: Option<&str>, body: Body, location: &'static Location<'static>) {
        match prefix {
            // Nested decorators read outermost last: `[db/pool]`.
            Some(nested) => {
                let joined = format!("{}/{}", self.prefix, nested);
                self.inner.output(level, Some(&joined), body, location)
            }
            None => self.inner.output(level, Some(&self.prefix), body, location),
        }
    }
}

/// Logs space-separated arguments at a level.
///
/// Each argument is converted with [`Arg::from`](crate::Arg).
///
/// ```
/// use cascade_logger::{log_record, Level, Logger, LoggerConfig};
///
/// let logger = Logger::new(LoggerConfig::default()).unwrap();
/// log_record!(logger, Level::Info, "cache hit ratio", 0.93, "entries", 1200u32);
/// ```
#[macro_export]
macro_rules! log_record {
    ($logger:expr, $level:expr, $($arg:expr),+ $(,)?) => {{
        use $crate::LeveledLogger as _;
        $logger.log($level, ::std::vec![$($crate::Arg::from($arg)),+])
    }};
}

/// Logs a `format!`-style message at a level.
///
/// ```
/// use cascade_logger::{log_recordf, Level, Logger, LoggerConfig};
///
/// let logger = Logger::new(LoggerConfig::default()).unwrap();
/// log_recordf!(logger, Level::Warn, "{} of {} workers busy", 7, 8);
/// ```
#[macro_export]
macro_rules! log_recordf {
    ($logger:expr, $level:expr, $($fmt:tt)+) => {{
        use $crate::LeveledLogger as _;
        $logger.logf($level, ::std::format_args!($($fmt)+))
    }};
}
