//! # Cascade Logger
//!
//! An asynchronous, leveled text logger with per-level rotating files.
//!
//! * **Non-blocking callers**: records go through a bounded queue to a
//!   single worker thread that renders and writes them
//! * **Cascading files**: a record at level `L` lands in the file of every
//!   enabled level at or below `L`, so `app.inf` is a complete picture and
//!   `app.err` holds only errors
//! * **Rotation**: by size (1 GiB) and by wall-clock hour, with a stable
//!   symlink per level pointing at the current file
//! * **Orderly shutdown**: queued records are always written; records
//!   arriving after shutdown are written synchronously to a fallback sink
//!
//! ## Main Components
//!
//! * [`Logger`]: the pipeline; owns the queue and the worker thread
//! * [`LeveledLogger`]: the `debug`/`info`/`warn`/`error` surface, plus
//!   the `*f` variants taking `format_args!`
//! * [`PrefixLogger`]: a decorator adding `[prefix]` and a minimum level
//! * [`Buffer`] and [`BufferPool`]: the growable byte buffer records are
//!   rendered into, with a little-endian binary codec and LEB128 varints
//! * [`stream_set`]: file naming, recovery and the cascading write
//!
//! ## File Layout
//!
//! ```text
//! <dir>/<name>.<YYYYMMDDHH>.<idx>.<ext>.log     ext ∈ {dbg, inf, wrn, err}
//! <dir>/<name>.<ext> -> current file
//! ```
//!
//! Each line reads `yyyymmdd hh:mm:ss.uuuuuu [L]:[prefix]message [file:line]`.
//!
//! ## Quick Start
//!
//! ```
//! use cascade_logger::{log_record, Arg, Level, LeveledLogger, Logger, LoggerConfig};
//!
//! let dir = std::env::temp_dir().join("cascade_logger_quickstart");
//! let config = LoggerConfig::default()
//!     .with_directory(&dir)
//!     .with_name("quickstart")
//!     .with_debug(true);
//! let logger = Logger::new(config).unwrap();
//!
//! logger.info(vec![Arg::from("server started on port"), Arg::from(8080u16)]);
//! logger.debugf(format_args!("{} workers", 4));
//! log_record!(logger, Level::Error, "disk", "/dev/sda1", "full");
//!
//! logger.shutdown();
//! ```

pub mod buffer;
pub mod clock;
pub mod codec;
pub mod config;
pub mod error;
pub mod facade;
pub mod format;
pub mod global;
pub mod level;
pub mod leveled;
pub mod logger;
pub mod pool;
pub mod record;
pub mod stream;
pub mod stream_set;
mod worker;

pub use buffer::Buffer;
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::FixedWidth;
pub use config::LoggerConfig;
pub use error::{BufferError, LogError, Result};
pub use facade::install_log_facade;
pub use global::{default_logger, init_default, shutdown_default};
pub use level::{Level, LevelGate};
pub use leveled::{LeveledLogger, PrefixLogger};
pub use logger::{Delivery, Logger, LoggerBuilder};
pub use pool::BufferPool;
pub use record::{Arg, Body, LogRecord, SourceLocation};
pub use stream_set::StreamSet;
pub use worker::DISCARD_LABEL;
