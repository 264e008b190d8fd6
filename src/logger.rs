use std::io::{self, Write};
use std::panic::Location;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, SendError, Sender};
use parking_lot::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::config::LoggerConfig;
use crate::error::Result;
use crate::format::Formatter;
use crate::leveled::LeveledLogger;
use crate::level::{Level, LevelGate};
use crate::pool::BufferPool;
use crate::record::{Body, LogRecord, SourceLocation};
use crate::stream_set::StreamSet;
use crate::worker::{Fallback, Intake, Worker};

/// What [`Logger::submit`] did with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the worker.
    Queued,
    /// The pipeline was closed; the record went to the fallback writer.
    Bypassed,
}

/// An asynchronous leveled logger.
///
/// Callers hand records to a bounded queue; a dedicated worker thread
/// renders them, writes them to per-level files (or stdout/stderr) and
/// flushes on a timer. `submit` only blocks while the queue is full.
///
/// The logger is `Send + Sync`; share it behind an [`Arc`]. Dropping the
/// last handle shuts the pipeline down and waits for queued records to be
/// written.
///
/// # Examples
///
/// ```
/// use cascade_logger::{Arg, Level, LeveledLogger, Logger, LoggerConfig};
///
/// let dir = std::env::temp_dir().join("cascade_logger_doc");
/// let config = LoggerConfig::default().with_directory(&dir).with_name("doc");
/// let logger = Logger::new(config).unwrap();
///
/// logger.info(vec![Arg::from("listening on"), Arg::from(8080u16)]);
/// logger.warnf(format_args!("{} retries left", 2));
///
/// // Writes everything still queued, then closes the files.
/// logger.shutdown();
/// ```
pub struct Logger {
    tx: Sender<LogRecord>,
    intake: Arc<Intake>,
    shutdown_tx: Mutex<Option<Sender<()>>>,
    closed_rx: Receiver<()>,
    worker: Mutex<Option<JoinHandle<()>>>,
    fallback: Arc<Fallback>,
    gate: LevelGate,
    source_location: bool,
}

impl Logger {
    /// Starts a logger with the system clock, stderr as fallback writer and
    /// the shared buffer pool.
    pub fn new(config: LoggerConfig) -> Result<Self> {
        LoggerBuilder::new(config).build()
    }

    /// Starts a [`LoggerBuilder`] for injecting a clock, fallback or streams.
    pub fn builder(config: LoggerConfig) -> LoggerBuilder {
        LoggerBuilder::new(config)
    }

    /// Hands `record` to the worker.
    ///
    /// Blocks while the queue is full. Records are still queued while the
    /// worker drains after [`shutdown`](Self::shutdown). Once the backlog is
    /// empty intake closes, and later records are rendered and written
    /// synchronously to the fallback writer, prefixed with `logger discard: `;
    /// nothing is dropped silently.
    pub fn submit(&self, record: LogRecord) -> Delivery {
        let result = self
            .intake
            .admit(record, |record| self.tx.send(record).map_err(|SendError(r)| r));
        match result {
            Ok(()) => Delivery::Queued,
            Err(record) => {
                self.fallback.write(record);
                Delivery::Bypassed
            }
        }
    }

    /// Signals the worker and blocks until it has written every queued
    /// record, closed intake and closed its streams. Safe to call more than once and from
    /// several threads; every caller returns only after the worker is done.
    pub fn shutdown(&self) {
        // Dropping the sender is the shutdown signal.
        drop(self.shutdown_tx.lock().take());
        // Returns once the worker drops its end.
        let _ = self.closed_rx.recv();
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!("log worker panicked");
            }
        }
    }

    /// True once intake has closed and submissions bypass the queue.
    pub fn is_closed(&self) -> bool {
        self.intake.is_closed()
    }

    pub fn gate(&self) -> LevelGate {
        self.gate
    }

    pub fn source_location(&self) -> bool {
        self.source_location
    }
}

impl LeveledLogger for Logger {
    #[inline]
    fn enabled(&self, level: Level) -> bool {
        self.gate.allows(level)
    }

    fn output(&self, level: Level, prefix: Option<&str>, body: Body, location: &'static Location<'static>) {
        let mut record = LogRecord::new(level, body);
        if let Some(prefix) = prefix {
            record = record.with_prefix(prefix);
        }
        if self.source_location {
            record = record.with_location(SourceLocation::from_caller(location));
        }
        self.submit(record);
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("gate", &self.gate)
            .field("source_location", &self.source_location)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Assembles a [`Logger`] with non-default parts.
pub struct LoggerBuilder {
    config: LoggerConfig,
    clock: Arc<dyn Clock>,
    fallback: Option<Box<dyn Write + Send>>,
    pool: Option<BufferPool>,
    streams: Option<StreamSet>,
}

impl LoggerBuilder {
    pub fn new(config: LoggerConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
            fallback: None,
            pool: None,
            streams: None,
        }
    }

    /// Clock used for headers and hour rotation.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Where bypassed records go. Defaults to stderr.
    pub fn fallback(mut self, writer: impl Write + Send + 'static) -> Self {
        self.fallback = Some(Box::new(writer));
        self
    }

    pub fn pool(mut self, pool: BufferPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Uses `streams` instead of building them from the configuration.
    pub fn streams(mut self, streams: StreamSet) -> Self {
        self.streams = Some(streams);
        self
    }

    /// Validates the configuration and spawns the worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Config`](crate::LogError::Config) for an invalid
    /// configuration and [`LogError::Io`](crate::LogError::Io) when the thread
    /// cannot be spawned.
    pub fn build(self) -> Result<Logger> {
        let config = self.config;
        config.validate()?;

        let gate = config.gate();
        let clock = self.clock;
        let streams = match self.streams {
            Some(streams) => streams,
            None => match config.output_dir() {
                Some(dir) => StreamSet::open_dir(
                    dir,
                    config.base_name(),
                    gate,
                    config.max_file_size,
                    Arc::clone(&clock),
                ),
                None => StreamSet::console(gate, Arc::clone(&clock)),
            },
        };
        let pool = self.pool.unwrap_or_else(BufferPool::shared);
        let formatter = Formatter::new(clock);
        let fallback_writer = self
            .fallback
            .unwrap_or_else(|| Box::new(io::stderr()) as Box<dyn Write + Send>);
        let fallback = Arc::new(Fallback::new(fallback_writer, formatter.clone(), pool.clone()));

        let (tx, records) = bounded(config.queue_capacity);
        let (shutdown_tx, shutdown) = bounded::<()>(0);
        let (closed, closed_rx) = bounded::<()>(0);
        let intake = Arc::new(Intake::default());

        let worker = Worker {
            records,
            shutdown,
            closed,
            intake: Arc::clone(&intake),
            streams,
            formatter,
            pool,
            fallback: Arc::clone(&fallback),
            flush_interval: config.flush_interval(),
            failed: false,
        };
        let handle = thread::Builder::new()
            .name("cascade-log-worker".into())
            .spawn(move || worker.run())?;

        tracing::debug!(
            level = %config.level,
            debug = config.debug,
            dir = ?config.output_dir(),
            queue_capacity = config.queue_capacity,
            "logger started"
        );

        Ok(Logger {
            tx,
            intake,
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            closed_rx,
            worker: Mutex::new(Some(handle)),
            fallback,
            gate,
            source_location: config.source_location,
        })
    }
}
