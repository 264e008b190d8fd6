//! The background writer behind a [`Logger`](crate::Logger).
//!
//! The worker moves through three states:
//!
//! * `RUNNING`: waits on the record queue, the flush ticker and the
//!   shutdown signal. Records are rendered and written as they arrive.
//! * `DRAINING`: everything already queued is written out. Submissions
//!   are still queued until the backlog is empty; then intake closes and
//!   any submission that raced with the close is written too.
//! * `CLOSED`: streams are flushed and closed and the closed signal is
//!   published by dropping its sender.
//!
//! If writing fails the worker reports the error, closes its streams and
//! sends every remaining record to the fallback writer instead.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{select, tick, Receiver, Sender};
use parking_lot::Mutex;

use crate::format::Formatter;
use crate::pool::BufferPool;
use crate::record::LogRecord;
use crate::stream_set::StreamSet;

/// Label written in front of records that bypass the queue.
pub const DISCARD_LABEL: &str = "logger discard: ";

/// Intake bookkeeping shared by submitters and the worker.
///
/// A submitter bumps `in_flight` before looking at `closed` and drops it
/// once its send has returned. The worker sets `closed` and then drains
/// until `in_flight` reads zero, so a record is either queued before the
/// final drain or sees `closed` and takes the fallback path.
#[derive(Debug, Default)]
pub(crate) struct Intake {
    closed: AtomicBool,
    in_flight: AtomicUsize,
}

impl Intake {
    /// Runs `send` unless intake is closed. Returns the record back when it
    /// was not queued.
    pub(crate) fn admit<F>(&self, record: LogRecord, send: F) -> Result<(), LogRecord>
    where
        F: FnOnce(LogRecord) -> Result<(), LogRecord>,
    {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let result = if self.closed.load(Ordering::SeqCst) {
            Err(record)
        } else {
            send(record)
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn quiescent(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) == 0
    }
}

/// Synchronous writer for records that cannot go through the queue.
pub(crate) struct Fallback {
    writer: Mutex<Box<dyn Write + Send>>,
    formatter: Formatter,
    pool: BufferPool,
}

impl Fallback {
    pub(crate) fn new(writer: Box<dyn Write + Send>, formatter: Formatter, pool: BufferPool) -> Self {
        Self {
            writer: Mutex::new(writer),
            formatter,
            pool,
        }
    }

    pub(crate) fn write(&self, record: LogRecord) {
        let mut buf = self.pool.acquire();
        buf.write_str(DISCARD_LABEL);
        self.formatter.render_into(record, &mut buf);
        let result = {
            let mut writer = self.writer.lock();
            writer.write_all(buf.as_bytes()).and_then(|()| writer.flush())
        };
        if let Err(e) = result {
            tracing::error!(error = %e, "fallback write failed, record lost");
        }
        self.pool.release(buf);
    }
}

enum Event {
    Record(LogRecord),
    Tick,
    Shutdown,
}

pub(crate) struct Worker {
    pub(crate) records: Receiver<LogRecord>,
    pub(crate) shutdown: Receiver<()>,
    // Dropped on exit; waiters on the paired receiver wake up then.
    pub(crate) closed: Sender<()>,
    pub(crate) intake: Arc<Intake>,
    pub(crate) streams: StreamSet,
    pub(crate) formatter: Formatter,
    pub(crate) pool: BufferPool,
    pub(crate) fallback: Arc<Fallback>,
    pub(crate) flush_interval: Duration,
    pub(crate) failed: bool,
}

impl Worker {
    pub(crate) fn run(mut self) {
        tracing::debug!(flush_interval = ?self.flush_interval, "log worker running");
        let ticker = tick(self.flush_interval);
        loop {
            let event = select! {
                recv(self.records) -> msg => match msg {
                    Ok(record) => Event::Record(record),
                    Err(_) => Event::Shutdown,
                },
                recv(ticker) -> _ => Event::Tick,
                recv(self.shutdown) -> _ => Event::Shutdown,
            };
            match event {
                Event::Record(record) => {
                    self.handle(record);
                    if self.failed {
                        break;
                    }
                }
                Event::Tick => self.streams.flush(),
                Event::Shutdown => break,
            }
        }

        tracing::debug!(failed = self.failed, "log worker draining");
        self.drain();
        self.streams.flush();
        self.streams.close();
        tracing::debug!("log worker closed");
        drop(self.closed);
    }

    fn drain(&mut self) {
        // Submitters keep queueing while there is room; intake closes once
        // the backlog is gone.
        while let Ok(record) = self.records.try_recv() {
            self.handle(record);
        }
        self.intake.close();
        loop {
            while let Ok(record) = self.records.try_recv() {
                self.handle(record);
            }
            if self.intake.quiescent() {
                // Sends that finished before the count dropped are visible now.
                while let Ok(record) = self.records.try_recv() {
                    self.handle(record);
                }
                return;
            }
            thread::yield_now();
        }
    }

    fn handle(&mut self, record: LogRecord) {
        if self.failed {
            self.fallback.write(record);
            return;
        }
        if let Err(e) = self.write(record) {
            tracing::error!(error = %e, "log write failed, stopping worker");
            self.failed = true;
            self.intake.close();
            self.streams.close();
        }
    }

    fn write(&mut self, record: LogRecord) -> io::Result<()> {
        let level = record.level;
        let buf = self.formatter.render(record, &self.pool);
        let result = self.streams.write(level, buf.as_bytes());
        self.pool.release(buf);
        result
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    use chrono::{Local, TimeZone};
    use crossbeam_channel::{bounded, SendError, Sender};

    use super::{Fallback, Intake, Worker};
    use crate::clock::{Clock, ManualClock};
    use crate::config::LoggerConfig;
    use crate::format::Formatter;
    use crate::level::Level;
    use crate::pool::BufferPool;
    use crate::record::{Body, LogRecord};
    use crate::stream_set::StreamSet;

    /// Submits one more record from inside the first write, i.e. while the
    /// worker is draining.
    struct SubmitOnWrite {
        out: Arc<Mutex<Vec<u8>>>,
        tx: Sender<LogRecord>,
        intake: Arc<Intake>,
        admitted: Arc<Mutex<Option<bool>>>,
    }

    impl Write for SubmitOnWrite {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let mut admitted = self.admitted.lock().unwrap();
            if admitted.is_none() {
                let record = LogRecord::new(Level::Info, Body::Text("during drain".into()));
                let tx = &self.tx;
                let result = self.intake.admit(record, |r| tx.send(r).map_err(|SendError(r)| r));
                *admitted = Some(result.is_ok());
            }
            self.out.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_drain_accepts_submissions_while_queue_has_room() {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(Local.with_ymd_and_hms(2021, 3, 7, 9, 0, 0).unwrap()));
        let (tx, records) = bounded(4);
        let (_shutdown_tx, shutdown) = bounded::<()>(0);
        let (closed, _closed_rx) = bounded::<()>(0);
        let intake = Arc::new(Intake::default());
        let out = Arc::new(Mutex::new(Vec::new()));
        let admitted = Arc::new(Mutex::new(None));

        let writer = SubmitOnWrite {
            out: Arc::clone(&out),
            tx: tx.clone(),
            intake: Arc::clone(&intake),
            admitted: Arc::clone(&admitted),
        };
        let mut writer = Some(writer);
        let streams = StreamSet::console_with(LoggerConfig::default().gate(), Arc::clone(&clock), |level| {
            match (level, writer.take()) {
                (Level::Info, Some(w)) => Box::new(w) as Box<dyn Write + Send>,
                _ => Box::new(io::sink()),
            }
        });
        let formatter = Formatter::new(clock);
        let pool = BufferPool::new();
        let fallback = Arc::new(Fallback::new(Box::new(io::sink()), formatter.clone(), pool.clone()));

        // Large enough to bypass the stream's write buffer.
        let queued = format!("queued {}", ".".repeat(9000));
        tx.send(LogRecord::new(Level::Info, Body::Text(queued))).unwrap();

        let mut worker = Worker {
            records,
            shutdown,
            closed,
            intake: Arc::clone(&intake),
            streams,
            formatter,
            pool,
            fallback,
            flush_interval: std::time::Duration::from_secs(5),
            failed: false,
        };
        worker.drain();
        worker.streams.flush();

        assert_eq!(*admitted.lock().unwrap(), Some(true), "Intake stays open while records are queued");
        assert!(intake.is_closed(), "Intake closes once the backlog is gone");
        let text = String::from_utf8(out.lock().unwrap().clone()).unwrap();
        let bodies: Vec<&str> = text
            .lines()
            .map(|line| line[line.find("]:").unwrap() + 2..].split(' ').next().unwrap())
            .collect();
        assert_eq!(bodies, ["queued", "during"]);
    }
}
