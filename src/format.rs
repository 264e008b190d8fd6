//! Record rendering.
//!
//! Every line has the shape
//!
//! ```text
//! yyyymmdd hh:mm:ss.uuuuuu [L]:[prefix]message... [file:line]
//! ```
//!
//! where `L` is the level flag, `[prefix]` appears for prefixed loggers and
//! the `[file:line]` tail appears only when source locations are captured.
//! The header is built by hand into a fixed array; it is the hot path of
//! every record and a general-purpose formatter costs several times more.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Local, Timelike};

use crate::buffer::Buffer;
use crate::clock::{Clock, SystemClock};
use crate::level::Level;
use crate::pool::BufferPool;
use crate::record::LogRecord;

/// Length of the fixed header, up to and including the `:` after the flag.
pub const HEADER_LEN: usize = 29;

const DIGITS: &[u8; 10] = b"0123456789";

/// Renders [`LogRecord`]s into pooled buffers.
#[derive(Debug, Clone)]
pub struct Formatter {
    clock: Arc<dyn Clock>,
}

impl Formatter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Renders `record` into a buffer checked out of `pool`. The caller
    /// owns the result and should hand it back with `pool.release`.
    pub fn render(&self, record: LogRecord, pool: &BufferPool) -> Buffer {
        let mut buf = pool.acquire();
        self.render_into(record, &mut buf);
        buf
    }

    pub fn render_into(&self, record: LogRecord, buf: &mut Buffer) {
        write_header(buf, &self.clock.now(), record.level);
        if let Some(prefix) = &record.prefix {
            buf.write_byte(b'[');
            buf.write_str(prefix);
            buf.write_byte(b']');
        }
        record.body.render(buf);
        match &record.location {
            Some(location) => {
                buf.write_str(" [");
                buf.write_str(&location.file);
                buf.write_byte(b':');
                buf.append_uint(u64::from(location.line));
                buf.write_str("]\n");
            }
            None => buf.write_byte(b'\n'),
        }
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

/// Writes `yyyymmdd hh:mm:ss.uuuuuu [L]:` for `now`.
pub fn write_header(buf: &mut Buffer, now: &DateTime<Local>, level: Level) {
    let mut tmp = [0u8; HEADER_LEN];
    n_digits(&mut tmp, 4, 0, now.year().max(0) as u32, b'0');
    two_digits(&mut tmp, 4, now.month());
    two_digits(&mut tmp, 6, now.day());
    tmp[8] = b' ';
    two_digits(&mut tmp, 9, now.hour());
    tmp[11] = b':';
    two_digits(&mut tmp, 12, now.minute());
    tmp[14] = b':';
    two_digits(&mut tmp, 15, now.second());
    tmp[17] = b'.';
    // Leap seconds report up to 1_999_999 micros.
    n_digits(&mut tmp, 6, 18, now.timestamp_subsec_micros().min(999_999), b'0');
    tmp[24] = b' ';
    tmp[25] = b'[';
    tmp[26] = level.flag();
    tmp[27] = b']';
    tmp[28] = b':';
    buf.write_bytes(&tmp);
}

fn two_digits(tmp: &mut [u8], i: usize, d: u32) {
    tmp[i + 1] = DIGITS[(d % 10) as usize];
    tmp[i] = DIGITS[(d / 10 % 10) as usize];
}

// Right-aligned `n`-digit field at `i`, left-padded with `pad`.
fn n_digits(tmp: &mut [u8], n: usize, i: usize, mut d: u32, pad: u8) {
    let mut j = n;
    while j > 0 && d > 0 {
        j -= 1;
        tmp[i + j] = DIGITS[(d % 10) as usize];
        d /= 10;
    }
    while j > 0 {
        j -= 1;
        tmp[i + j] = pad;
    }
}
