use std::io;

use thiserror::Error;

/// Errors reported by [`Buffer`](crate::buffer::Buffer) reads, patches and shifts.
///
/// Every variant is returned before the buffer is touched, so a failed call
/// leaves cursors and contents exactly as they were.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("buffer exhausted: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("offset {offset} with field size {size} outside writable range [{read_pos}, {len}]")]
    OutOfRange {
        offset: usize,
        size: usize,
        read_pos: usize,
        len: usize,
    },

    #[error("invalid shift: dst({dst}), src({src}), read_pos({read_pos}), len({len})")]
    InvalidShift {
        dst: usize,
        src: usize,
        read_pos: usize,
        len: usize,
    },

    #[error("varint data truncated: no terminating byte within {0} bytes")]
    TruncatedVarint(usize),

    #[error("malformed varint: 10th byte {0:#04x} exceeds 1 remaining bit")]
    MalformedVarint(u8),

    #[error("buffer content is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Errors surfaced by logger construction and configuration.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("a default logger is already initialized")]
    AlreadyInitialized,

    #[error("unknown level name {0:?}")]
    InvalidLevel(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T, E = LogError> = std::result::Result<T, E>;
