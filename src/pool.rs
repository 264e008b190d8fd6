use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::Mutex;

use crate::buffer::Buffer;

/// Capacity given to buffers the pool creates from scratch.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;

/// Idle buffers kept beyond this count are dropped on release.
pub const DEFAULT_MAX_IDLE: usize = 1024;

lazy_static! {
    static ref SHARED_POOL: BufferPool = BufferPool::new();
}

/// A cache of reusable [`Buffer`]s.
///
/// Ownership does the bookkeeping: [`BufferPool::acquire`] hands out a
/// `Buffer` by value and [`BufferPool::release`] takes it back by value, so
/// a released buffer cannot be touched again by its previous holder. Which
/// idle buffer comes back from `acquire` is unspecified.
///
/// Cloning a pool is cheap and yields a handle to the same cache.
///
/// # Examples
///
/// ```
/// use cascade_logger::BufferPool;
///
/// let pool = BufferPool::new();
/// let mut buf = pool.acquire();
/// buf.write_str("scratch");
/// pool.release(buf);
///
/// let buf = pool.acquire();
/// assert!(buf.is_empty());
/// assert!(buf.capacity() >= 1024);
/// ```
#[derive(Debug, Clone)]
pub struct BufferPool {
    inner: Arc<PoolInner>,
}

#[derive(Debug)]
struct PoolInner {
    idle: Mutex<Vec<Buffer>>,
    buffer_capacity: usize,
    max_idle: usize,
}

impl BufferPool {
    /// A private pool with the default buffer size and idle limit.
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_BUFFER_CAPACITY, DEFAULT_MAX_IDLE)
    }

    /// A pool handing out buffers of `buffer_capacity` bytes and keeping at
    /// most `max_idle` of them between uses.
    pub fn with_limits(buffer_capacity: usize, max_idle: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                idle: Mutex::new(Vec::new()),
                buffer_capacity,
                max_idle,
            }),
        }
    }

    /// The process-wide pool used by loggers unless told otherwise.
    pub fn shared() -> BufferPool {
        SHARED_POOL.clone()
    }

    /// Checks out an empty buffer.
    pub fn acquire(&self) -> Buffer {
        let recycled = self.inner.idle.lock().pop();
        match recycled {
            Some(mut buf) => {
                buf.reset();
                buf
            }
            None => Buffer::with_capacity(self.inner.buffer_capacity),
        }
    }

    /// Returns a buffer to the pool. Its cursors are reset and its
    /// capacity kept.
    pub fn release(&self, mut buf: Buffer) {
        buf.reset();
        let mut idle = self.inner.idle.lock();
        if idle.len() < self.inner.max_idle {
            idle.push(buf);
        }
    }

    /// Number of buffers currently waiting in the pool.
    pub fn idle_count(&self) -> usize {
        self.inner.idle.lock().len()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}
