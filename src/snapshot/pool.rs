//! Per-layer buffer pool.
//!
//! Layer buffers are never destroyed in normal operation — once rented and
//! disposed they sit in a free list for reuse by the next frame, keyed by
//! the capacity the caller asked for. The pool grows on demand; call
//! [`LayerPool::trim`] periodically (e.g. after a layer is torn down) to
//! release buffers that have gone unused for a while.
//!
//! A rented buffer is opaque bytes, not a drawing surface — rasterization
//! lives behind [`crate::canvas::Canvas`], a separate backend seam. This
//! pool only exists to give the snapshot/refcount machinery something real
//! to rent, return, and count.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::lease::Lease;
use crate::errors::{CanvasError, Result};

/// An opaque, reusable byte buffer for one layer's pooled storage.
#[derive(Debug, Default)]
pub struct LayerBuffer {
    bytes: Vec<u8>,
}

impl LayerBuffer {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_mut_vec(&mut self) -> &mut Vec<u8> {
        &mut self.bytes
    }

    /// Empties the buffer's contents without shrinking its capacity.
    pub fn reset(&mut self) {
        self.bytes.clear();
    }
}

struct PooledBuffer {
    buffer: LayerBuffer,
    idle_frames: u32,
}

/// A free-list pool of [`LayerBuffer`]s, cheaply cloneable (the free list is
/// behind an `Arc`) so rented leases can return their buffer without the
/// pool needing to outlive the lease.
#[derive(Clone)]
pub struct LayerPool {
    free: Arc<Mutex<Vec<PooledBuffer>>>,
    disposed: Arc<AtomicBool>,
}

impl LayerPool {
    #[must_use]
    pub fn new() -> Self {
        Self {
            free: Arc::new(Mutex::new(Vec::new())),
            disposed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Rents a buffer with at least `min_capacity` bytes of capacity,
    /// reusing the largest-idle free buffer that already satisfies it, or
    /// allocating a new one. The returned lease returns the buffer to this
    /// pool's free list when disposed — unless the pool itself has been
    /// disposed by then, in which case the buffer is dropped instead of
    /// re-queued.
    ///
    /// Fails with [`CanvasError::PoolDisposed`] if the pool has already
    /// been disposed.
    pub fn rent(&self, min_capacity: usize) -> Result<Lease<LayerBuffer>> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(CanvasError::PoolDisposed);
        }

        let mut buffer = {
            let mut free = self.free.lock();
            let slot = free
                .iter()
                .position(|p| p.buffer.capacity() >= min_capacity);
            match slot {
                Some(i) => free.swap_remove(i).buffer,
                None => LayerBuffer::with_capacity(min_capacity),
            }
        };
        buffer.reset();

        let free = self.free.clone();
        let disposed = self.disposed.clone();
        Ok(Lease::new(buffer, move |buffer| {
            if disposed.load(Ordering::Acquire) {
                drop(buffer);
            } else {
                free.lock().push(PooledBuffer {
                    buffer,
                    idle_frames: 0,
                });
            }
        }))
    }

    /// Marks the pool disposed and destroys every buffer currently sitting
    /// in the free list. Outstanding leases are unaffected until they are
    /// themselves disposed, at which point their buffer is destroyed
    /// rather than re-queued (see `rent`'s return-to-pool callback).
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
        self.free.lock().clear();
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Releases free buffers that have been idle for more than
    /// `max_idle_frames` pool-level "ticks" (the caller decides what a tick
    /// means — typically one renderer frame or one trim-policy interval).
    /// Buffers still within the pool's free list age by one tick each call;
    /// buffers reused via `rent` reset their idle count to zero.
    pub fn trim(&self, max_idle_frames: u32) {
        let mut free = self.free.lock();
        for pooled in free.iter_mut() {
            pooled.idle_frames += 1;
        }
        free.retain(|pooled| pooled.idle_frames <= max_idle_frames);
    }

    /// Number of buffers currently sitting in the free list.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free.lock().len()
    }
}

impl Default for LayerPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::LayerPool;
    use crate::errors::CanvasError;

    #[test]
    fn disposed_buffer_returns_to_free_list() {
        let pool = LayerPool::new();
        assert_eq!(pool.free_count(), 0);
        let mut lease = pool.rent(64).unwrap();
        assert_eq!(pool.free_count(), 0);
        lease.dispose();
        assert_eq!(pool.free_count(), 1);
    }

    #[test]
    fn rent_reuses_a_large_enough_free_buffer() {
        let pool = LayerPool::new();
        let mut first = pool.rent(128).unwrap();
        first.get_mut().as_mut_vec().extend_from_slice(&[1, 2, 3]);
        first.dispose();
        assert_eq!(pool.free_count(), 1);

        let second = pool.rent(64).unwrap();
        // reused, not newly allocated, and reset by `rent`.
        assert_eq!(pool.free_count(), 0);
        assert!(second.get().as_slice().is_empty());
        assert!(second.get().capacity() >= 64);
    }

    #[test]
    fn trim_evicts_buffers_idle_past_the_limit() {
        let pool = LayerPool::new();
        pool.rent(32).unwrap().dispose();
        pool.trim(1);
        assert_eq!(pool.free_count(), 1);
        pool.trim(1);
        assert_eq!(pool.free_count(), 1);
        pool.trim(0);
        assert_eq!(pool.free_count(), 0);
    }

    #[test]
    fn trim_resets_idle_count_on_reuse() {
        let pool = LayerPool::new();
        pool.rent(32).unwrap().dispose();
        pool.trim(2);
        pool.rent(16).unwrap().dispose(); // reused and re-added with idle_frames = 0
        pool.trim(2);
        assert_eq!(pool.free_count(), 1);
    }

    #[test]
    fn dispose_clears_free_list_and_rejects_further_rents() {
        let pool = LayerPool::new();
        pool.rent(32).unwrap().dispose();
        assert_eq!(pool.free_count(), 1);

        pool.dispose();
        assert_eq!(pool.free_count(), 0);
        assert!(pool.is_disposed());
        assert!(matches!(pool.rent(32), Err(CanvasError::PoolDisposed)));
    }

    #[test]
    fn outstanding_lease_destroys_buffer_instead_of_requeueing_after_dispose() {
        let pool = LayerPool::new();
        let mut lease = pool.rent(32).unwrap();
        pool.dispose();
        lease.dispose();
        assert_eq!(pool.free_count(), 0);
    }
}
