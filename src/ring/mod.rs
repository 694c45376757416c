//! Shared byte ring and publication cursor
//!
//! This module owns the only state the two real-time domains share:
//!
//! - [`RingStore`]: fixed-capacity byte storage, allocated once and addressed
//!   purely by `counter mod capacity`
//! - [`WriterCursor`]: the total number of bytes ever published, stored with
//!   release ordering by the producer and loaded with acquire ordering by the
//!   consumer
//!
//! [`interconnect`] allocates both and hands out exactly one [`Producer`] and
//! one [`Consumer`]. Neither handle can be cloned, so the single-producer,
//! single-consumer access pattern holds by construction and no lock is needed
//! anywhere.

pub mod producer;

use crate::drain::consumer::Consumer;
use crate::error::{Error, Result};
use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub use producer::Producer;

/// Ring capacity used by the command-line tool (512 KiB)
pub const DEFAULT_CAPACITY: usize = 524_288;

/// Fixed-capacity byte storage
///
/// The store itself tracks nothing. Which bytes are valid is decided entirely
/// by the cursor values the two sides hold.
pub(crate) struct RingStore {
    bytes: Box<[UnsafeCell<u8>]>,
}

// SAFETY: only the producer writes and only the consumer reads; every read
// range is bounded by a cursor value published with release ordering after the
// corresponding write. The one unsynchronized overlap is a producer lapping a
// stalled consumer, which the overwrite policy accepts: the consumer may then
// forward stale or mixed bytes, but never reads outside the allocation.
unsafe impl Sync for RingStore {}

impl RingStore {
    /// Allocate `capacity` zeroed bytes
    fn new(capacity: usize) -> Self {
        let bytes = (0..capacity).map(|_| UnsafeCell::new(0u8)).collect();
        Self { bytes }
    }

    /// Capacity in bytes
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Physical offset of a logical counter value
    #[inline]
    pub(crate) fn offset(&self, counter: u64) -> usize {
        (counter % self.bytes.len() as u64) as usize
    }

    #[inline]
    fn base(&self) -> *mut u8 {
        UnsafeCell::raw_get(self.bytes.as_ptr())
    }

    /// Copy `src` into the store starting at `offset`
    ///
    /// # Safety
    ///
    /// `offset + src.len()` must not exceed the capacity, and the caller must be
    /// the single producer.
    #[inline]
    pub(crate) unsafe fn write_at(&self, offset: usize, src: &[u8]) {
        debug_assert!(offset + src.len() <= self.capacity());
        std::ptr::copy_nonoverlapping(src.as_ptr(), self.base().add(offset), src.len());
    }

    /// View `len` bytes starting at `offset`
    ///
    /// # Safety
    ///
    /// `offset + len` must not exceed the capacity, and the caller must be the
    /// single consumer.
    #[inline]
    pub(crate) unsafe fn slice(&self, offset: usize, len: usize) -> &[u8] {
        debug_assert!(offset + len <= self.capacity());
        std::slice::from_raw_parts(self.base().add(offset) as *const u8, len)
    }
}

/// Monotonic count of published bytes
pub(crate) struct WriterCursor {
    /// Cache-line padded so producer stores do not contend with store metadata
    value: CachePadded<AtomicU64>,
}

impl WriterCursor {
    fn new() -> Self {
        Self {
            value: CachePadded::new(AtomicU64::new(0)),
        }
    }

    /// Make every byte below `total` visible to the consumer
    #[inline]
    pub(crate) fn publish(&self, total: u64) {
        self.value.store(total, Ordering::Release);
    }

    /// Latest published total; bytes below it are safe to read
    #[inline]
    pub(crate) fn observe(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }
}

/// State shared by the producer and consumer handles
pub(crate) struct Shared {
    pub(crate) cursor: WriterCursor,
    pub(crate) store: RingStore,
}

/// Allocate a ring of `capacity` bytes and split it into its two endpoints
///
/// The storage is allocated here, once, and released when both handles have
/// been dropped.
///
/// # Errors
///
/// Returns [`Error::ZeroCapacity`] when `capacity` is zero.
pub fn interconnect(capacity: usize) -> Result<(Producer, Consumer)> {
    if capacity == 0 {
        return Err(Error::ZeroCapacity);
    }

    let shared = Arc::new(Shared {
        cursor: WriterCursor::new(),
        store: RingStore::new(capacity),
    });
    log::debug!("allocated {} byte ring", capacity);

    Ok((Producer::new(shared.clone()), Consumer::new(shared)))
}
