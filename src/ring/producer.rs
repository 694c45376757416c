//! Producer endpoint, called from the capture callback
//!
//! Everything reachable from [`Producer::push`] runs on the platform's audio
//! thread. It copies and publishes, nothing else: no allocation, no lock, no
//! logging, no system call, and no loop whose length depends on anything but
//! the chunk.
//!
//! # Overwrite policy
//!
//! The producer never looks at how far the consumer has read. When the
//! consumer falls more than one capacity behind, the oldest unread bytes are
//! overwritten without notice. This is what keeps the callback branch-light
//! and wait-free; size the ring so that the drain loop can always keep up
//! (the default 512 KiB holds roughly 24 seconds of 11025 Hz mono audio).

use super::Shared;
use crate::capture::CaptureHandler;
use std::sync::Arc;

/// Write half of the interconnect
pub struct Producer {
    shared: Arc<Shared>,
    /// Private copy of the published cursor, so the shared value is never re-read
    written: u64,
}

impl Producer {
    pub(super) fn new(shared: Arc<Shared>) -> Self {
        Self { shared, written: 0 }
    }

    /// Copy one captured chunk into the ring and publish it
    ///
    /// The chunk is borrowed only for the duration of the call; returning hands
    /// its storage back to the capture source.
    ///
    /// Chunks longer than the capacity keep only their last `capacity` bytes in
    /// the ring, the same bytes that would survive overwriting anyway, while the
    /// cursor still advances by the full length.
    #[inline]
    pub fn push(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }

        let store = &self.shared.store;
        let capacity = store.capacity();

        let skip = chunk.len().saturating_sub(capacity);
        let src = &chunk[skip..];
        let offset = store.offset(self.written.wrapping_add(skip as u64));
        let contiguous = capacity - offset;

        // SAFETY: both ranges end at or before `capacity`, and this is the only
        // producer.
        unsafe {
            if contiguous < src.len() {
                store.write_at(offset, &src[..contiguous]);
                store.write_at(0, &src[contiguous..]);
            } else {
                store.write_at(offset, src);
            }
        }

        // Publish only after the copy so an observed cursor implies visible bytes
        let next = self.written.wrapping_add(chunk.len() as u64);
        self.shared.cursor.publish(next);
        self.written = next;
    }

    /// Total bytes published so far
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Ring capacity in bytes
    pub fn capacity(&self) -> usize {
        self.shared.store.capacity()
    }
}

impl CaptureHandler for Producer {
    #[inline]
    fn on_buffer(&mut self, chunk: &[u8]) {
        self.push(chunk);
    }
}
