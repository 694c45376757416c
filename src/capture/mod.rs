//! Capture-side collaborators
//!
//! A capture source owns its hardware buffers and, each time one fills, lends
//! it to a [`CaptureHandler`] for the duration of one call. The interconnect's
//! [`Producer`](crate::Producer) is the handler used in practice.
//!
//! Two sources are provided:
//!
//! - [`ToneSource`]: a paced synthetic source that behaves like a capture
//!   queue (fixed pool of buffers, one callback per buffer period)
//! - `DeviceSource` (feature `device`): the default input device via `cpal`

pub mod tone;
#[cfg(feature = "device")]
pub mod device;

pub use tone::{SineTone, ToneSource};
#[cfg(feature = "device")]
pub use device::DeviceSource;

use crate::error::{Error, Result};
use std::time::Duration;

/// Bytes per sample; the stream is signed 16-bit in native byte order
pub const BYTES_PER_SAMPLE: usize = std::mem::size_of::<i16>();

/// Receives each completed capture buffer
///
/// Called once per buffer and never concurrently with itself. Implementations
/// run on the capture thread and must not block.
pub trait CaptureHandler {
    /// Handle one completed buffer; the borrow ends when this returns
    fn on_buffer(&mut self, chunk: &[u8]);
}

impl<F: FnMut(&[u8])> CaptureHandler for F {
    fn on_buffer(&mut self, chunk: &[u8]) {
        self(chunk)
    }
}

/// Format and buffering of a capture stream
///
/// The interconnect itself never reads these values; they only describe the
/// headerless stream to whoever configures the source and reads the output.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureFormat {
    /// Frames per second
    pub sample_rate: u32,
    /// Interleaved channels per frame
    pub channels: u16,
    /// Frames in each capture buffer
    pub frames_per_buffer: usize,
    /// Buffers the source keeps in circulation
    pub buffer_count: usize,
}

impl Default for CaptureFormat {
    fn default() -> Self {
        Self {
            sample_rate: 11025,
            channels: 1,
            frames_per_buffer: 1024,
            buffer_count: 3,
        }
    }
}

impl CaptureFormat {
    /// Bytes in one interleaved frame
    pub fn bytes_per_frame(&self) -> usize {
        BYTES_PER_SAMPLE * self.channels as usize
    }

    /// Bytes in one capture buffer
    pub fn buffer_bytes(&self) -> usize {
        self.bytes_per_frame() * self.frames_per_buffer
    }

    /// Time it takes the hardware to fill one buffer
    pub fn buffer_period(&self) -> Duration {
        Duration::from_secs_f64(self.frames_per_buffer as f64 / self.sample_rate as f64)
    }

    /// Reject formats no source can honour
    pub fn validate(&self) -> Result<()> {
        let reason = if self.sample_rate == 0 {
            "sample rate must be non-zero"
        } else if self.channels == 0 {
            "channel count must be non-zero"
        } else if self.frames_per_buffer == 0 {
            "frames per buffer must be non-zero"
        } else if self.buffer_count == 0 {
            "at least one capture buffer is required"
        } else {
            return Ok(());
        };

        Err(Error::InvalidFormat {
            reason: reason.to_string(),
        })
    }
}
