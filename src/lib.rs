//! pcm-interconnect - a wait-free bridge from an audio capture callback to a
//! byte sink.
//!
//! # Overview
//!
//! Audio capture callbacks run on a hard-real-time thread that must never
//! block, allocate or enter the kernel. Writing captured audio to a pipe does
//! all three. This crate sits between the two:
//!
//! 1. A fixed-capacity byte ring, allocated once
//! 2. A [`Producer`] called from the capture callback, which copies each
//!    buffer into the ring (in two pieces when it crosses the end) and then
//!    publishes the new byte total with a single release store
//! 3. A [`Consumer`] on an ordinary thread, which polls that total with an
//!    acquire load and forwards each new contiguous run to any
//!    [`std::io::Write`]
//!
//! The producer never waits for the consumer. If the consumer falls more than
//! one ring capacity behind, unread audio is overwritten silently; size the
//! ring for the worst drain stall you expect.
//!
//! The output is raw, headerless, interleaved signed 16-bit PCM in native
//! byte order. Sample rate and channel count travel out of band.
//!
//! # Usage
//!
//! ```no_run
//! use pcm_interconnect::{interconnect, CaptureFormat, DrainConfig, StdoutSink, ToneSource};
//!
//! let format = CaptureFormat::default();
//! let (producer, consumer) = interconnect(pcm_interconnect::DEFAULT_CAPACITY)?;
//! let _capture = ToneSource::start(&format, 440.0, producer)?;
//!
//! // Runs until stdout is closed
//! let report = consumer.run(StdoutSink::new(), &DrainConfig::default());
//! eprintln!("forwarded {} bytes", report.forwarded);
//! # Ok::<(), pcm_interconnect::Error>(())
//! ```

#![deny(missing_docs)]

mod ring;
mod drain;
pub mod capture;
pub mod sink;
mod error;

pub use ring::{interconnect, Producer, DEFAULT_CAPACITY};
pub use drain::consumer::Consumer;
pub use drain::{DrainConfig, DrainReport, DrainState, DrainStep};
pub use capture::{CaptureFormat, CaptureHandler, SineTone, ToneSource};
#[cfg(feature = "device")]
pub use capture::DeviceSource;
pub use sink::StdoutSink;
pub use error::{Error, Result};

use std::io::{self, Write};
use std::thread;

/// Run the drain loop for `consumer` on a dedicated thread
///
/// # Returns
///
/// A join handle yielding the [`DrainReport`] once the sink fails
pub fn spawn_drain<W>(
    consumer: Consumer,
    sink: W,
    config: DrainConfig,
) -> io::Result<thread::JoinHandle<DrainReport>>
where
    W: Write + Send + 'static,
{
    thread::Builder::new()
        .name("pcm-drain".to_string())
        .spawn(move || consumer.run(sink, &config))
}
