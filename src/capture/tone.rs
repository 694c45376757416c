//! Paced synthetic capture source
//!
//! [`ToneSource`] stands in for a hardware capture queue. It keeps a fixed
//! pool of buffers, fills one per buffer period, and lends it to the handler
//! from its own thread, so the handler sees the same call pattern it would
//! get from a real device: one call per completed buffer, never overlapping.

use super::{CaptureFormat, CaptureHandler, BYTES_PER_SAMPLE};
use crate::error::Result;
use log::debug;
use parking_lot::{Condvar, Mutex};
use std::f64::consts::TAU;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Sine generator producing interleaved native-endian i16 frames
#[derive(Debug, Clone)]
pub struct SineTone {
    phase: f64,
    step: f64,
    amplitude: f64,
    channels: usize,
}

impl SineTone {
    /// A tone of `frequency` Hz at half of full scale
    pub fn new(frequency: f64, format: &CaptureFormat) -> Self {
        Self {
            phase: 0.0,
            step: TAU * frequency / format.sample_rate as f64,
            amplitude: i16::MAX as f64 * 0.5,
            channels: format.channels as usize,
        }
    }

    /// Fill `buf` with whole frames; a trailing partial frame is zeroed
    pub fn fill(&mut self, buf: &mut [u8]) {
        let frame_bytes = BYTES_PER_SAMPLE * self.channels;
        let mut frames = buf.chunks_exact_mut(frame_bytes);
        for frame in &mut frames {
            let sample = (self.phase.sin() * self.amplitude) as i16;
            for slot in frame.chunks_exact_mut(BYTES_PER_SAMPLE) {
                slot.copy_from_slice(&sample.to_ne_bytes());
            }
            self.phase = (self.phase + self.step) % TAU;
        }
        frames.into_remainder().fill(0);
    }
}

/// Stop flag shared with the pacing thread
struct Pacer {
    stopped: Mutex<bool>,
    wake: Condvar,
}

/// A running synthetic capture stream
///
/// Capture continues until [`stop`](Self::stop) is called or the source is
/// dropped.
pub struct ToneSource {
    pacer: Arc<Pacer>,
    handle: Option<thread::JoinHandle<u64>>,
}

impl ToneSource {
    /// Start delivering a sine tone of `frequency` Hz to `handler`
    pub fn start<H>(format: &CaptureFormat, frequency: f64, handler: H) -> Result<Self>
    where
        H: CaptureHandler + Send + 'static,
    {
        let mut tone = SineTone::new(frequency, format);
        Self::start_with(format, handler, move |buf: &mut [u8]| tone.fill(buf))
    }

    /// Start delivering buffers filled by `generator` to `handler`
    pub fn start_with<H, G>(format: &CaptureFormat, mut handler: H, mut generator: G) -> Result<Self>
    where
        H: CaptureHandler + Send + 'static,
        G: FnMut(&mut [u8]) + Send + 'static,
    {
        format.validate()?;

        let pacer = Arc::new(Pacer {
            stopped: Mutex::new(false),
            wake: Condvar::new(),
        });
        let period = format.buffer_period();
        let mut buffers: Vec<Box<[u8]>> = (0..format.buffer_count)
            .map(|_| vec![0u8; format.buffer_bytes()].into_boxed_slice())
            .collect();

        let thread_pacer = pacer.clone();
        let handle = thread::Builder::new()
            .name("pcm-capture".to_string())
            .spawn(move || {
                let mut delivered: u64 = 0;
                let mut deadline = Instant::now();

                loop {
                    let slot = delivered as usize % buffers.len();
                    let buffer = &mut buffers[slot];
                    generator(&mut buffer[..]);

                    // Wait out the time the hardware would take to fill it
                    deadline += period;
                    {
                        let mut stopped = thread_pacer.stopped.lock();
                        while !*stopped {
                            if thread_pacer.wake.wait_until(&mut stopped, deadline).timed_out() {
                                break;
                            }
                        }
                        if *stopped {
                            break;
                        }
                    }

                    handler.on_buffer(&buffer[..]);
                    delivered += 1;
                }

                delivered
            })?;

        debug!(
            "tone source started: {} Hz, {} channel(s), {} x {} byte buffers",
            format.sample_rate,
            format.channels,
            format.buffer_count,
            format.buffer_bytes()
        );

        Ok(Self {
            pacer,
            handle: Some(handle),
        })
    }

    /// Stop capture and return how many buffers were delivered
    ///
    /// Later calls return 0.
    pub fn stop(&mut self) -> u64 {
        {
            let mut stopped = self.pacer.stopped.lock();
            *stopped = true;
            self.pacer.wake.notify_one();
        }

        match self.handle.take() {
            Some(handle) => handle.join().unwrap_or(0),
            None => 0,
        }
    }
}

impl Drop for ToneSource {
    fn drop(&mut self) {
        self.stop();
    }
}
