//! Basic usage example for the PCM interconnect
//!
//! This example demonstrates:
//! 1. Allocating the ring and splitting it into producer and consumer
//! 2. Driving the producer from a paced capture source
//! 3. Draining on a dedicated thread into a sink
//! 4. Ending the drain loop by closing the sink
//!
//! The sink here is an in-memory recorder that reports a closed pipe once it
//! has collected one second of audio, which is how the loop ends in practice
//! when the downstream reader exits.

use pcm_interconnect::{interconnect, spawn_drain, CaptureFormat, DrainConfig, ToneSource};

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records bytes until `limit` is reached, then behaves like a closed pipe
struct Recorder {
    limit: usize,
    data: Arc<Mutex<Vec<u8>>>,
}

impl Write for Recorder {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut data = self.data.lock().unwrap();
        if data.len() >= self.limit {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "recorder full"));
        }
        let n = buf.len().min(self.limit - data.len());
        data.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // 8 kHz stereo, 256-frame buffers (32 ms each)
    let format = CaptureFormat {
        sample_rate: 8000,
        channels: 2,
        frames_per_buffer: 256,
        buffer_count: 3,
    };
    let one_second = format.sample_rate as usize * format.bytes_per_frame();

    // Room for a quarter second of audio
    let (producer, consumer) = interconnect(one_second / 4)?;
    println!("Ring capacity: {} bytes", consumer.capacity());

    let mut capture = ToneSource::start(&format, 440.0, producer)?;

    let recorded = Arc::new(Mutex::new(Vec::new()));
    let sink = Recorder {
        limit: one_second,
        data: recorded.clone(),
    };
    let config = DrainConfig {
        poll_interval: Duration::from_millis(20),
    };
    let drain = spawn_drain(consumer, sink, config)?;

    let report = drain.join().expect("drain thread panicked");
    let buffers = capture.stop();

    println!("Capture delivered {} buffers", buffers);
    println!(
        "Drain forwarded {} bytes with {} overruns, then stopped: {}",
        report.forwarded, report.overruns, report.cause
    );
    println!("Recorded {} bytes", recorded.lock().unwrap().len());

    Ok(())
}
