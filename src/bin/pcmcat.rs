//! pcmcat - capture audio and write raw PCM to standard output
//!
//! The stream is headerless, interleaved signed 16-bit native-endian PCM.
//! Pipe it into anything that knows the rate and channel count, e.g.
//!
//! ```text
//! pcmcat --fs 44100 -C 2 | sox -t raw -r 44100 -c 2 -e signed -b 16 - out.wav
//! ```
//!
//! The tool runs until the reader goes away.

use clap::{Parser, ValueEnum};
use log::{error, info, warn};
use pcm_interconnect::{
    interconnect, CaptureFormat, DrainConfig, DrainReport, Error, Producer, StdoutSink,
    ToneSource, DEFAULT_CAPACITY,
};
use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

/// Where captured audio comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    /// The default input device (requires the `device` feature)
    Device,
    /// A synthetic sine tone paced like a capture device
    Tone,
}

#[derive(Debug, Parser)]
#[command(name = "pcmcat", version, about = "Capture audio and write raw PCM to stdout")]
struct Args {
    /// Sample rate in Hz
    #[arg(long = "fs", default_value_t = 11025)]
    sample_rate: u32,

    /// Number of interleaved channels
    #[arg(short = 'C', long = "channels", default_value_t = 1)]
    channels: u16,

    /// Capture source
    #[arg(long, value_enum, default_value_t = default_source())]
    source: SourceKind,

    /// Tone frequency in Hz when `--source tone` is used
    #[arg(long, default_value_t = 440.0)]
    frequency: f64,

    /// Ring capacity in bytes
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,

    /// Drain poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,

    /// Write to this file instead of standard output
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn default_source() -> SourceKind {
    if cfg!(feature = "device") {
        SourceKind::Device
    } else {
        SourceKind::Tone
    }
}

/// Keeps the capture stream alive while the drain loop runs
#[allow(dead_code)]
enum RunningSource {
    Tone(ToneSource),
    #[cfg(feature = "device")]
    Device(pcm_interconnect::DeviceSource),
}

fn start_source(args: &Args, format: &CaptureFormat, producer: Producer) -> Result<RunningSource, Error> {
    match args.source {
        SourceKind::Tone => {
            info!("generating a {} Hz tone", args.frequency);
            Ok(RunningSource::Tone(ToneSource::start(format, args.frequency, producer)?))
        }
        #[cfg(feature = "device")]
        SourceKind::Device => Ok(RunningSource::Device(
            pcm_interconnect::DeviceSource::open_default(format, producer)?,
        )),
        #[cfg(not(feature = "device"))]
        SourceKind::Device => Err(Error::Backend(
            "pcmcat was built without the `device` feature".to_string(),
        )),
    }
}

fn run(args: &Args) -> Result<DrainReport, Error> {
    let format = CaptureFormat {
        sample_rate: args.sample_rate,
        channels: args.channels,
        ..Default::default()
    };
    format.validate()?;

    if args.capacity < format.buffer_bytes() {
        warn!(
            "ring capacity {} is smaller than one {} byte capture buffer",
            args.capacity,
            format.buffer_bytes()
        );
    }

    let (producer, consumer) = interconnect(args.capacity)?;
    let _source = start_source(args, &format, producer)?;

    let config = DrainConfig {
        poll_interval: Duration::from_millis(args.poll_ms),
    };

    // Drain on this thread until the sink goes away
    let report = match &args.output {
        Some(path) => consumer.run(File::create(path)?, &config),
        None => consumer.run(StdoutSink::new(), &config),
    };
    Ok(report)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let report = run(&args).map_err(|e| {
        error!("{}", e);
        e
    })?;

    info!(
        "forwarded {} bytes ({} overruns) before the sink closed: {}",
        report.forwarded, report.overruns, report.cause
    );
    Ok(())
}
