//! Consumer endpoint and drain loop
//!
//! The consumer owns the read cursor outright; the producer never sees it.
//! Each iteration computes
//!
//! ```text
//! slot_offset = reader % capacity
//! contiguous  = capacity - slot_offset
//! available   = writer - reader        (wrapping)
//! chunk       = min(contiguous, available)
//! ```
//!
//! and hands `chunk` bytes to the sink in a single write. A range that crosses
//! the physical end of the ring is therefore forwarded in two iterations.
//!
//! `available` can exceed the capacity when the producer has lapped the
//! consumer. The subtraction still yields the right count; the bytes forwarded
//! for that stretch are whatever the ring currently holds, which is the most
//! recent capacity of the stream.

use super::{DrainConfig, DrainReport, DrainState, DrainStep};
use crate::error::{Error, Result};
use crate::ring::Shared;
use log::{debug, info};
use std::io::{ErrorKind, Write};
use std::sync::Arc;
use std::thread;

/// Read half of the interconnect
pub struct Consumer {
    shared: Arc<Shared>,
    /// Bytes forwarded to the sink so far
    reader_cursor: u64,
    state: DrainState,
    overruns: u64,
}

impl Consumer {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            reader_cursor: 0,
            state: DrainState::Waiting,
            overruns: 0,
        }
    }

    /// Bytes forwarded to the sink so far
    pub fn reader_cursor(&self) -> u64 {
        self.reader_cursor
    }

    /// Latest cursor value published by the producer
    pub fn writer_cursor(&self) -> u64 {
        self.shared.cursor.observe()
    }

    /// Unread byte count; may exceed the capacity after an overrun
    pub fn available(&self) -> u64 {
        self.writer_cursor().wrapping_sub(self.reader_cursor)
    }

    /// Current drain state
    pub fn state(&self) -> DrainState {
        self.state
    }

    /// Iterations that found more than one capacity of unread bytes
    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    /// Ring capacity in bytes
    pub fn capacity(&self) -> usize {
        self.shared.store.capacity()
    }

    /// Run a single poll-and-forward iteration without sleeping
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] with the sink's error the first time the sink
    /// fails, after which the consumer is [`DrainState::Stopped`] and every
    /// later call returns [`Error::Stopped`] without touching the sink.
    pub fn drain_once<W: Write + ?Sized>(&mut self, sink: &mut W) -> Result<DrainStep> {
        if self.state == DrainState::Stopped {
            return Err(Error::Stopped);
        }

        let writer_now = self.shared.cursor.observe();
        if writer_now == self.reader_cursor {
            self.state = DrainState::Waiting;
            return Ok(DrainStep::Idle);
        }
        self.state = DrainState::Draining;

        let store = &self.shared.store;
        let capacity = store.capacity();
        let slot_offset = store.offset(self.reader_cursor);
        let contiguous = (capacity - slot_offset) as u64;
        let available = writer_now.wrapping_sub(self.reader_cursor);

        if available > capacity as u64 {
            self.overruns += 1;
            debug!(
                "consumer is {} bytes behind a {} byte ring; unread data was overwritten",
                available, capacity
            );
        }

        let chunk = contiguous.min(available) as usize;
        // SAFETY: `slot_offset + chunk <= capacity`, and this is the only consumer.
        let bytes = unsafe { store.slice(slot_offset, chunk) };

        match sink.write(bytes) {
            Ok(accepted) => {
                let accepted = accepted.min(chunk);
                self.reader_cursor = self.reader_cursor.wrapping_add(accepted as u64);
                Ok(DrainStep::Forwarded(accepted))
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => Ok(DrainStep::Forwarded(0)),
            Err(e) => {
                self.state = DrainState::Stopped;
                Err(Error::Io(e))
            }
        }
    }

    /// Drain into `sink` until it fails
    ///
    /// Sleeps for `config.poll_interval` whenever there is nothing to forward.
    /// A sink failure is the only way out and is the normal end of the loop,
    /// so it is returned inside the report rather than as an error. The ring
    /// is released once the producer handle is gone as well.
    pub fn run<W: Write>(mut self, mut sink: W, config: &DrainConfig) -> DrainReport {
        info!(
            "drain loop started ({} byte ring, polling every {:?})",
            self.capacity(),
            config.poll_interval
        );

        loop {
            match self.drain_once(&mut sink) {
                Ok(DrainStep::Idle) | Ok(DrainStep::Forwarded(0)) => {
                    thread::sleep(config.poll_interval)
                }
                Ok(DrainStep::Forwarded(_)) => {}
                Err(cause) => {
                    info!(
                        "drain loop stopped after {} bytes: {}",
                        self.reader_cursor, cause
                    );
                    return DrainReport {
                        forwarded: self.reader_cursor,
                        overruns: self.overruns,
                        cause,
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::interconnect;
    use std::io;

    /// Sink that accepts at most `limit` bytes per call and records every call
    struct ShortSink {
        limit: usize,
        data: Vec<u8>,
        calls: Vec<usize>,
    }

    impl ShortSink {
        fn new(limit: usize) -> Self {
            Self { limit, data: Vec::new(), calls: Vec::new() }
        }
    }

    impl Write for ShortSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.calls.push(buf.len());
            let n = buf.len().min(self.limit);
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Sink whose every write fails
    struct ClosedSink {
        attempts: usize,
    }

    impl Write for ClosedSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            self.attempts += 1;
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "reader closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_idle_when_nothing_published() {
        let (_producer, mut consumer) = interconnect(16).unwrap();
        let mut sink: Vec<u8> = Vec::new();

        assert_eq!(consumer.drain_once(&mut sink).unwrap(), DrainStep::Idle);
        assert_eq!(consumer.state(), DrainState::Waiting);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_wraparound_read_in_two_runs() {
        let (mut producer, mut consumer) = interconnect(16).unwrap();
        let stream: Vec<u8> = (100..120).collect();
        producer.push(&stream[..10]);
        producer.push(&stream[10..]);

        let mut sink = ShortSink::new(usize::MAX);
        assert_eq!(consumer.drain_once(&mut sink).unwrap(), DrainStep::Forwarded(16));
        assert_eq!(consumer.reader_cursor(), 16);
        assert_eq!(consumer.state(), DrainState::Draining);
        assert_eq!(consumer.drain_once(&mut sink).unwrap(), DrainStep::Forwarded(4));
        assert_eq!(consumer.reader_cursor(), 20);
        assert_eq!(consumer.drain_once(&mut sink).unwrap(), DrainStep::Idle);

        assert_eq!(sink.calls, vec![16, 4]);
        assert_eq!(sink.data, stream);
    }

    #[test]
    fn test_partial_write_resumes_at_accepted_byte() {
        let (mut producer, mut consumer) = interconnect(16).unwrap();
        let stream: Vec<u8> = (0..12).collect();
        producer.push(&stream);

        let mut sink = ShortSink::new(5);
        assert_eq!(consumer.drain_once(&mut sink).unwrap(), DrainStep::Forwarded(5));
        assert_eq!(consumer.reader_cursor(), 5);
        assert_eq!(consumer.drain_once(&mut sink).unwrap(), DrainStep::Forwarded(5));
        assert_eq!(consumer.drain_once(&mut sink).unwrap(), DrainStep::Forwarded(2));
        assert_eq!(consumer.reader_cursor(), 12);

        // Each call re-offers the remainder of the same range
        assert_eq!(sink.calls, vec![12, 7, 2]);
        assert_eq!(sink.data, stream);
    }

    #[test]
    fn test_zero_byte_write_does_not_advance() {
        let (mut producer, mut consumer) = interconnect(8).unwrap();
        producer.push(b"abc");

        let mut sink = ShortSink::new(0);
        assert_eq!(consumer.drain_once(&mut sink).unwrap(), DrainStep::Forwarded(0));
        assert_eq!(consumer.reader_cursor(), 0);
        assert_eq!(consumer.available(), 3);
    }

    #[test]
    fn test_overrun_forwards_latest_capacity() {
        let (mut producer, mut consumer) = interconnect(16).unwrap();
        let stream: Vec<u8> = (0..20).collect();
        producer.push(&stream[..10]);
        producer.push(&stream[10..]);
        producer.push(&[]);

        assert_eq!(consumer.available(), 20);
        let mut sink: Vec<u8> = Vec::new();
        assert_eq!(consumer.drain_once(&mut sink).unwrap(), DrainStep::Forwarded(16));
        assert_eq!(consumer.overruns(), 1);
        assert_eq!(consumer.drain_once(&mut sink).unwrap(), DrainStep::Forwarded(4));
        assert_eq!(consumer.reader_cursor(), 20);
        assert_eq!(consumer.overruns(), 1);

        // Bytes 0..4 were overwritten by 16..20 before the first poll
        let mut expected: Vec<u8> = vec![16, 17, 18, 19];
        expected.extend(4u8..16);
        expected.extend(16u8..20);
        assert_eq!(sink, expected);
        assert!(sink.iter().all(|b| (4..20).contains(b)));
    }

    #[test]
    fn test_interrupted_write_is_retried() {
        struct FlakySink {
            interrupted: bool,
            data: Vec<u8>,
        }

        impl Write for FlakySink {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                if !self.interrupted {
                    self.interrupted = true;
                    return Err(io::ErrorKind::Interrupted.into());
                }
                self.data.extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let (mut producer, mut consumer) = interconnect(8).unwrap();
        producer.push(b"pcm");

        let mut sink = FlakySink { interrupted: false, data: Vec::new() };
        assert_eq!(consumer.drain_once(&mut sink).unwrap(), DrainStep::Forwarded(0));
        assert_eq!(consumer.state(), DrainState::Draining);
        assert_eq!(consumer.drain_once(&mut sink).unwrap(), DrainStep::Forwarded(3));
        assert_eq!(sink.data, b"pcm");
    }

    #[test]
    fn test_sink_failure_stops_exactly_once() {
        let (mut producer, mut consumer) = interconnect(8).unwrap();
        producer.push(b"data");

        let mut sink = ClosedSink { attempts: 0 };
        let err = consumer.drain_once(&mut sink).unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
        assert_eq!(consumer.state(), DrainState::Stopped);

        producer.push(b"more");
        assert!(matches!(consumer.drain_once(&mut sink), Err(Error::Stopped)));
        assert_eq!(sink.attempts, 1);
        assert_eq!(consumer.reader_cursor(), 0);
    }

    #[test]
    fn test_run_returns_report_on_sink_failure() {
        let (mut producer, consumer) = interconnect(8).unwrap();
        producer.push(b"data");

        let mut sink = ClosedSink { attempts: 0 };
        let report = consumer.run(&mut sink, &DrainConfig::default());

        assert_eq!(report.forwarded, 0);
        assert_eq!(report.overruns, 0);
        assert!(matches!(report.cause, Error::Io(_)));
        assert_eq!(sink.attempts, 1);
    }
}
