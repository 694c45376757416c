//! Soft-real-time drain side of the interconnect
//!
//! The [`Consumer`](consumer::Consumer) polls the writer cursor, forwards each
//! newly published contiguous run to a byte sink, and advances its private
//! read cursor by however many bytes the sink accepted. The loop has three
//! states:
//!
//! - [`DrainState::Waiting`]: nothing new since the last poll
//! - [`DrainState::Draining`]: forwarding available bytes
//! - [`DrainState::Stopped`]: the sink failed; terminal
//!
//! Any [`std::io::Write`] is a valid sink. A short write is normal and only
//! advances the read cursor by the accepted count.

pub mod consumer;

use crate::error::Error;
use std::time::Duration;

/// Configuration for the drain loop
#[derive(Debug, Clone)]
pub struct DrainConfig {
    /// How long to sleep when the cursor has not moved
    pub poll_interval: Duration,
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// State of the drain loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainState {
    /// No unread bytes at the last poll
    Waiting,
    /// Unread bytes were found and forwarded
    Draining,
    /// The sink failed; no further writes will be attempted
    Stopped,
}

/// Outcome of one drain iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStep {
    /// The cursor had not moved
    Idle,
    /// The sink accepted this many bytes (possibly zero)
    Forwarded(usize),
}

/// Summary returned once the drain loop has stopped
#[derive(Debug)]
pub struct DrainReport {
    /// Total bytes the sink accepted
    pub forwarded: u64,
    /// Iterations that found more than one capacity of unread bytes
    pub overruns: u64,
    /// Why the loop stopped
    pub cause: Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_config_default() {
        let config = DrainConfig::default();
        assert_eq!(config.poll_interval, Duration::from_millis(100));
    }
}
