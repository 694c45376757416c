//! Error types for the interconnect
//!
//! Only setup and collaborator failures live here. The producer path has no
//! error conditions at all, and a sink failure during draining is reported
//! through [`DrainReport`](crate::DrainReport) as the normal end of the loop.

use std::io;

/// Errors raised while building or driving the interconnect
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The ring was asked for zero bytes of storage
    #[error("ring capacity must be a positive number of bytes")]
    ZeroCapacity,

    /// A capture format field is out of range
    #[error("invalid capture format: {reason}")]
    InvalidFormat {
        /// Which field was rejected and why
        reason: String,
    },

    /// The drain loop already stopped after a sink failure
    #[error("drain loop has stopped")]
    Stopped,

    /// No default input device is configured on this system
    #[error("no default input device configured")]
    NoDevice,

    /// The device cannot capture in the requested format
    #[error("unsupported capture format: {format}")]
    UnsupportedFormat {
        /// Description of the rejected format
        format: String,
    },

    /// The audio backend reported an error
    #[error("audio backend error: {0}")]
    Backend(String),

    /// An I/O error outside the drain loop
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result type for interconnect operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            Error::ZeroCapacity.to_string(),
            "ring capacity must be a positive number of bytes"
        );
        let err = Error::InvalidFormat { reason: "channels must be non-zero".into() };
        assert_eq!(err.to_string(), "invalid capture format: channels must be non-zero");
    }

    #[test]
    fn test_io_conversion() {
        let err: Error = io::Error::new(io::ErrorKind::BrokenPipe, "closed").into();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
    }
}
