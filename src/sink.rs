//! Output sinks
//!
//! The drain loop accepts any [`std::io::Write`]. Files, pipes and `Vec<u8>`
//! work as they are; standard output needs [`StdoutSink`], because Rust's
//! stdout is line buffered and would hold back binary data until a newline
//! byte happened to pass through.

use std::io::{self, StdoutLock, Write};

/// Unbuffered, locked standard output
pub struct StdoutSink {
    out: StdoutLock<'static>,
}

impl StdoutSink {
    /// Lock standard output for the lifetime of the sink
    pub fn new() -> Self {
        Self {
            out: io::stdout().lock(),
        }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for StdoutSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let accepted = self.out.write(buf)?;
        self.out.flush()?;
        Ok(accepted)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
