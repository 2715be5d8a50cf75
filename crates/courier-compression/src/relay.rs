//! Sink adapter between an encoder and the transport

use std::io::{self, Write};
use tracing::trace;

/// Forwards compressed bytes straight into the transport's raw body sink
///
/// The encoder owns the relay, and the relay owns the sink. Writes never go
/// back through the response's own `write`, so the header-commit and
/// compression-decision logic cannot be re-entered.
#[derive(Debug)]
pub struct CompressionRelay<W> {
    sink: W,
    forwarded: u64,
}

impl<W: Write> CompressionRelay<W> {
    /// Wrap the transport's raw sink
    pub fn new(sink: W) -> Self {
        Self { sink, forwarded: 0 }
    }

    /// Compressed bytes handed to the sink so far
    pub fn bytes_forwarded(&self) -> u64 {
        self.forwarded
    }

    /// Give back the sink
    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl<W: Write> Write for CompressionRelay<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.sink.write(buf)?;
        self.forwarded += written as u64;
        trace!(bytes = written, total = self.forwarded, "Relayed compressed bytes");
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}
