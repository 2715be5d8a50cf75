//! Streaming encoders over any byte sink

use crate::CompressionAlgorithm;
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;
use std::fmt;
use std::io::{self, Write};

const BROTLI_BUFFER_SIZE: usize = 4096;
const BROTLI_WINDOW_BITS: u32 = 22;

/// A compressor that writes its output into `W` as input arrives
pub enum StreamEncoder<W: Write> {
    /// gzip encoder
    Gzip(GzEncoder<W>),
    /// zlib encoder, sent as `deflate`
    Deflate(ZlibEncoder<W>),
    /// brotli encoder
    Brotli(Box<brotli::CompressorWriter<W>>),
    /// zstd encoder
    Zstd(zstd::stream::write::Encoder<'static, W>),
}

impl<W: Write> StreamEncoder<W> {
    /// Create an encoder writing compressed output into `sink`
    pub fn new(algorithm: CompressionAlgorithm, level: u32, sink: W) -> io::Result<Self> {
        let level = level.min(algorithm.max_level());
        let encoder = match algorithm {
            CompressionAlgorithm::Gzip => Self::Gzip(GzEncoder::new(sink, Compression::new(level))),
            CompressionAlgorithm::Deflate => {
                Self::Deflate(ZlibEncoder::new(sink, Compression::new(level)))
            }
            CompressionAlgorithm::Brotli => Self::Brotli(Box::new(brotli::CompressorWriter::new(
                sink,
                BROTLI_BUFFER_SIZE,
                level,
                BROTLI_WINDOW_BITS,
            ))),
            CompressionAlgorithm::Zstd => {
                Self::Zstd(zstd::stream::write::Encoder::new(sink, level.max(1) as i32)?)
            }
        };
        Ok(encoder)
    }

    /// The scheme this encoder produces
    pub fn algorithm(&self) -> CompressionAlgorithm {
        match self {
            Self::Gzip(_) => CompressionAlgorithm::Gzip,
            Self::Deflate(_) => CompressionAlgorithm::Deflate,
            Self::Brotli(_) => CompressionAlgorithm::Brotli,
            Self::Zstd(_) => CompressionAlgorithm::Zstd,
        }
    }

    /// Write the stream trailer and hand back the sink
    pub fn finish(self) -> io::Result<W> {
        match self {
            Self::Gzip(encoder) => encoder.finish(),
            Self::Deflate(encoder) => encoder.finish(),
            Self::Brotli(mut encoder) => {
                // into_inner drops write errors, so surface them here first
                encoder.flush()?;
                Ok((*encoder).into_inner())
            }
            Self::Zstd(encoder) => encoder.finish(),
        }
    }
}

impl<W: Write> Write for StreamEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Gzip(encoder) => encoder.write(buf),
            Self::Deflate(encoder) => encoder.write(buf),
            Self::Brotli(encoder) => encoder.write(buf),
            Self::Zstd(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Gzip(encoder) => encoder.flush(),
            Self::Deflate(encoder) => encoder.flush(),
            Self::Brotli(encoder) => encoder.flush(),
            Self::Zstd(encoder) => encoder.flush(),
        }
    }
}

impl<W: Write> fmt::Debug for StreamEncoder<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamEncoder")
            .field("algorithm", &self.algorithm())
            .finish_non_exhaustive()
    }
}
