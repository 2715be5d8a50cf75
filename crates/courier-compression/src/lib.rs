//! Streaming response compression for Courier
//!
//! Supports:
//! - gzip (widely supported, good compression)
//! - deflate (zlib framing)
//! - brotli (better compression, modern browsers)
//! - zstd (fastest, best compression ratio)
//!
//! Compression is decided once per response from the size of the first body
//! write, then every later write flows through a [`StreamEncoder`] whose
//! output is forwarded to the transport by a [`CompressionRelay`].

pub mod algorithm;
pub mod config;
pub mod encoder;
pub mod relay;

pub use algorithm::CompressionAlgorithm;
pub use config::CompressionConfig;
pub use encoder::StreamEncoder;
pub use relay::CompressionRelay;
