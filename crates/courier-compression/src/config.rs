//! Configuration for response compression

use crate::CompressionAlgorithm;
use serde::{Deserialize, Serialize};

/// Compression configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    /// Enable compression
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// First-write size (in bytes) that must be exceeded to compress
    #[serde(default = "default_threshold")]
    pub threshold: usize,

    /// Compression scheme used when compression activates
    #[serde(default = "default_algorithm")]
    pub algorithm: CompressionAlgorithm,

    /// Compression level (1-9 for gzip/deflate, 0-11 for brotli, 1-22 for zstd)
    #[serde(default = "default_level")]
    pub level: u32,

    /// Only compress when the request's Accept-Encoding allows the scheme
    #[serde(default = "default_negotiate")]
    pub negotiate: bool,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            threshold: default_threshold(),
            algorithm: default_algorithm(),
            level: default_level(),
            negotiate: default_negotiate(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_threshold() -> usize {
    1024 // 1KB
}

fn default_algorithm() -> CompressionAlgorithm {
    CompressionAlgorithm::Gzip
}

fn default_level() -> u32 {
    6
}

fn default_negotiate() -> bool {
    true
}

impl CompressionConfig {
    /// Decide compression from the size of the first body write
    ///
    /// Only the first chunk is ever measured: a body streamed in chunks that
    /// are each at or under the threshold stays uncompressed even when its
    /// total size is far larger.
    pub fn should_compress(&self, first_write_len: usize) -> bool {
        self.enabled && first_write_len > self.threshold
    }

    /// Level clamped to what the configured algorithm accepts
    pub fn effective_level(&self) -> u32 {
        self.level.min(self.algorithm.max_level())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CompressionConfig::default();
        assert!(config.enabled);
        assert!(config.negotiate);
        assert_eq!(config.level, 6);
        assert_eq!(config.threshold, 1024);
        assert_eq!(config.algorithm, CompressionAlgorithm::Gzip);
    }

    #[test]
    fn test_should_compress_is_strict() {
        let config = CompressionConfig::default();
        assert!(!config.should_compress(10));
        assert!(!config.should_compress(1024));
        assert!(config.should_compress(1025));
    }

    #[test]
    fn test_disabled_never_compresses() {
        let config = CompressionConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(!config.should_compress(1 << 20));
    }

    #[test]
    fn test_effective_level_clamped() {
        let config = CompressionConfig {
            level: 30,
            ..Default::default()
        };
        assert_eq!(config.effective_level(), 9);

        let config = CompressionConfig {
            level: 30,
            algorithm: CompressionAlgorithm::Zstd,
            ..Default::default()
        };
        assert_eq!(config.effective_level(), 22);
    }
}
