//! Compression schemes and Accept-Encoding negotiation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported compression algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompressionAlgorithm {
    /// gzip (RFC 1952)
    #[serde(rename = "gzip")]
    Gzip,
    /// zlib-wrapped deflate (RFC 1950)
    #[serde(rename = "deflate")]
    Deflate,
    /// brotli (RFC 7932)
    #[serde(rename = "br")]
    Brotli,
    /// zstandard (RFC 8878)
    #[serde(rename = "zstd")]
    Zstd,
}

impl CompressionAlgorithm {
    /// Get the Content-Encoding header value
    pub fn encoding_name(&self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Deflate => "deflate",
            Self::Brotli => "br",
            Self::Zstd => "zstd",
        }
    }

    /// Highest level the codec accepts
    pub fn max_level(&self) -> u32 {
        match self {
            Self::Gzip | Self::Deflate => 9,
            Self::Brotli => 11,
            Self::Zstd => 22,
        }
    }

    /// Check whether an `Accept-Encoding` header allows this scheme
    ///
    /// Honors `q=0` exclusions and the `*` wildcard. A missing header means
    /// the client accepts any encoding.
    pub fn accepted_by(&self, accept_encoding: Option<&str>) -> bool {
        let Some(accept) = accept_encoding else {
            return true;
        };

        let mut wildcard = false;
        for item in accept.split(',') {
            let mut parts = item.split(';');
            let coding = parts.next().unwrap_or("").trim();
            let rejected = parts.any(|param| {
                param
                    .trim()
                    .strip_prefix("q=")
                    .and_then(|q| q.trim().parse::<f32>().ok())
                    .is_some_and(|q| q <= 0.0)
            });

            if coding.eq_ignore_ascii_case(self.encoding_name()) {
                return !rejected;
            }
            if coding == "*" {
                wildcard = !rejected;
            }
        }

        wildcard
    }
}

impl fmt::Display for CompressionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.encoding_name())
    }
}

impl FromStr for CompressionAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gzip" => Ok(Self::Gzip),
            "deflate" => Ok(Self::Deflate),
            "br" => Ok(Self::Brotli),
            "zstd" => Ok(Self::Zstd),
            other => Err(format!("unsupported compression algorithm '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_encoding_name() {
        assert_eq!(CompressionAlgorithm::Gzip.encoding_name(), "gzip");
        assert_eq!(CompressionAlgorithm::Deflate.encoding_name(), "deflate");
        assert_eq!(CompressionAlgorithm::Brotli.encoding_name(), "br");
        assert_eq!(CompressionAlgorithm::Zstd.encoding_name(), "zstd");
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!("gzip".parse(), Ok(CompressionAlgorithm::Gzip));
        assert_eq!(" BR ".parse(), Ok(CompressionAlgorithm::Brotli));
        assert_eq!("zstd".parse(), Ok(CompressionAlgorithm::Zstd));
        assert!("lzma".parse::<CompressionAlgorithm>().is_err());
    }

    #[test]
    fn test_accepted_by() {
        let gzip = CompressionAlgorithm::Gzip;

        assert!(gzip.accepted_by(None));
        assert!(gzip.accepted_by(Some("gzip, deflate, br")));
        assert!(gzip.accepted_by(Some("br;q=1.0, gzip;q=0.5")));
        assert!(!gzip.accepted_by(Some("br, zstd")));
        assert!(!gzip.accepted_by(Some("gzip;q=0, br")));
        assert!(gzip.accepted_by(Some("*")));
        assert!(!gzip.accepted_by(Some("*, gzip;q=0")));
        assert!(!gzip.accepted_by(Some("identity")));
    }

    #[test]
    fn test_serde_names() {
        let algo: CompressionAlgorithm = serde_json::from_str("\"br\"").unwrap();
        assert_eq!(algo, CompressionAlgorithm::Brotli);
        assert_eq!(serde_json::to_string(&CompressionAlgorithm::Zstd).unwrap(), "\"zstd\"");
    }
}
