//! Configuration builder

use crate::types::{Config, LoggingConfig};
use courier_compression::CompressionConfig;
use courier_session::SessionConfig;
use std::net::SocketAddr;
use std::time::Duration;

/// Builder for constructing configuration programmatically
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a builder starting from the defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set listen address
    pub fn listen(mut self, addr: SocketAddr) -> Self {
        self.config.server.listen = addr;
        self
    }

    /// Set graceful shutdown timeout
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.server.shutdown_timeout = timeout;
        self
    }

    /// Set compression configuration
    pub fn compression(mut self, compression: CompressionConfig) -> Self {
        self.config.compression = compression;
        self
    }

    /// Set session configuration
    pub fn session(mut self, session: SessionConfig) -> Self {
        self.config.session = session;
        self
    }

    /// Set logging configuration
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.config.logging = logging;
        self
    }

    /// Validate and build the configuration
    pub fn build(self) -> courier_core::Result<Config> {
        crate::validator::validate_config(&self.config)?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();

        let config = ConfigBuilder::new()
            .listen(addr)
            .shutdown_timeout(Duration::from_secs(5))
            .compression(CompressionConfig {
                threshold: 256,
                ..Default::default()
            })
            .build()
            .unwrap();

        assert_eq!(config.server.listen, addr);
        assert_eq!(config.server.shutdown_timeout, Duration::from_secs(5));
        assert_eq!(config.compression.threshold, 256);
        assert_eq!(config.session.cookie_name, "courier_session");
    }

    #[test]
    fn test_builder_rejects_invalid_session() {
        let result = ConfigBuilder::new()
            .session(SessionConfig {
                ttl: Duration::ZERO,
                ..Default::default()
            })
            .build();
        assert!(result.is_err());
    }
}
