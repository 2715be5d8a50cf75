//! Configuration validation

use crate::Config;
use courier_core::{Error, Result, SameSite};
use courier_session::MAX_TTL;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_server(config)?;
    validate_compression(config)?;
    validate_session(config)?;
    validate_logging(config)?;

    Ok(())
}

fn validate_server(config: &Config) -> Result<()> {
    if config.server.shutdown_timeout.is_zero() {
        return Err(Error::Config("shutdown_timeout must be > 0".to_string()));
    }

    if config.server.shutdown_timeout.as_secs() > 300 {
        tracing::warn!("shutdown_timeout is very high (>5 minutes)");
    }

    Ok(())
}

fn validate_compression(config: &Config) -> Result<()> {
    let compression = &config.compression;
    let max = compression.algorithm.max_level();

    if compression.level > max {
        return Err(Error::Config(format!(
            "compression level {} out of range for {} (max {max})",
            compression.level, compression.algorithm
        )));
    }

    if compression.enabled && compression.threshold == 0 {
        tracing::warn!("compression threshold is 0, every non-empty response will be compressed");
    }

    Ok(())
}

fn validate_session(config: &Config) -> Result<()> {
    let session = &config.session;

    if session.cookie_name.is_empty() {
        return Err(Error::Config("session cookie_name cannot be empty".to_string()));
    }

    if session
        .cookie_name
        .chars()
        .any(|c| c.is_ascii_whitespace() || c.is_ascii_control() || "=;,\"".contains(c))
    {
        return Err(Error::Config(format!(
            "Invalid session cookie_name: {}",
            session.cookie_name
        )));
    }

    if session.ttl.is_zero() {
        return Err(Error::Config("session ttl must be > 0".to_string()));
    }

    if session.ttl > MAX_TTL {
        return Err(Error::Config(format!(
            "session ttl {:?} exceeds the maximum of {:?}",
            session.ttl, MAX_TTL
        )));
    }

    if session.cookie.same_site == Some(SameSite::None) && !session.cookie.secure {
        tracing::warn!("SameSite=None session cookies are rejected by browsers unless secure");
    }

    Ok(())
}

fn validate_logging(config: &Config) -> Result<()> {
    let level = config.logging.level.to_ascii_lowercase();

    // Full EnvFilter directives ("info,courier_runtime=debug") are passed through
    if !level.contains(['=', ',']) && !LOG_LEVELS.contains(&level.as_str()) {
        return Err(Error::Config(format!(
            "Invalid log level: {} (must be one of {})",
            config.logging.level,
            LOG_LEVELS.join(", ")
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_compression::CompressionAlgorithm;
    use std::time::Duration;

    #[test]
    fn test_valid_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_shutdown_timeout() {
        let mut config = Config::default();
        config.server.shutdown_timeout = Duration::ZERO;

        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_compression_level_range() {
        let mut config = Config::default();
        config.compression.level = 11;
        assert!(validate_config(&config).is_err());

        config.compression.algorithm = CompressionAlgorithm::Brotli;
        assert!(validate_config(&config).is_ok());

        config.compression.algorithm = CompressionAlgorithm::Zstd;
        config.compression.level = 23;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_empty_cookie_name() {
        let mut config = Config::default();
        config.session.cookie_name = String::new();

        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_cookie_name_with_separator() {
        let mut config = Config::default();
        config.session.cookie_name = "my session".to_string();
        assert!(validate_config(&config).is_err());

        config.session.cookie_name = "a=b".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_ttl() {
        let mut config = Config::default();
        config.session.ttl = Duration::ZERO;

        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_ttl_upper_bound() {
        let mut config = Config::default();

        config.session.ttl = MAX_TTL;
        assert!(validate_config(&config).is_ok());

        config.session.ttl = Duration::from_secs(u64::MAX);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_log_levels() {
        let mut config = Config::default();

        config.logging.level = "WARN".to_string();
        assert!(validate_config(&config).is_ok());

        config.logging.level = "info,courier_runtime=trace".to_string();
        assert!(validate_config(&config).is_ok());

        config.logging.level = "loud".to_string();
        assert!(validate_config(&config).is_err());
    }
}
