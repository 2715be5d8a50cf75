//! Session configuration

use courier_core::CookieOptions;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest session lifetime a backend is asked to keep
pub const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Name of the cookie carrying the session key
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Lifetime of a session row in the backend
    #[serde(default = "default_ttl", with = "humantime_serde")]
    pub ttl: Duration,

    /// Attributes of the session cookie
    #[serde(default)]
    pub cookie: CookieOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            ttl: default_ttl(),
            cookie: CookieOptions::default(),
        }
    }
}

fn default_cookie_name() -> String {
    "courier_session".to_string()
}

fn default_ttl() -> Duration {
    Duration::from_secs(30 * 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.cookie_name, "courier_session");
        assert_eq!(config.ttl, Duration::from_secs(1800));
        assert!(config.cookie.http_only);
    }

    #[test]
    fn test_deserialize_humantime_ttl() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"cookie_name": "sid", "ttl": "2h"}"#).unwrap();
        assert_eq!(config.cookie_name, "sid");
        assert_eq!(config.ttl, Duration::from_secs(7200));
    }
}
