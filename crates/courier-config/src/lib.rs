//! # Courier Configuration
//!
//! Settings for the Courier server, read from YAML, TOML or JSON files:
//! - `server`: listen address and shutdown drain timeout
//! - `compression`: scheme, level and the first-write threshold
//! - `session`: cookie name, row lifetime and cookie attributes
//! - `logging`: filter level and output format
//!
//! `${VAR}` and `${VAR:-default}` references are expanded before parsing,
//! and every loaded file is validated.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod builder;
pub mod loader;
pub mod types;
pub mod validator;

pub use builder::ConfigBuilder;
pub use loader::{load_config, load_from_file, load_from_str, ConfigFormat};
pub use types::{Config, LogFormat, LoggingConfig, ServerConfig};
pub use validator::validate_config;

pub use courier_compression::CompressionConfig;
pub use courier_session::SessionConfig;
