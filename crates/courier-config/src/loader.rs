//! Configuration loading

use crate::Config;
use courier_core::{Error, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::env;
use std::ffi::OsStr;
use std::fs;
use std::path::Path;

/// Matches `${VAR}` or `${VAR:-default}`
static ENV_VAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(:-([^}]*))?\}").expect("valid env var pattern")
});

/// Syntax of a configuration document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML (`.yaml`, `.yml`)
    Yaml,
    /// TOML (`.toml`)
    Toml,
    /// JSON (`.json`)
    Json,
}

impl ConfigFormat {
    /// Pick the syntax from the file extension, ignoring case
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            Some(other) => Err(Error::Config(format!(
                "{}: unsupported config extension .{other}",
                path.display()
            ))),
            None => Err(Error::Config(format!(
                "{}: config file needs a .yaml, .toml or .json extension",
                path.display()
            ))),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Yaml => "YAML",
            Self::Toml => "TOML",
            Self::Json => "JSON",
        }
    }

    fn parse(self, content: &str) -> Result<Config> {
        let parsed = match self {
            Self::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            Self::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            Self::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        };
        parsed.map_err(|e| Error::Config(format!("Failed to parse {}: {e}", self.name())))
    }
}

/// Load configuration from a file
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();

    let format = ConfigFormat::from_path(path)?;
    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

    load_from_str(&content, format)
}

/// Expand environment variables in configuration string
/// Supports syntax: ${VAR} and ${VAR:-default}
fn expand_env_vars(content: &str) -> Result<String> {
    let mut missing = None;

    let expanded = ENV_VAR.replace_all(content, |cap: &Captures<'_>| {
        let name = &cap[1];
        match (env::var(name), cap.get(3)) {
            (Ok(value), _) => value,
            (Err(_), Some(default)) => default.as_str().to_string(),
            (Err(_), None) => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(name) => Err(Error::Config(format!(
            "Environment variable '{name}' not set and no default provided"
        ))),
        None => Ok(expanded.into_owned()),
    }
}

/// Load configuration from a string
pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<Config> {
    format.parse(&expand_env_vars(content)?)
}

/// Load a configuration file and validate it
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let config = load_from_file(path)?;

    crate::validator::validate_config(&config)?;
    tracing::debug!(path = %path.display(), "Configuration loaded");

    Ok(config)
}
