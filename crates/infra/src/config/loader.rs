//! Configuration loader
//!
//! Loads [`ClientConfig`] from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `FEEDWIRE_API_BASE_URL` is unset, falls back to a config file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! Every loaded configuration is validated before it is returned.
//!
//! ## Environment Variables
//! - `FEEDWIRE_API_BASE_URL`: API base URL (required for env loading)
//! - `FEEDWIRE_API_TIMEOUT_MS`: Per-request timeout in milliseconds
//! - `FEEDWIRE_TOKEN_REFRESH_ENABLED`: Proactive token refresh (true/false)
//! - `FEEDWIRE_REFRESH_GRACE_SECONDS`: Refresh when the token expires within
//!   this many seconds
//! - `FEEDWIRE_MAX_RETRIES`: Default retry budget for transient failures
//! - `FEEDWIRE_CSRF_SECURE`: `Secure` attribute on the CSRF cookie
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./feedwire.json` or `./feedwire.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. The same names in the parent directory
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use feedwire_domain::{ClientConfig, FeedwireError, Result};
use url::Url;

const CONFIG_FILE_NAMES: [&str; 4] = ["feedwire.json", "feedwire.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `FeedwireError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - The loaded configuration fails validation
pub fn load() -> Result<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only `FEEDWIRE_API_BASE_URL` is required; unset optional variables keep
/// their defaults.
///
/// # Errors
/// Returns `FeedwireError::Config` if the base URL is missing or a variable
/// has an invalid value.
pub fn load_from_env() -> Result<ClientConfig> {
    let mut config =
        ClientConfig { base_url: env_var("FEEDWIRE_API_BASE_URL")?, ..ClientConfig::default() };

    if let Some(timeout_ms) = env_parse::<u64>("FEEDWIRE_API_TIMEOUT_MS")? {
        config.timeout_ms = timeout_ms;
    }
    config.token_refresh_enabled =
        env_bool("FEEDWIRE_TOKEN_REFRESH_ENABLED", config.token_refresh_enabled);
    if let Some(grace) = env_parse::<i64>("FEEDWIRE_REFRESH_GRACE_SECONDS")? {
        config.refresh_grace_seconds = grace;
    }
    if let Some(max_retries) = env_parse::<u32>("FEEDWIRE_MAX_RETRIES")? {
        config.retry.max_retries = max_retries;
    }
    config.csrf.secure = env_bool("FEEDWIRE_CSRF_SECURE", config.csrf.secure);

    validated(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `FeedwireError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - The configuration fails validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(FeedwireError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            FeedwireError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| FeedwireError::Config(format!("Failed to read config file: {e}")))?;

    validated(parse_config(&contents, &config_path)?)
}

/// Field validation plus an absolute `http(s)` base URL.
fn validated(config: ClientConfig) -> Result<ClientConfig> {
    config.validate()?;
    let url = Url::parse(&config.base_url)
        .map_err(|e| FeedwireError::Config(format!("Invalid base_url {}: {e}", config.base_url)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(FeedwireError::Config(format!(
            "base_url must use http or https, got {}",
            url.scheme()
        )));
    }
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| FeedwireError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| FeedwireError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(FeedwireError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd.clone());
        roots.push(cwd.join(".."));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
            roots.push(exe_dir.join(".."));
        }
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        FeedwireError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Parse an optional environment variable; `Ok(None)` when unset.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(key)
        .ok()
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| FeedwireError::Config(format!("Invalid value for {key}: {e}")))
        })
        .transpose()
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
