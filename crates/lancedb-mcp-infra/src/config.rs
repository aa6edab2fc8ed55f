//! Server configuration loader.
//!
//! Reads an optional `config.toml` into [`ServerConfig`], then layers
//! environment variables on top. CLI flags are applied last by the binary.
//! A missing file yields the defaults; a file that exists but cannot be
//! parsed is an error, as is an environment variable with an invalid value.

use std::path::Path;
use std::str::FromStr;

use lancedb_mcp_types::config::ServerConfig;
use lancedb_mcp_types::error::ConfigError;

/// Environment variables recognised by [`apply_env_overrides`].
pub const ENV_DB_URI: &str = "LANCEDB_URI";
pub const ENV_TABLE_NAME: &str = "TABLE_NAME";
pub const ENV_EMBEDDING_FUNCTION: &str = "EMBEDDING_FUNCTION";
pub const ENV_MODEL_NAME: &str = "MODEL_NAME";
pub const ENV_MODEL_CACHE_DIR: &str = "MODEL_CACHE_DIR";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";
pub const ENV_READ_CONSISTENCY: &str = "LANCEDB_READ_CONSISTENCY";
pub const ENV_AUTO_OPTIMIZE: &str = "LANCEDB_AUTO_OPTIMIZE";
pub const ENV_AUTO_CREATE_INDICES: &str = "LANCEDB_AUTO_CREATE_INDICES";
pub const ENV_AUTO_CLEANUP_VERSIONS: &str = "LANCEDB_AUTO_CLEANUP_VERSIONS";
pub const ENV_MAX_VERSIONS: &str = "LANCEDB_MAX_VERSIONS";

/// Load configuration from `path`, or the defaults when no path is given.
///
/// - If the file does not exist, returns [`ServerConfig::default()`].
/// - If the file exists but fails to parse, returns [`ConfigError::Parse`].
pub async fn load_config(path: Option<&Path>) -> Result<ServerConfig, ConfigError> {
    let Some(config_path) = path else {
        return Ok(ServerConfig::default());
    };

    let content = match tokio::fs::read_to_string(config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file found at {}, using defaults", config_path.display());
            return Ok(ServerConfig::default());
        }
        Err(err) => {
            return Err(ConfigError::Read {
                path: config_path.display().to_string(),
                message: err.to_string(),
            });
        }
    };

    toml::from_str::<ServerConfig>(&content).map_err(|err| ConfigError::Parse {
        path: config_path.display().to_string(),
        message: err.to_string(),
    })
}

/// Layer environment variables over `config`.
///
/// `lookup` is `std::env::var(..).ok()` in production; tests pass a map.
/// Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut ServerConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get(ENV_DB_URI) {
        config.db_uri = v;
    }
    if let Some(v) = get(ENV_TABLE_NAME) {
        config.table_name = v;
    }
    if let Some(v) = get(ENV_EMBEDDING_FUNCTION) {
        config.embedding_function = parse_value(ENV_EMBEDDING_FUNCTION, &v)?;
    }
    if let Some(v) = get(ENV_MODEL_NAME) {
        config.model_name = v;
    }
    if let Some(v) = get(ENV_MODEL_CACHE_DIR) {
        config.model_cache_dir = Some(v);
    }
    if let Some(v) = get(ENV_LOG_LEVEL) {
        config.log_level = v;
    }
    if let Some(v) = get(ENV_LOG_FORMAT) {
        config.log_format = parse_value(ENV_LOG_FORMAT, &v)?;
    }
    if let Some(v) = get(ENV_READ_CONSISTENCY) {
        config.read_consistency_secs = parse_value(ENV_READ_CONSISTENCY, &v)?;
    }
    if let Some(v) = get(ENV_AUTO_OPTIMIZE) {
        config.auto_optimize = parse_bool(ENV_AUTO_OPTIMIZE, &v)?;
    }
    if let Some(v) = get(ENV_AUTO_CREATE_INDICES) {
        config.auto_create_indices = parse_bool(ENV_AUTO_CREATE_INDICES, &v)?;
    }
    if let Some(v) = get(ENV_AUTO_CLEANUP_VERSIONS) {
        config.auto_cleanup_versions = parse_bool(ENV_AUTO_CLEANUP_VERSIONS, &v)?;
    }
    if let Some(v) = get(ENV_MAX_VERSIONS) {
        config.max_versions = parse_value(ENV_MAX_VERSIONS, &v)?;
    }

    Ok(())
}

/// Load `path` and apply the process environment.
pub async fn load_with_env(path: Option<&Path>) -> Result<ServerConfig, ConfigError> {
    let mut config = load_config(path).await?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

/// Expand a leading `~` to the home directory. URIs with a scheme
/// (`s3://`, `gs://`, `db://`, ...) are returned unchanged.
pub fn expand_home(uri: &str) -> String {
    if uri.contains("://") {
        return uri.to_string();
    }
    let Some(home) = dirs::home_dir() else {
        return uri.to_string();
    };
    if uri == "~" {
        return home.display().to_string();
    }
    match uri.strip_prefix("~/") {
        Some(rest) => home.join(rest).display().to_string(),
        None => uri.to_string(),
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        message: e.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            message: "expected true or false".to_string(),
        }),
    }
}
