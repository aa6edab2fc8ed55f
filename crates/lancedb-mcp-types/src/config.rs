//! Server configuration types.
//!
//! `ServerConfig` is the merged result of an optional `config.toml`,
//! environment variables, and CLI flags. Every field has a default so an
//! empty file (or no file at all) yields a working configuration.

use serde::{Deserialize, Serialize};

/// Default database location. A leading `~` is expanded by the loader.
pub const DEFAULT_DB_URI: &str = "~/lancedb";

/// Default table used when a tool call omits `table_name`.
pub const DEFAULT_TABLE_NAME: &str = "lancedb-mcp-table";

/// Default sentence-embedding model.
pub const DEFAULT_MODEL_NAME: &str = "all-MiniLM-L6-v2";

/// Which embedding backend turns text into vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmbeddingFunction {
    /// Local ONNX sentence-transformer models via fastembed.
    #[serde(alias = "sentence-transformers")]
    Fastembed,
    /// Deterministic feature-hashing embedder; needs no model download.
    Hashing,
}

impl std::str::FromStr for EmbeddingFunction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fastembed" | "sentence-transformers" => Ok(Self::Fastembed),
            "hashing" => Ok(Self::Hashing),
            other => Err(format!(
                "unknown embedding function '{other}' (expected fastembed, sentence-transformers or hashing)"
            )),
        }
    }
}

impl std::fmt::Display for EmbeddingFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingFunction::Fastembed => write!(f, "fastembed"),
            EmbeddingFunction::Hashing => write!(f, "hashing"),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}' (expected text or json)")),
        }
    }
}

/// Top-level configuration for the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Database location (local path or object-store URI).
    #[serde(default = "default_db_uri")]
    pub db_uri: String,

    /// Table used when a tool call does not name one.
    #[serde(default = "default_table_name")]
    pub table_name: String,

    #[serde(default = "default_embedding_function")]
    pub embedding_function: EmbeddingFunction,

    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Where fastembed keeps downloaded model files.
    #[serde(default)]
    pub model_cache_dir: Option<String>,

    /// Tracing filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,

    /// How often table handles re-check for writes from other processes.
    /// Zero disables the check.
    #[serde(default)]
    pub read_consistency_secs: u64,

    /// Run table maintenance right after `create_table`.
    #[serde(default = "default_true")]
    pub auto_optimize: bool,

    /// Build scalar/full-text/vector indices during maintenance.
    #[serde(default = "default_true")]
    pub auto_create_indices: bool,

    /// Prune old table versions beyond `max_versions`.
    #[serde(default = "default_true")]
    pub auto_cleanup_versions: bool,

    #[serde(default = "default_max_versions")]
    pub max_versions: usize,
}

fn default_db_uri() -> String {
    DEFAULT_DB_URI.to_string()
}

fn default_table_name() -> String {
    DEFAULT_TABLE_NAME.to_string()
}

fn default_embedding_function() -> EmbeddingFunction {
    EmbeddingFunction::Fastembed
}

fn default_model_name() -> String {
    DEFAULT_MODEL_NAME.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Text
}

fn default_true() -> bool {
    true
}

fn default_max_versions() -> usize {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_uri: default_db_uri(),
            table_name: default_table_name(),
            embedding_function: default_embedding_function(),
            model_name: default_model_name(),
            model_cache_dir: None,
            log_level: default_log_level(),
            log_format: default_log_format(),
            read_consistency_secs: 0,
            auto_optimize: true,
            auto_create_indices: true,
            auto_cleanup_versions: true,
            max_versions: default_max_versions(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default_values() {
        let config = ServerConfig::default();
        assert_eq!(config.db_uri, "~/lancedb");
        assert_eq!(config.table_name, "lancedb-mcp-table");
        assert_eq!(config.embedding_function, EmbeddingFunction::Fastembed);
        assert_eq!(config.model_name, "all-MiniLM-L6-v2");
        assert_eq!(config.max_versions, 10);
        assert!(config.auto_optimize);
    }

    #[test]
    fn test_server_config_deserialize_with_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.table_name, DEFAULT_TABLE_NAME);
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.read_consistency_secs, 0);
    }

    #[test]
    fn test_server_config_deserialize_with_values() {
        let toml_str = r#"
db_uri = "/data/vectors"
table_name = "notes"
embedding_function = "sentence-transformers"
model_name = "bge-small-en-v1.5"
log_format = "json"
max_versions = 3
auto_optimize = false
"#;
        let config: ServerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.db_uri, "/data/vectors");
        assert_eq!(config.table_name, "notes");
        assert_eq!(config.embedding_function, EmbeddingFunction::Fastembed);
        assert_eq!(config.model_name, "bge-small-en-v1.5");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.max_versions, 3);
        assert!(!config.auto_optimize);
        assert!(config.auto_create_indices);
    }

    #[test]
    fn test_embedding_function_from_str() {
        assert_eq!(
            "Sentence-Transformers".parse::<EmbeddingFunction>().unwrap(),
            EmbeddingFunction::Fastembed
        );
        assert_eq!(
            "hashing".parse::<EmbeddingFunction>().unwrap(),
            EmbeddingFunction::Hashing
        );
        assert!("openai".parse::<EmbeddingFunction>().is_err());
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("yaml".parse::<LogFormat>().is_err());
    }
}
