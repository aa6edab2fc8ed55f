//! CLI definitions for the `lancedb-mcp` binary.
//!
//! With no subcommand the binary serves MCP over stdio, which is what MCP
//! hosts expect when they launch it. `check` and `call` are for humans
//! poking at a database from a shell.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use lancedb_mcp_types::config::{EmbeddingFunction, LogFormat, ServerConfig};

/// MCP server exposing LanceDB tables, documents and vector search.
#[derive(Parser)]
#[command(name = "lancedb-mcp", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a TOML config file. Missing files fall back to defaults.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database location (overrides LANCEDB_URI).
    #[arg(long, global = true)]
    pub db_uri: Option<String>,

    /// Table used when a tool call names none (overrides TABLE_NAME).
    #[arg(long, global = true)]
    pub table_name: Option<String>,

    /// Embedding backend: fastembed, sentence-transformers or hashing.
    #[arg(long, global = true)]
    pub embedding_function: Option<EmbeddingFunction>,

    /// Embedding model name (overrides MODEL_NAME).
    #[arg(long, global = true)]
    pub model_name: Option<String>,

    /// Log level or filter directive. RUST_LOG still wins.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format on stderr: text or json.
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve MCP tools over stdin/stdout (default).
    Serve,

    /// Open the database and embedder, then print the effective setup.
    Check,

    /// Run a single tool and print its JSON result.
    Call {
        /// Tool name, e.g. `list_tables`.
        tool: String,

        /// Tool arguments as a JSON object.
        #[arg(long, default_value = "{}")]
        args: String,
    },
}

impl Cli {
    /// Apply flags on top of file and environment configuration.
    pub fn apply_overrides(&self, config: &mut ServerConfig) {
        if let Some(db_uri) = &self.db_uri {
            config.db_uri = db_uri.clone();
        }
        if let Some(table_name) = &self.table_name {
            config.table_name = table_name.clone();
        }
        if let Some(function) = self.embedding_function {
            config.embedding_function = function;
        }
        if let Some(model_name) = &self.model_name {
            config.model_name = model_name.clone();
        }
        if let Some(log_level) = &self.log_level {
            config.log_level = log_level.clone();
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["lancedb-mcp"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_call_parses_args() {
        let cli = Cli::try_parse_from([
            "lancedb-mcp",
            "call",
            "query_table",
            "--args",
            r#"{"query": "rust"}"#,
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Call { tool, args }) => {
                assert_eq!(tool, "query_table");
                assert_eq!(args, r#"{"query": "rust"}"#);
            }
            _ => panic!("Expected call subcommand"),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "lancedb-mcp",
            "--db-uri",
            "/tmp/vectors",
            "--embedding-function",
            "hashing",
            "--log-format",
            "json",
            "check",
        ])
        .unwrap();

        let mut config = ServerConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.db_uri, "/tmp/vectors");
        assert_eq!(config.embedding_function, EmbeddingFunction::Hashing);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.table_name, "lancedb-mcp-table");
    }

    #[test]
    fn test_invalid_embedding_function_rejected() {
        let result = Cli::try_parse_from(["lancedb-mcp", "--embedding-function", "openai"]);
        assert!(result.is_err());
    }
}
