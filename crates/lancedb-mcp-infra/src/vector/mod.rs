//! LanceDB-backed table, document, search, and maintenance operations.
//!
//! `LanceVectorStore` owns the connection and the opened-table cache; the
//! managers in this module share it (and the embedder) through `Arc`s so the
//! MCP tools can run concurrently.

pub mod documents;
pub mod lance;
pub mod maintenance;
pub mod rows;
pub mod schema;
pub mod search;
pub mod tables;

use lancedb_mcp_types::config::ServerConfig;
use lancedb_mcp_types::error::OperationError;

/// Behaviour switches shared by the managers.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Table used when a call does not name one.
    pub default_table: String,
    pub auto_optimize: bool,
    pub auto_create_indices: bool,
    pub auto_cleanup_versions: bool,
    pub max_versions: usize,
}

impl From<&ServerConfig> for ServiceSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            default_table: config.table_name.clone(),
            auto_optimize: config.auto_optimize,
            auto_create_indices: config.auto_create_indices,
            auto_cleanup_versions: config.auto_cleanup_versions,
            max_versions: config.max_versions,
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

impl ServiceSettings {
    /// `requested` when given and non-blank, otherwise the default table.
    pub fn table_or_default<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        match requested.map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => &self.default_table,
        }
    }
}

/// Count rows matching `filter`. LanceDB parses the filter here, so a failure
/// is reported as a bad filter rather than a database fault.
pub(crate) async fn count_matching(
    table: &lancedb::Table,
    filter: &str,
) -> Result<u64, OperationError> {
    table
        .count_rows(Some(filter.to_string()))
        .await
        .map(|n| n as u64)
        .map_err(|e| OperationError::invalid(format!("invalid filter expression '{filter}': {e}")))
}

pub(crate) async fn count_rows(table: &lancedb::Table) -> Result<u64, OperationError> {
    table
        .count_rows(None)
        .await
        .map(|n| n as u64)
        .map_err(|e| OperationError::database("failed to count rows", e))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use lancedb_mcp_core::embedding::box_embedder::BoxEmbedder;

    use super::lance::LanceVectorStore;
    use super::ServiceSettings;
    use crate::embedding::hashing::HashingEmbedder;

    /// Width used by test embedders; small keeps tables cheap.
    pub const TEST_DIMENSION: usize = 32;

    pub async fn store_in(dir: &tempfile::TempDir) -> Arc<LanceVectorStore> {
        Arc::new(
            LanceVectorStore::new(dir.path().to_path_buf())
                .await
                .expect("Failed to create vector store"),
        )
    }

    pub fn embedder() -> Arc<BoxEmbedder> {
        Arc::new(BoxEmbedder::new(HashingEmbedder::new(TEST_DIMENSION)))
    }

    /// Settings with maintenance off so tests only see what they ask for.
    pub fn quiet_settings() -> ServiceSettings {
        ServiceSettings {
            auto_optimize: false,
            ..Default::default()
        }
    }
}
