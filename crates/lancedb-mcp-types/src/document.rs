//! Reports returned by document ingestion, update, and deletion.

use serde::{Deserialize, Serialize};

/// Result of `ingest_docs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub table_name: String,
    pub stored_name: String,
    pub documents_added: usize,
    /// Blank entries dropped before embedding.
    pub documents_skipped: usize,
    /// Row count of the table after the append.
    pub row_count: u64,
    pub table_created: bool,
    pub message: String,
}

/// Result of `update_documents`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateReport {
    pub table_name: String,
    pub filter_expr: String,
    pub rows_updated: u64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Result of `delete_documents`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteReport {
    pub table_name: String,
    pub filter_expr: String,
    pub rows_deleted: u64,
    pub rows_remaining: u64,
    pub message: String,
}
