//! Document ingest, update, and delete.

use std::sync::Arc;

use arrow_array::RecordBatchIterator;
use serde_json::{Map, Value};

use lancedb_mcp_core::embedding::box_embedder::BoxEmbedder;
use lancedb_mcp_core::query::filter::{is_tautology, require_filter};
use lancedb_mcp_core::query::literal::to_sql_literal;
use lancedb_mcp_core::table::naming::sanitize_table_name;
use lancedb_mcp_core::table::schema_spec::TableSchemaSpec;
use lancedb_mcp_types::document::{DeleteReport, IngestReport, UpdateReport};
use lancedb_mcp_types::error::OperationError;

use super::lance::{LanceVectorStore, ResolvedTable};
use super::rows::{build_batch, check_metadata_keys, PendingDocument};
use super::schema::{text_column, vector_column};
use super::{count_matching, count_rows, ServiceSettings};

pub struct DocumentManager {
    store: Arc<LanceVectorStore>,
    embedder: Arc<BoxEmbedder>,
    settings: ServiceSettings,
}

impl DocumentManager {
    pub fn new(
        store: Arc<LanceVectorStore>,
        embedder: Arc<BoxEmbedder>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            store,
            embedder,
            settings,
        }
    }

    /// Embed and append documents.
    ///
    /// Blank documents are skipped. `metadata`, when given, must have one
    /// object per document (blank ones included) and may only name existing
    /// metadata columns. A missing table is created with the default schema
    /// when `auto_create` is set.
    pub async fn ingest(
        &self,
        table_name: Option<&str>,
        docs: Vec<String>,
        auto_create: bool,
        metadata: Option<Vec<Map<String, Value>>>,
    ) -> Result<IngestReport, OperationError> {
        let requested = self.settings.table_or_default(table_name).to_string();
        sanitize_table_name(&requested)?;

        if let Some(metadata) = &metadata {
            if metadata.len() != docs.len() {
                return Err(OperationError::invalid(format!(
                    "metadata has {} entries but {} documents were given",
                    metadata.len(),
                    docs.len()
                )));
            }
        }

        let total = docs.len();
        let mut metadata = metadata.map(|m| m.into_iter());
        let mut pending: Vec<(String, Map<String, Value>)> = Vec::with_capacity(total);
        for doc in docs {
            let meta = metadata
                .as_mut()
                .and_then(|m| m.next())
                .unwrap_or_default();
            let text = doc.trim();
            if !text.is_empty() {
                pending.push((text.to_string(), meta));
            }
        }
        let skipped = total - pending.len();

        if pending.is_empty() {
            return Err(OperationError::invalid(
                "no valid documents to ingest (all were empty or whitespace)",
            ));
        }

        match self.store.resolve_table(&requested).await? {
            Some(resolved) => {
                let table = self
                    .store
                    .open_table(&resolved.stored)
                    .await
                    .map_err(|e| OperationError::database("failed to open table", e))?;
                let added = self.write(&resolved, &table, pending, None).await?;
                self.report(resolved, &table, added, skipped, false).await
            }
            None if !auto_create => Err(OperationError::TableNotFound(requested)),
            None => {
                // The default schema has no metadata columns. Check that and
                // embed before creating, so a bad request leaves no empty table.
                if let Some((_, meta)) = pending.iter().find(|(_, m)| !m.is_empty()) {
                    let keys: Vec<&str> = meta.keys().map(String::as_str).collect();
                    return Err(OperationError::invalid(format!(
                        "table '{requested}' does not exist and would be created without metadata columns; \
                         create it with a schema containing [{}] first",
                        keys.join(", ")
                    )));
                }
                let texts: Vec<String> = pending.iter().map(|(t, _)| t.clone()).collect();
                let vectors = self.embedder.embed(&texts).await?;
                let spec = TableSchemaSpec::default_for(self.embedder.dimension());
                let (resolved, table) = self.store.create_from_spec(&requested, &spec).await?;
                let added = self.write(&resolved, &table, pending, Some(vectors)).await?;
                self.report(resolved, &table, added, skipped, true).await
            }
        }
    }

    /// Validate against the table schema, embed (unless already done), and append.
    async fn write(
        &self,
        resolved: &ResolvedTable,
        table: &lancedb::Table,
        pending: Vec<(String, Map<String, Value>)>,
        vectors: Option<Vec<Vec<f32>>>,
    ) -> Result<usize, OperationError> {
        let schema = table
            .schema()
            .await
            .map_err(|e| OperationError::database("failed to read schema", e))?;

        let (vector_col, width) = vector_column(&schema).ok_or_else(|| {
            OperationError::invalid(format!(
                "table '{}' has no vector column",
                resolved.requested
            ))
        })?;
        if width != self.embedder.dimension() {
            return Err(OperationError::DimensionMismatch {
                table: resolved.requested.clone(),
                table_dimension: width,
                model_dimension: self.embedder.dimension(),
            });
        }
        let text_col = text_column(&schema).ok_or_else(|| {
            OperationError::invalid(format!(
                "table '{}' has no text column",
                resolved.requested
            ))
        })?;

        for (_, meta) in &pending {
            check_metadata_keys(&schema, &text_col, &vector_col, meta)?;
        }

        let vectors = match vectors {
            Some(vectors) => vectors,
            None => {
                let texts: Vec<String> = pending.iter().map(|(t, _)| t.clone()).collect();
                self.embedder.embed(&texts).await?
            }
        };

        let documents: Vec<PendingDocument> = pending
            .into_iter()
            .zip(vectors)
            .map(|((text, metadata), vector)| PendingDocument {
                text,
                vector,
                metadata,
            })
            .collect();
        let added = documents.len();

        let batch = build_batch(schema.clone(), &text_col, &vector_col, &documents)?;
        let reader = RecordBatchIterator::new(vec![Ok(batch)], schema);
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| OperationError::database("failed to add documents", e))?;

        tracing::debug!(table = %resolved.stored, added, "Documents ingested");
        Ok(added)
    }

    async fn report(
        &self,
        resolved: ResolvedTable,
        table: &lancedb::Table,
        added: usize,
        skipped: usize,
        created: bool,
    ) -> Result<IngestReport, OperationError> {
        let row_count = count_rows(table).await?;

        let mut message = format!(
            "Added {added} document(s) to table '{}'",
            resolved.requested
        );
        if skipped > 0 {
            message.push_str(&format!(" ({skipped} empty document(s) skipped)"));
        }
        if created {
            message.push_str(" (table created)");
        }

        Ok(IngestReport {
            table_name: resolved.requested,
            stored_name: resolved.stored,
            documents_added: added,
            documents_skipped: skipped,
            row_count,
            table_created: created,
            message,
        })
    }

    /// Set columns on rows matching `filter_expr`.
    ///
    /// The vector column cannot be set. Changing the text column does not
    /// recompute embeddings; the report carries a warning when that happens.
    pub async fn update(
        &self,
        table_name: &str,
        filter_expr: &str,
        updates: &Map<String, Value>,
    ) -> Result<UpdateReport, OperationError> {
        let filter = require_filter(filter_expr, "update")?;
        if updates.is_empty() {
            return Err(OperationError::invalid("updates must name at least one column"));
        }

        let (resolved, table) = self.store.open_existing(table_name).await?;
        let schema = table
            .schema()
            .await
            .map_err(|e| OperationError::database("failed to read schema", e))?;
        let vector_col = vector_column(&schema).map(|(name, _)| name);
        let text_col = text_column(&schema);

        let mut assignments = Vec::with_capacity(updates.len());
        for (column, value) in updates {
            if schema.field_with_name(column).is_err() {
                return Err(OperationError::invalid(format!(
                    "column '{column}' does not exist in table '{}'",
                    resolved.requested
                )));
            }
            if Some(column) == vector_col.as_ref() {
                return Err(OperationError::invalid(format!(
                    "column '{column}' holds embeddings and cannot be updated directly"
                )));
            }
            assignments.push((column.clone(), to_sql_literal(column, value)?));
        }

        let mut warnings = Vec::new();
        if let Some(text) = &text_col {
            if updates.contains_key(text) {
                warnings.push(format!(
                    "'{text}' was updated but embeddings were not recomputed; re-ingest the documents to refresh their vectors"
                ));
            }
        }

        if count_rows(&table).await? == 0 {
            warnings.push(format!("table '{}' is empty", resolved.requested));
            return Ok(UpdateReport {
                message: format!(
                    "Table '{}' is empty. No documents to update.",
                    resolved.requested
                ),
                table_name: resolved.requested,
                filter_expr: filter.to_string(),
                rows_updated: 0,
                warnings,
            });
        }

        let matched = count_matching(&table, filter).await?;

        let mut builder = table.update().only_if(filter);
        for (column, literal) in assignments {
            builder = builder.column(column, literal);
        }
        builder
            .execute()
            .await
            .map_err(|e| OperationError::database("failed to update documents", e))?;

        tracing::debug!(table = %resolved.stored, matched, "Documents updated");

        Ok(UpdateReport {
            message: format!(
                "Updated {matched} document(s) in table '{}' matching: {filter}",
                resolved.requested
            ),
            table_name: resolved.requested,
            filter_expr: filter.to_string(),
            rows_updated: matched,
            warnings,
        })
    }

    /// Delete rows matching `filter_expr`. Filters that match every row by
    /// construction are refused; `delete_table` exists for that.
    pub async fn delete(
        &self,
        table_name: &str,
        filter_expr: &str,
    ) -> Result<DeleteReport, OperationError> {
        let filter = require_filter(filter_expr, "delete")?;
        if is_tautology(filter) {
            return Err(OperationError::invalid(format!(
                "filter '{filter}' would delete ALL documents; use delete_table to remove the whole table"
            )));
        }

        let (resolved, table) = self.store.open_existing(table_name).await?;

        let before = count_rows(&table).await?;
        count_matching(&table, filter).await?;

        table
            .delete(filter)
            .await
            .map_err(|e| OperationError::database("failed to delete documents", e))?;

        let after = count_rows(&table).await?;
        let deleted = before.saturating_sub(after);

        tracing::debug!(table = %resolved.stored, deleted, "Documents deleted");

        Ok(DeleteReport {
            message: format!(
                "Deleted {deleted} document(s) from table '{}' matching: {filter}",
                resolved.requested
            ),
            table_name: resolved.requested,
            filter_expr: filter.to_string(),
            rows_deleted: deleted,
            rows_remaining: after,
        })
    }
}
