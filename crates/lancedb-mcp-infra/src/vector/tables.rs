//! Table management: create, list, count, inspect, and delete.

use std::sync::Arc;

use serde_json::{Map, Value};

use lancedb_mcp_core::embedding::box_embedder::BoxEmbedder;
use lancedb_mcp_core::table::naming::sanitize_table_name;
use lancedb_mcp_core::table::schema_spec::TableSchemaSpec;
use lancedb_mcp_types::error::OperationError;
use lancedb_mcp_types::table::{
    CreateTableReport, DeleteTableReport, FieldCategory, FieldInfo, FieldSummary, TableCount,
    TableDetails, TableList, TableStats, TableSummary,
};

use super::lance::LanceVectorStore;
use super::maintenance::MaintenanceService;
use super::schema::describe_field;
use super::{count_rows, ServiceSettings};

pub struct TableManager {
    store: Arc<LanceVectorStore>,
    embedder: Arc<BoxEmbedder>,
    maintenance: Arc<MaintenanceService>,
    settings: ServiceSettings,
}

impl TableManager {
    pub fn new(
        store: Arc<LanceVectorStore>,
        embedder: Arc<BoxEmbedder>,
        maintenance: Arc<MaintenanceService>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            store,
            embedder,
            maintenance,
            settings,
        }
    }

    /// Create an empty table with the default or a custom schema.
    ///
    /// The name is stored sanitized. Creating a table whose name (raw or
    /// sanitized) is taken fails with `TableAlreadyExists`. When
    /// `auto_optimize` is on, maintenance runs right after creation and its
    /// report is attached; a maintenance failure never fails the create.
    pub async fn create(
        &self,
        table_name: &str,
        schema: Option<&Map<String, Value>>,
    ) -> Result<CreateTableReport, OperationError> {
        let requested = table_name.trim();
        sanitize_table_name(requested)?;

        let dimension = self.embedder.dimension();
        let spec = match schema {
            Some(schema) => TableSchemaSpec::from_json(schema, dimension)?,
            None => TableSchemaSpec::default_for(dimension),
        };

        if self.store.resolve_table(requested).await?.is_some() {
            return Err(OperationError::TableAlreadyExists(requested.to_string()));
        }

        let (resolved, _table) = self.store.create_from_spec(requested, &spec).await?;

        let mut message = format!(
            "Table '{}' created with fields [{}]",
            resolved.requested,
            spec.field_names().join(", ")
        );
        if resolved.stored != resolved.requested {
            message.push_str(&format!(" (stored as '{}')", resolved.stored));
        }

        let maintenance = if self.settings.auto_optimize {
            match self.maintenance.optimize(&resolved.stored).await {
                Ok(report) => Some(report),
                Err(e) => {
                    tracing::warn!(table = %resolved.stored, "Post-create maintenance failed: {e}");
                    None
                }
            }
        } else {
            None
        };

        Ok(CreateTableReport {
            table_name: resolved.requested,
            stored_name: resolved.stored,
            vector_dimension: spec.vector_dimension(),
            fields: spec.field_names(),
            message,
            maintenance,
        })
    }

    /// All tables with their row counts. A table that cannot be opened is
    /// listed with its error instead of failing the whole call.
    pub async fn list(&self) -> Result<TableList, OperationError> {
        let names = self
            .store
            .table_names()
            .await
            .map_err(|e| OperationError::database("failed to list tables", e))?;

        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let summary = match self.store.open_table(&name).await {
                Ok(table) => match count_rows(&table).await {
                    Ok(n) => TableSummary {
                        name,
                        num_rows: Some(n),
                        error: None,
                    },
                    Err(e) => TableSummary {
                        name,
                        num_rows: None,
                        error: Some(e.to_string()),
                    },
                },
                Err(e) => TableSummary {
                    name,
                    num_rows: None,
                    error: Some(e.to_string()),
                },
            };
            tables.push(summary);
        }

        Ok(TableList {
            count: tables.len(),
            tables,
        })
    }

    pub async fn count(&self) -> Result<TableCount, OperationError> {
        let names = self
            .store
            .table_names()
            .await
            .map_err(|e| OperationError::database("failed to list tables", e))?;
        Ok(TableCount::new(names.len()))
    }

    /// Row count and field descriptions; defaults to the configured table.
    pub async fn details(&self, table_name: Option<&str>) -> Result<TableDetails, OperationError> {
        let requested = self.settings.table_or_default(table_name);
        let (resolved, table) = self.store.open_existing(requested).await?;

        let num_rows = count_rows(&table).await?;
        let fields = self.fields(&table).await?;

        let summary = format!(
            "Table '{}' has {num_rows} row(s) and {} field(s)",
            resolved.requested,
            fields.len()
        );

        Ok(TableDetails {
            name: resolved.requested,
            stored_name: resolved.stored,
            num_rows,
            fields,
            summary,
        })
    }

    /// Row count, version, and fields grouped by category.
    pub async fn stats(&self, table_name: Option<&str>) -> Result<TableStats, OperationError> {
        let requested = self.settings.table_or_default(table_name);
        let (resolved, table) = self.store.open_existing(requested).await?;

        let row_count = count_rows(&table).await?;
        let version = table
            .version()
            .await
            .map_err(|e| OperationError::database("failed to read version", e))?;
        let fields = self.fields(&table).await?;

        let names_in = |pred: &dyn Fn(FieldCategory) -> bool| -> Vec<String> {
            fields
                .iter()
                .filter(|f| pred(f.category))
                .map(|f| f.name.clone())
                .collect()
        };
        let vector_fields = names_in(&|c| c == FieldCategory::Vector);
        let text_fields = names_in(&|c| c == FieldCategory::Text);
        let other_fields = names_in(&|c| c != FieldCategory::Vector && c != FieldCategory::Text);

        let field_summary = FieldSummary {
            total_fields: fields.len(),
            vector_fields: vector_fields.len(),
            text_fields: text_fields.len(),
            other_fields: other_fields.len(),
        };

        Ok(TableStats {
            table_name: resolved.requested,
            stored_name: resolved.stored,
            row_count,
            version,
            fields,
            vector_fields,
            text_fields,
            other_fields,
            field_summary,
        })
    }

    /// Drop a table and report how many rows it held.
    pub async fn delete(&self, table_name: &str) -> Result<DeleteTableReport, OperationError> {
        let (resolved, table) = self.store.open_existing(table_name).await?;
        let rows_deleted = count_rows(&table).await?;

        self.store
            .drop_table(&resolved.stored)
            .await
            .map_err(|e| OperationError::database(&format!("failed to drop table '{}'", resolved.stored), e))?;

        tracing::info!(table = %resolved.stored, rows_deleted, "Dropped table");

        Ok(DeleteTableReport {
            message: format!(
                "Table '{}' deleted ({rows_deleted} row(s) removed)",
                resolved.requested
            ),
            table_name: resolved.requested,
            stored_name: resolved.stored,
            rows_deleted,
        })
    }

    async fn fields(&self, table: &lancedb::Table) -> Result<Vec<FieldInfo>, OperationError> {
        let schema = table
            .schema()
            .await
            .map_err(|e| OperationError::database("failed to read schema", e))?;
        Ok(schema.fields().iter().map(|f| describe_field(f)).collect())
    }
}
