//! LanceDB connection wrapper with table lifecycle helpers.
//!
//! Provides `LanceVectorStore`, which wraps a `lancedb::Connection`, caches
//! opened table handles, and resolves user-facing table names to the names
//! actually stored in the database.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use arrow_schema::Schema;
use dashmap::DashMap;

use lancedb_mcp_core::table::naming::sanitize_table_name;
use lancedb_mcp_core::table::schema_spec::TableSchemaSpec;
use lancedb_mcp_types::error::OperationError;

use super::schema::arrow_schema;

/// A user-facing table name paired with the name it is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTable {
    pub requested: String,
    pub stored: String,
}

/// LanceDB connection and table management.
///
/// Table handles are cached after the first open; every drop or create
/// through this type keeps the cache in step with the database.
pub struct LanceVectorStore {
    db: lancedb::Connection,
    uri: String,
    tables: DashMap<String, lancedb::Table>,
}

impl LanceVectorStore {
    /// Open or create a store in a local directory.
    ///
    /// Creates the directory if it does not exist.
    pub async fn new(base_path: PathBuf) -> Result<Self, lancedb::Error> {
        let uri = base_path
            .to_str()
            .ok_or_else(|| lancedb::Error::InvalidInput {
                message: format!("Path contains invalid UTF-8: {}", base_path.display()),
            })?
            .to_string();
        Self::connect(&uri, None).await
    }

    /// Connect to `uri`: a local path or an object-store URI.
    ///
    /// Local directories are created on demand. With `read_consistency` set,
    /// cached handles re-check for writes made by other processes at most
    /// that often.
    pub async fn connect(
        uri: &str,
        read_consistency: Option<Duration>,
    ) -> Result<Self, lancedb::Error> {
        if !uri.contains("://") {
            std::fs::create_dir_all(uri).map_err(|e| lancedb::Error::CreateDir {
                path: uri.to_string(),
                source: e,
            })?;
        }

        let mut builder = lancedb::connect(uri);
        if let Some(interval) = read_consistency {
            builder = builder.read_consistency_interval(interval);
        }
        let db = builder.execute().await?;

        tracing::debug!(uri, "Connected to LanceDB");

        Ok(Self {
            db,
            uri: uri.to_string(),
            tables: DashMap::new(),
        })
    }

    /// Open a table, reusing a cached handle when one exists.
    pub async fn open_table(&self, table_name: &str) -> Result<lancedb::Table, lancedb::Error> {
        if let Some(table) = self.tables.get(table_name) {
            return Ok(table.clone());
        }
        let table = self.db.open_table(table_name).execute().await?;
        self.tables.insert(table_name.to_string(), table.clone());
        Ok(table)
    }

    /// Create an empty table with the given schema.
    ///
    /// Fails with `TableAlreadyExists` when the name is taken.
    pub async fn create_empty_table(
        &self,
        table_name: &str,
        schema: Arc<Schema>,
    ) -> Result<lancedb::Table, lancedb::Error> {
        let table = self
            .db
            .create_empty_table(table_name, schema)
            .execute()
            .await?;
        self.tables.insert(table_name.to_string(), table.clone());
        Ok(table)
    }

    /// Drop a table from the database.
    ///
    /// Returns Ok(()) even if the table does not exist (idempotent).
    pub async fn drop_table(&self, table_name: &str) -> Result<(), lancedb::Error> {
        self.tables.remove(table_name);
        match self.db.drop_table(table_name, &[]).await {
            Ok(()) => Ok(()),
            Err(lancedb::Error::TableNotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// List all table names in the database, sorted.
    pub async fn table_names(&self) -> Result<Vec<String>, lancedb::Error> {
        let mut names = self.db.table_names().execute().await?;
        names.sort();
        Ok(names)
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Find the stored table for a user-facing name.
    ///
    /// The name is looked up verbatim first, then in sanitized form, so tables
    /// created outside this server under non-CamelCase names stay reachable.
    /// Returns `Ok(None)` when neither exists.
    pub async fn resolve_table(
        &self,
        requested: &str,
    ) -> Result<Option<ResolvedTable>, OperationError> {
        let requested = requested.trim();
        let sanitized = sanitize_table_name(requested)?;
        let names = self
            .table_names()
            .await
            .map_err(|e| OperationError::database("failed to list tables", e))?;

        let stored = if names.iter().any(|n| n == requested) {
            requested.to_string()
        } else if names.iter().any(|n| *n == sanitized) {
            sanitized
        } else {
            return Ok(None);
        };

        Ok(Some(ResolvedTable {
            requested: requested.to_string(),
            stored,
        }))
    }

    /// Resolve `requested` and open it, or fail with `TableNotFound`.
    pub async fn open_existing(
        &self,
        requested: &str,
    ) -> Result<(ResolvedTable, lancedb::Table), OperationError> {
        let resolved = self
            .resolve_table(requested)
            .await?
            .ok_or_else(|| OperationError::TableNotFound(requested.trim().to_string()))?;
        let table = self
            .open_table(&resolved.stored)
            .await
            .map_err(|e| open_error(&resolved.requested, e))?;
        Ok((resolved, table))
    }

    /// Create a table for a validated schema under its sanitized name.
    pub async fn create_from_spec(
        &self,
        requested: &str,
        spec: &TableSchemaSpec,
    ) -> Result<(ResolvedTable, lancedb::Table), OperationError> {
        let requested = requested.trim();
        let stored = sanitize_table_name(requested)?;
        let schema = Arc::new(arrow_schema(spec));

        let table = self
            .create_empty_table(&stored, schema)
            .await
            .map_err(|e| match e {
                lancedb::Error::TableAlreadyExists { .. } => {
                    OperationError::TableAlreadyExists(requested.to_string())
                }
                other => OperationError::database(&format!("failed to create table '{stored}'"), other),
            })?;

        tracing::info!(table = requested, stored = %stored, "Created table");

        Ok((
            ResolvedTable {
                requested: requested.to_string(),
                stored,
            },
            table,
        ))
    }
}

fn open_error(requested: &str, err: lancedb::Error) -> OperationError {
    match err {
        lancedb::Error::TableNotFound { .. } => OperationError::TableNotFound(requested.to_string()),
        other => OperationError::database(&format!("failed to open table '{requested}'"), other),
    }
}
