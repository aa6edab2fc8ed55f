//! Table maintenance: index creation, compaction, and version cleanup.
//!
//! Every step is best-effort. A step that fails is recorded under `skipped`
//! with the reason and the remaining steps still run, so a table is never
//! left unusable by maintenance.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use lancedb::index::scalar::{BTreeIndexBuilder, FtsIndexBuilder};
use lancedb::index::Index;
use lancedb::table::OptimizeAction;

use lancedb_mcp_types::error::OperationError;
use lancedb_mcp_types::table::{IndexInfo, IndexStatsReport, MaintenanceReport, VersionReport};

use super::lance::LanceVectorStore;
use super::schema::{is_scalar_indexable, text_column, vector_column};
use super::{count_rows, ServiceSettings};

/// Rows needed before a vector index is worth training.
pub const MIN_ROWS_FOR_VECTOR_INDEX: u64 = 256;

pub struct MaintenanceService {
    store: Arc<LanceVectorStore>,
    settings: ServiceSettings,
}

impl MaintenanceService {
    pub fn new(store: Arc<LanceVectorStore>, settings: ServiceSettings) -> Self {
        Self { store, settings }
    }

    /// Build missing indices (when enabled) and compact the table.
    pub async fn optimize(&self, table_name: &str) -> Result<MaintenanceReport, OperationError> {
        let (resolved, table) = self.store.open_existing(table_name).await?;
        let row_count = count_rows(&table).await?;
        let schema = table
            .schema()
            .await
            .map_err(|e| OperationError::database("failed to read schema", e))?;

        let mut report = MaintenanceReport {
            table_name: resolved.requested.clone(),
            ..Default::default()
        };

        let indexed = indexed_columns(&table).await;
        let vector = vector_column(&schema).map(|(name, _)| name);
        let text = text_column(&schema);

        if self.settings.auto_create_indices {
            for field in schema.fields() {
                let name = field.name();
                if Some(name) == vector.as_ref()
                    || Some(name) == text.as_ref()
                    || !is_scalar_indexable(field.data_type())
                {
                    continue;
                }
                if indexed.contains(name) {
                    report.skipped.push(format!("scalar index on '{name}': already indexed"));
                    continue;
                }
                let result = table
                    .create_index(&[name.as_str()], Index::BTree(BTreeIndexBuilder::default()))
                    .execute()
                    .await;
                record(&mut report, format!("scalar index on '{name}'"), result);
            }

            if let Some(text) = &text {
                if indexed.contains(text) {
                    report.skipped.push(format!("full-text index on '{text}': already indexed"));
                } else {
                    let result = table
                        .create_index(&[text.as_str()], Index::FTS(FtsIndexBuilder::default()))
                        .execute()
                        .await;
                    record(&mut report, format!("full-text index on '{text}'"), result);
                }
            }

            if let Some(vector) = &vector {
                if indexed.contains(vector) {
                    report.skipped.push(format!("vector index on '{vector}': already indexed"));
                } else if row_count < MIN_ROWS_FOR_VECTOR_INDEX {
                    report.skipped.push(format!(
                        "vector index on '{vector}': needs at least {MIN_ROWS_FOR_VECTOR_INDEX} rows (has {row_count})"
                    ));
                    report.recommendations.push(format!(
                        "Run optimize_table again once the table holds {MIN_ROWS_FOR_VECTOR_INDEX}+ rows to build a vector index"
                    ));
                } else {
                    let result = table
                        .create_index(&[vector.as_str()], Index::Auto)
                        .execute()
                        .await;
                    record(&mut report, format!("vector index on '{vector}'"), result);
                }
            }
        }

        let result = table.optimize(OptimizeAction::All).await.map(|_| ());
        record(&mut report, "compaction".to_string(), result);

        tracing::info!(
            table = %resolved.stored,
            applied = report.applied.len(),
            skipped = report.skipped.len(),
            "Table maintenance finished"
        );

        Ok(report)
    }

    /// Report table versions, pruning the oldest beyond `max_versions`
    /// when version cleanup is enabled.
    pub async fn versions(&self, table_name: &str) -> Result<VersionReport, OperationError> {
        let (resolved, table) = self.store.open_existing(table_name).await?;

        let mut versions = table
            .list_versions()
            .await
            .map_err(|e| OperationError::database("failed to list versions", e))?;
        versions.sort_by_key(|v| v.version);

        let mut pruned = 0;
        let max = self.settings.max_versions.max(1);

        if self.settings.auto_cleanup_versions && versions.len() > max {
            // Lance prunes versions committed before `now - older_than`. Aim the
            // cutoff between the newest dropped and the oldest kept version so
            // the clock moving on before lance reads it cannot reach `keep_from`.
            let keep_from = versions[versions.len() - max].timestamp;
            let newest_dropped = versions[versions.len() - max - 1].timestamp;
            let cutoff = newest_dropped + (keep_from - newest_dropped) / 2;
            let age = (Utc::now() - cutoff).max(chrono::Duration::zero());

            match table
                .optimize(OptimizeAction::Prune {
                    older_than: Some(age),
                    delete_unverified: Some(false),
                    error_if_tagged_old_versions: Some(false),
                })
                .await
            {
                Ok(stats) => {
                    pruned = stats.prune.map(|p| p.old_versions).unwrap_or(0);
                }
                Err(e) => {
                    tracing::warn!(table = %resolved.stored, "Version cleanup failed: {e}");
                }
            }
        }

        let current_version = table
            .version()
            .await
            .map_err(|e| OperationError::database("failed to read version", e))?;
        let version_count = table
            .list_versions()
            .await
            .map(|v| v.len())
            .unwrap_or(versions.len());

        let message = if pruned > 0 {
            format!(
                "Table '{}' is at version {current_version}; pruned {pruned} old version(s), {version_count} remain",
                resolved.requested
            )
        } else {
            format!(
                "Table '{}' is at version {current_version} with {version_count} version(s)",
                resolved.requested
            )
        };

        Ok(VersionReport {
            table_name: resolved.requested,
            current_version,
            version_count,
            versions_pruned: pruned,
            message,
        })
    }

    /// List indices with their coverage and suggest missing ones.
    pub async fn index_stats(&self, table_name: &str) -> Result<IndexStatsReport, OperationError> {
        let (resolved, table) = self.store.open_existing(table_name).await?;
        let row_count = count_rows(&table).await?;
        let schema = table
            .schema()
            .await
            .map_err(|e| OperationError::database("failed to read schema", e))?;

        let configs = table
            .list_indices()
            .await
            .map_err(|e| OperationError::database("failed to list indices", e))?;

        let mut indices = Vec::with_capacity(configs.len());
        for config in configs {
            let stats = table.index_stats(&config.name).await.ok().flatten();
            indices.push(IndexInfo {
                name: config.name.clone(),
                index_type: format!("{:?}", config.index_type),
                columns: config.columns.clone(),
                num_indexed_rows: stats.as_ref().map(|s| s.num_indexed_rows),
                num_unindexed_rows: stats.as_ref().map(|s| s.num_unindexed_rows),
            });
        }

        let indexed: HashSet<&String> = indices.iter().flat_map(|i| i.columns.iter()).collect();
        let mut recommendations = Vec::new();

        if let Some((vector, _)) = vector_column(&schema) {
            if !indexed.contains(&vector) && row_count >= MIN_ROWS_FOR_VECTOR_INDEX {
                recommendations.push(format!(
                    "Create a vector index on '{vector}' to speed up similarity search ({row_count} rows)"
                ));
            }
        }
        if let Some(text) = text_column(&schema) {
            if !indexed.contains(&text) {
                recommendations.push(format!(
                    "Create a full-text index on '{text}' to enable keyword search"
                ));
            }
        }
        for info in &indices {
            if info.num_unindexed_rows.unwrap_or(0) > 0 {
                recommendations.push(format!(
                    "Index '{}' is missing {} row(s); run optimize_table to refresh it",
                    info.name,
                    info.num_unindexed_rows.unwrap_or(0)
                ));
            }
        }

        Ok(IndexStatsReport {
            table_name: resolved.requested,
            row_count,
            indices,
            recommendations,
        })
    }
}

async fn indexed_columns(table: &lancedb::Table) -> HashSet<String> {
    match table.list_indices().await {
        Ok(configs) => configs.into_iter().flat_map(|c| c.columns).collect(),
        Err(e) => {
            tracing::debug!("Failed to list indices: {e}");
            HashSet::new()
        }
    }
}

fn record(report: &mut MaintenanceReport, step: String, result: Result<(), lancedb::Error>) {
    match result {
        Ok(()) => report.applied.push(step),
        Err(e) => {
            tracing::debug!("Maintenance step '{step}' skipped: {e}");
            report.skipped.push(format!("{step}: {e}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lancedb_mcp_core::table::schema_spec::TableSchemaSpec;
    use serde_json::json;

    use crate::vector::documents::DocumentManager;
    use crate::vector::test_support::{embedder, quiet_settings, store_in};

    async fn seeded(dir: &tempfile::TempDir, settings: ServiceSettings) -> MaintenanceService {
        let store = store_in(dir).await;
        let embedder = embedder();
        let spec = TableSchemaSpec::from_json(
            json!({"doc": "str", "vector": "Vector", "year": "int"})
                .as_object()
                .unwrap(),
            embedder.dimension(),
        )
        .unwrap();
        store.create_from_spec("notes", &spec).await.unwrap();

        let docs = DocumentManager::new(store.clone(), embedder, settings.clone());
        for i in 0..3 {
            docs.ingest(
                Some("notes"),
                vec![format!("note number {i}")],
                false,
                Some(vec![json!({"year": 2020 + i}).as_object().cloned().unwrap()]),
            )
            .await
            .unwrap();
            // Spread commit timestamps so version cutoffs fall between them.
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }

        MaintenanceService::new(store, settings)
    }

    #[tokio::test]
    async fn test_optimize_reports_steps() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let service = seeded(&dir, quiet_settings()).await;

        let report = service.optimize("notes").await.unwrap();
        assert_eq!(report.table_name, "notes");
        assert!(report.skipped.iter().any(|s| s.starts_with("vector index on 'vector'")));
        let total = report.applied.len() + report.skipped.len();
        // year scalar, doc full-text, vector, compaction
        assert_eq!(total, 4);
    }

    #[tokio::test]
    async fn test_optimize_without_indices_only_compacts() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let settings = ServiceSettings {
            auto_create_indices: false,
            ..quiet_settings()
        };
        let service = seeded(&dir, settings).await;

        let report = service.optimize("notes").await.unwrap();
        assert_eq!(report.applied.len() + report.skipped.len(), 1);
    }

    #[tokio::test]
    async fn test_versions_prunes_beyond_limit() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let settings = ServiceSettings {
            max_versions: 2,
            ..quiet_settings()
        };
        let service = seeded(&dir, settings).await;

        let report = service.versions("notes").await.unwrap();
        assert!(report.current_version >= 4);
        assert!(report.versions_pruned > 0);
        assert_eq!(report.version_count, 2);

        // The newest versions survive, so a second pass has nothing to do.
        let again = service.versions("notes").await.unwrap();
        assert_eq!(again.current_version, report.current_version);
        assert_eq!(again.version_count, 2);
        assert_eq!(again.versions_pruned, 0);
    }

    #[tokio::test]
    async fn test_versions_without_cleanup_keeps_all() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let settings = ServiceSettings {
            auto_cleanup_versions: false,
            ..quiet_settings()
        };
        let service = seeded(&dir, settings).await;

        let report = service.versions("notes").await.unwrap();
        assert_eq!(report.versions_pruned, 0);
        assert_eq!(report.version_count as u64, report.current_version);
    }

    #[tokio::test]
    async fn test_index_stats_recommends_full_text_index() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let service = seeded(&dir, quiet_settings()).await;

        let report = service.index_stats("notes").await.unwrap();
        assert_eq!(report.row_count, 3);
        assert!(report.indices.is_empty());
        assert!(report.recommendations.iter().any(|r| r.contains("full-text")));
    }

    #[tokio::test]
    async fn test_missing_table_is_not_found() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let service = MaintenanceService::new(store_in(&dir).await, quiet_settings());

        assert!(matches!(
            service.optimize("ghost").await,
            Err(OperationError::TableNotFound(_))
        ));
        assert!(matches!(
            service.versions("ghost").await,
            Err(OperationError::TableNotFound(_))
        ));
        assert!(matches!(
            service.index_stats("ghost").await,
            Err(OperationError::TableNotFound(_))
        ));
    }
}
