//! Application state wiring all services together.
//!
//! The database connection and the embedding model are opened once here and
//! shared by every tool call for the life of the process.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use lancedb_mcp_core::embedding::box_embedder::BoxEmbedder;
use lancedb_mcp_infra::config::expand_home;
use lancedb_mcp_infra::embedding::build_embedder;
use lancedb_mcp_infra::vector::ServiceSettings;
use lancedb_mcp_infra::vector::documents::DocumentManager;
use lancedb_mcp_infra::vector::lance::LanceVectorStore;
use lancedb_mcp_infra::vector::maintenance::MaintenanceService;
use lancedb_mcp_infra::vector::search::SearchService;
use lancedb_mcp_infra::vector::tables::TableManager;
use lancedb_mcp_types::config::ServerConfig;

/// Shared application state holding all services.
///
/// Used by the MCP server and by the one-shot `call` command.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub store: Arc<LanceVectorStore>,
    pub embedder: Arc<BoxEmbedder>,
    pub tables: Arc<TableManager>,
    pub documents: Arc<DocumentManager>,
    pub search: Arc<SearchService>,
    pub maintenance: Arc<MaintenanceService>,
}

impl AppState {
    /// Connect to the database, load the embedding model and build services.
    pub async fn init(config: ServerConfig) -> anyhow::Result<Self> {
        let db_uri = expand_home(&config.db_uri);
        let read_consistency = match config.read_consistency_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let store = Arc::new(
            LanceVectorStore::connect(&db_uri, read_consistency)
                .await
                .with_context(|| format!("Failed to open LanceDB at {db_uri}"))?,
        );
        tracing::info!(uri = %db_uri, "Database ready");

        let embedder = Arc::new(build_embedder(&config).context("Failed to load embedding model")?);

        let settings = ServiceSettings::from(&config);
        let maintenance = Arc::new(MaintenanceService::new(store.clone(), settings.clone()));
        let tables = Arc::new(TableManager::new(
            store.clone(),
            embedder.clone(),
            maintenance.clone(),
            settings.clone(),
        ));
        let documents = Arc::new(DocumentManager::new(
            store.clone(),
            embedder.clone(),
            settings.clone(),
        ));
        let search = Arc::new(SearchService::new(store.clone(), embedder.clone(), settings));

        Ok(Self {
            config: Arc::new(config),
            store,
            embedder,
            tables,
            documents,
            search,
            maintenance,
        })
    }

    /// Effective setup as printed by `lancedb-mcp check`.
    pub async fn describe(&self) -> anyhow::Result<serde_json::Value> {
        let tables = self.tables.list().await?;
        Ok(serde_json::json!({
            "config": self.config.as_ref(),
            "db_uri": self.store.uri(),
            "embedding": {
                "function": self.config.embedding_function.to_string(),
                "model": self.embedder.model_name(),
                "dimension": self.embedder.dimension(),
            },
            "default_table": self.config.table_name,
            "tables": tables,
        }))
    }
}
