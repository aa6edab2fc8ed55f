//! Vector similarity search.
//!
//! `query_table` is plain cosine search. `hybrid_search` adds a metric choice
//! and a metadata filter; distance clauses in the filter become a post-search
//! threshold, so those searches fetch twice the requested rows before cutting
//! down to `top_k`.

use std::sync::Arc;

use arrow_array::RecordBatch;
use futures_util::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use serde_json::Value;

use lancedb_mcp_core::embedding::box_embedder::BoxEmbedder;
use lancedb_mcp_core::query::filter::split_distance_clauses;
use lancedb_mcp_core::table::schema_spec::TableSchemaSpec;
use lancedb_mcp_types::error::OperationError;
use lancedb_mcp_types::search::{
    DistanceMetric, ExistenceCheck, SearchHit, SearchOutcome, SearchResponse, DISTANCE_COLUMN,
};

use super::lance::LanceVectorStore;
use super::rows::batches_to_rows;
use super::schema::vector_column;
use super::{count_matching, count_rows, ServiceSettings};

/// One search request after argument parsing.
#[derive(Debug, Clone)]
pub struct SearchRequest<'a> {
    pub query: &'a str,
    pub table_name: Option<&'a str>,
    /// `0` asks only whether any row exists.
    pub top_k: i64,
    pub metric: DistanceMetric,
    pub filter_expr: Option<&'a str>,
    /// Used when the filter carries no distance clause of its own.
    pub distance_threshold: Option<f32>,
    pub auto_create: bool,
}

pub struct SearchService {
    store: Arc<LanceVectorStore>,
    embedder: Arc<BoxEmbedder>,
    settings: ServiceSettings,
}

impl SearchService {
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

    /// Cosine similarity search with no filter.
    pub async fn query_table(
        &self,
        query: &str,
        table_name: Option<&str>,
        top_k: i64,
        auto_create: bool,
    ) -> Result<SearchOutcome, OperationError> {
        self.search(
            SearchRequest {
                query,
                table_name,
                top_k,
                metric: DistanceMetric::Cosine,
                filter_expr: None,
                distance_threshold: None,
                auto_create,
            },
            "semantic",
        )
        .await
    }

    /// Similarity search with a metric choice and optional filter.
    pub async fn hybrid_search(
        &self,
        request: SearchRequest<'_>,
    ) -> Result<SearchOutcome, OperationError> {
        self.search(request, "hybrid").await
    }

    async fn search(
        &self,
        request: SearchRequest<'_>,
        search_type: &str,
    ) -> Result<SearchOutcome, OperationError> {
        if request.top_k < 0 {
            return Err(OperationError::invalid(format!(
                "top_k must be zero or positive, got {}",
                request.top_k
            )));
        }
        let query = request.query.trim();
        if query.is_empty() {
            return Err(OperationError::invalid("query must not be empty"));
        }

        let requested = self.settings.table_or_default(request.table_name).to_string();
        let split = request
            .filter_expr
            .map(split_distance_clauses)
            .unwrap_or_default();
        for clause in &split.ignored {
            tracing::warn!(clause = %clause, "Ignoring distance lower bound in filter");
        }
        let threshold = split.threshold.or(request.distance_threshold);
        if let Some(t) = threshold
            && !(t.is_finite() && t >= 0.0)
        {
            return Err(OperationError::invalid(format!(
                "distance threshold must be a non-negative number, got {t}"
            )));
        }

        let empty = |table_name: String| {
            if request.top_k == 0 {
                SearchOutcome::Existence(ExistenceCheck {
                    query: query.to_string(),
                    table_name,
                    exists: false,
                })
            } else {
                SearchOutcome::Results(SearchResponse {
                    query: query.to_string(),
                    table_name,
                    search_type: search_type.to_string(),
                    metric: request.metric,
                    filter_expr: request.filter_expr.map(str::to_string),
                    distance_threshold: threshold,
                    results: Vec::new(),
                    count: 0,
                })
            }
        };

        let (resolved, table) = match self.store.resolve_table(&requested).await? {
            Some(resolved) => {
                let table = self
                    .store
                    .open_table(&resolved.stored)
                    .await
                    .map_err(|e| OperationError::database("failed to open table", e))?;
                (resolved, table)
            }
            None if request.auto_create => {
                let spec = TableSchemaSpec::default_for(self.embedder.dimension());
                let (resolved, _) = self.store.create_from_spec(&requested, &spec).await?;
                tracing::info!(table = %resolved.stored, "Created empty table for search");
                return Ok(empty(resolved.requested));
            }
            None => return Err(OperationError::TableNotFound(requested)),
        };

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

        if let Some(filter) = &split.remaining {
            count_matching(&table, filter).await?;
        }

        if count_rows(&table).await? == 0 {
            return Ok(empty(resolved.requested));
        }

        let vector = self.embedder.embed_one(query).await?;

        let limit = match (request.top_k, threshold) {
            (0, _) => 1,
            (k, Some(_)) => (k as usize).saturating_mul(2),
            (k, None) => k as usize,
        };

        let batches = run_vector_search(
            &table,
            &vector_col,
            &vector,
            request.metric,
            split.remaining.as_deref(),
            limit,
        )
        .await?;
        let mut hits = batches_to_rows(&batches);

        if let Some(threshold) = threshold {
            hits.retain(|hit| within_threshold(hit, threshold));
        }

        if request.top_k == 0 {
            return Ok(SearchOutcome::Existence(ExistenceCheck {
                query: query.to_string(),
                table_name: resolved.requested,
                exists: !hits.is_empty(),
            }));
        }

        hits.truncate(request.top_k as usize);
        tracing::debug!(
            table = %resolved.stored,
            metric = %request.metric,
            hits = hits.len(),
            "Search finished"
        );

        Ok(SearchOutcome::Results(SearchResponse {
            query: query.to_string(),
            table_name: resolved.requested,
            search_type: search_type.to_string(),
            metric: request.metric,
            filter_expr: request.filter_expr.map(str::to_string),
            distance_threshold: threshold,
            count: hits.len(),
            results: hits,
        }))
    }
}

fn distance_type(metric: DistanceMetric) -> lancedb::DistanceType {
    match metric {
        DistanceMetric::Cosine => lancedb::DistanceType::Cosine,
        DistanceMetric::Dot => lancedb::DistanceType::Dot,
        DistanceMetric::L2 => lancedb::DistanceType::L2,
    }
}

/// Rows without a numeric `_distance` are kept.
fn within_threshold(hit: &SearchHit, threshold: f32) -> bool {
    match hit.get(DISTANCE_COLUMN).and_then(Value::as_f64) {
        Some(distance) => distance <= threshold as f64,
        None => true,
    }
}

async fn run_vector_search(
    table: &lancedb::Table,
    vector_col: &str,
    vector: &[f32],
    metric: DistanceMetric,
    filter: Option<&str>,
    limit: usize,
) -> Result<Vec<RecordBatch>, OperationError> {
    let mut query = table
        .vector_search(vector)
        .map_err(|e| OperationError::database("vector search setup failed", e))?
        .column(vector_col)
        .distance_type(distance_type(metric))
        .limit(limit);
    if let Some(filter) = filter {
        query = query.only_if(filter);
    }

    let results = query
        .execute()
        .await
        .map_err(|e| OperationError::database("vector search failed", e))?;

    results
        .try_collect()
        .await
        .map_err(|e| OperationError::database("failed to collect search results", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::vector::documents::DocumentManager;
    use crate::vector::test_support::{embedder, quiet_settings, store_in};

    async fn seeded(dir: &tempfile::TempDir) -> SearchService {
        let store = store_in(dir).await;
        let embedder = embedder();
        let spec = TableSchemaSpec::from_json(
            json!({"doc": "str", "vector": "Vector", "lang": "str"})
                .as_object()
                .unwrap(),
            embedder.dimension(),
        )
        .unwrap();
        store.create_from_spec("library", &spec).await.unwrap();

        let docs = DocumentManager::new(store.clone(), embedder.clone(), quiet_settings());
        let texts = [
            ("rust ownership and borrowing", "en"),
            ("rust async runtime tokio", "en"),
            ("banana bread recipe", "en"),
            ("rust el lenguaje de programacion", "es"),
        ];
        docs.ingest(
            Some("library"),
            texts.iter().map(|(t, _)| t.to_string()).collect(),
            false,
            Some(
                texts
                    .iter()
                    .map(|(_, lang)| json!({"lang": lang}).as_object().cloned().unwrap())
                    .collect(),
            ),
        )
        .await
        .unwrap();

        SearchService::new(store, embedder, quiet_settings())
    }

    fn results(outcome: SearchOutcome) -> SearchResponse {
        match outcome {
            SearchOutcome::Results(response) => response,
            other => panic!("Expected results, got {other:?}"),
        }
    }

    fn request<'a>(query: &'a str, top_k: i64) -> SearchRequest<'a> {
        SearchRequest {
            query,
            table_name: Some("library"),
            top_k,
            metric: DistanceMetric::Cosine,
            filter_expr: None,
            distance_threshold: None,
            auto_create: false,
        }
    }

    #[tokio::test]
    async fn test_query_table_ranks_by_similarity() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let service = seeded(&dir).await;

        let response = results(
            service
                .query_table("rust borrowing", Some("library"), 2, false)
                .await
                .unwrap(),
        );
        assert_eq!(response.count, 2);
        assert_eq!(response.search_type, "semantic");
        assert_eq!(response.results[0]["doc"], json!("rust ownership and borrowing"));
        assert!(response.results[0].contains_key(DISTANCE_COLUMN));
        assert!(!response.results[0].contains_key("vector"));
    }

    #[tokio::test]
    async fn test_existence_check() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let service = seeded(&dir).await;

        match service.query_table("rust", Some("library"), 0, false).await.unwrap() {
            SearchOutcome::Existence(check) => assert!(check.exists),
            other => panic!("Expected existence check, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_argument_validation() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let service = seeded(&dir).await;

        let err = service.query_table("rust", Some("library"), -1, false).await.unwrap_err();
        assert!(matches!(err, OperationError::InvalidArgument(_)));

        let err = service.query_table("   ", Some("library"), 3, false).await.unwrap_err();
        assert!(matches!(err, OperationError::InvalidArgument(_)));

        let err = service.query_table("rust", Some("ghost"), 3, false).await.unwrap_err();
        assert!(matches!(err, OperationError::TableNotFound(_)));
    }

    #[tokio::test]
    async fn test_auto_create_returns_empty() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = store_in(&dir).await;
        let service = SearchService::new(store.clone(), embedder(), quiet_settings());

        let response = results(service.query_table("anything", None, 5, true).await.unwrap());
        assert_eq!(response.count, 0);
        assert_eq!(response.table_name, "lancedb-mcp-table");
        assert_eq!(store.table_names().await.unwrap(), vec!["LancedbMcpTable"]);

        let response = results(service.query_table("anything", None, 5, true).await.unwrap());
        assert_eq!(response.count, 0);
    }

    #[tokio::test]
    async fn test_hybrid_filter_restricts_rows() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let service = seeded(&dir).await;

        let response = results(
            service
                .hybrid_search(SearchRequest {
                    filter_expr: Some("lang = 'es'"),
                    ..request("rust", 5)
                })
                .await
                .unwrap(),
        );
        assert_eq!(response.count, 1);
        assert_eq!(response.results[0]["lang"], json!("es"));
        assert_eq!(response.search_type, "hybrid");
    }

    #[tokio::test]
    async fn test_hybrid_distance_threshold() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let service = seeded(&dir).await;

        let all = results(service.hybrid_search(request("rust async", 4)).await.unwrap());
        let best = all.results[0][DISTANCE_COLUMN].as_f64().unwrap();
        let threshold = best + 1e-3;

        let filter = format!("lang = 'en' AND _distance < {threshold}");
        let response = results(
            service
                .hybrid_search(SearchRequest {
                    filter_expr: Some(&filter),
                    ..request("rust async", 4)
                })
                .await
                .unwrap(),
        );
        let applied = response.distance_threshold.unwrap();
        assert!((applied - threshold as f32).abs() < 1e-6);
        assert!(response.count >= 1);
        for hit in &response.results {
            assert!(hit[DISTANCE_COLUMN].as_f64().unwrap() <= applied as f64);
            assert_eq!(hit["lang"], json!("en"));
        }
    }

    #[tokio::test]
    async fn test_filter_threshold_overrides_parameter() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let service = seeded(&dir).await;

        let response = results(
            service
                .hybrid_search(SearchRequest {
                    distance_threshold: Some(0.0),
                    ..request("rust", 4)
                })
                .await
                .unwrap(),
        );
        assert_eq!(response.distance_threshold, Some(0.0));

        let response = results(
            service
                .hybrid_search(SearchRequest {
                    filter_expr: Some("_distance <= 5"),
                    distance_threshold: Some(0.0),
                    ..request("rust", 4)
                })
                .await
                .unwrap(),
        );
        assert_eq!(response.distance_threshold, Some(5.0));
        assert_eq!(response.count, 4);

        let err = service
            .hybrid_search(SearchRequest {
                distance_threshold: Some(-1.0),
                ..request("rust", 4)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, OperationError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_hybrid_metrics() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let service = seeded(&dir).await;

        for metric in [DistanceMetric::Cosine, DistanceMetric::Dot, DistanceMetric::L2] {
            let response = results(
                service
                    .hybrid_search(SearchRequest {
                        metric,
                        ..request("banana", 2)
                    })
                    .await
                    .unwrap(),
            );
            assert_eq!(response.metric, metric);
            assert_eq!(response.count, 2);
        }
    }

    #[tokio::test]
    async fn test_bad_filter_is_invalid_argument() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let service = seeded(&dir).await;

        let err = service
            .hybrid_search(SearchRequest {
                filter_expr: Some("no_such_column = 1"),
                ..request("rust", 2)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, OperationError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_dimension_mismatch() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = store_in(&dir).await;
        store
            .create_from_spec("wide", &TableSchemaSpec::default_for(64))
            .await
            .unwrap();
        let service = SearchService::new(store, embedder(), quiet_settings());

        let err = service.query_table("x", Some("wide"), 1, false).await.unwrap_err();
        assert!(matches!(err, OperationError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_within_threshold() {
        let hit = json!({"_distance": 0.4}).as_object().cloned().unwrap();
        assert!(within_threshold(&hit, 0.5));
        assert!(!within_threshold(&hit, 0.3));
        let no_distance = json!({"doc": "x"}).as_object().cloned().unwrap();
        assert!(within_threshold(&no_distance, 0.0));
    }
}
