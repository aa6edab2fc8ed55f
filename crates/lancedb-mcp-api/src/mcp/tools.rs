//! Tool implementations shared by the MCP server and `lancedb-mcp call`.
//!
//! Each tool takes typed parameters and returns the JSON payload of its
//! response. [`dispatch`] routes a tool name plus raw JSON arguments to the
//! matching function.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use lancedb_mcp_infra::vector::search::SearchRequest;
use lancedb_mcp_types::error::OperationError;
use lancedb_mcp_types::search::DistanceMetric;

use super::params::{
    CreateTableParams, DeleteDocumentsParams, HybridSearchParams, IngestDocsParams,
    OptionalTableParams, QueryTableParams, TableParams, UpdateDocumentsParams,
};
use crate::state::AppState;

/// Every tool the server registers, in listing order.
pub const TOOL_NAMES: &[&str] = &[
    "create_table",
    "list_tables",
    "table_count",
    "table_details",
    "table_stats",
    "delete_table",
    "ingest_docs",
    "update_documents",
    "delete_documents",
    "query_table",
    "hybrid_search",
    "optimize_table",
    "table_versions",
    "index_stats",
];

/// Run the tool called `name` with raw JSON `args`.
///
/// `null` arguments are treated as an empty object so that tools without
/// required parameters can be called bare.
pub async fn dispatch(state: &AppState, name: &str, args: Value) -> Result<Value, OperationError> {
    let args = match args {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };

    match name {
        "create_table" => create_table(state, parse(args)?).await,
        "list_tables" => list_tables(state).await,
        "table_count" => table_count(state).await,
        "table_details" => table_details(state, parse(args)?).await,
        "table_stats" => table_stats(state, parse(args)?).await,
        "delete_table" => delete_table(state, parse(args)?).await,
        "ingest_docs" => ingest_docs(state, parse(args)?).await,
        "update_documents" => update_documents(state, parse(args)?).await,
        "delete_documents" => delete_documents(state, parse(args)?).await,
        "query_table" => query_table(state, parse(args)?).await,
        "hybrid_search" => hybrid_search(state, parse(args)?).await,
        "optimize_table" => optimize_table(state, parse(args)?).await,
        "table_versions" => table_versions(state, parse(args)?).await,
        "index_stats" => index_stats(state, parse(args)?).await,
        other => Err(OperationError::invalid(format!(
            "unknown tool '{other}', available tools: {}",
            TOOL_NAMES.join(", ")
        ))),
    }
}

fn parse<T: DeserializeOwned>(args: Value) -> Result<T, OperationError> {
    serde_json::from_value(args)
        .map_err(|e| OperationError::invalid(format!("invalid tool arguments: {e}")))
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, OperationError> {
    serde_json::to_value(value)
        .map_err(|e| OperationError::Database(format!("failed to encode response: {e}")))
}

pub async fn create_table(
    state: &AppState,
    params: CreateTableParams,
) -> Result<Value, OperationError> {
    tracing::info!(table = %params.table_name, "create_table");
    let report = state
        .tables
        .create(&params.table_name, params.schema.as_ref())
        .await?;
    to_json(&report)
}

pub async fn list_tables(state: &AppState) -> Result<Value, OperationError> {
    tracing::info!("list_tables");
    to_json(&state.tables.list().await?)
}

pub async fn table_count(state: &AppState) -> Result<Value, OperationError> {
    tracing::info!("table_count");
    to_json(&state.tables.count().await?)
}

pub async fn table_details(
    state: &AppState,
    params: OptionalTableParams,
) -> Result<Value, OperationError> {
    tracing::info!(table = ?params.table_name, "table_details");
    to_json(&state.tables.details(params.table_name.as_deref()).await?)
}

pub async fn table_stats(
    state: &AppState,
    params: OptionalTableParams,
) -> Result<Value, OperationError> {
    tracing::info!(table = ?params.table_name, "table_stats");
    to_json(&state.tables.stats(params.table_name.as_deref()).await?)
}

pub async fn delete_table(state: &AppState, params: TableParams) -> Result<Value, OperationError> {
    tracing::info!(table = %params.table_name, "delete_table");
    to_json(&state.tables.delete(&params.table_name).await?)
}

pub async fn ingest_docs(
    state: &AppState,
    params: IngestDocsParams,
) -> Result<Value, OperationError> {
    let docs = params.docs.into_vec();
    tracing::info!(table = ?params.table_name, docs = docs.len(), "ingest_docs");
    let report = state
        .documents
        .ingest(
            params.table_name.as_deref(),
            docs,
            params.auto_create_table,
            params.metadata,
        )
        .await?;
    to_json(&report)
}

pub async fn update_documents(
    state: &AppState,
    params: UpdateDocumentsParams,
) -> Result<Value, OperationError> {
    tracing::info!(
        table = %params.table_name,
        filter = %params.filter_expr,
        "update_documents"
    );
    let report = state
        .documents
        .update(&params.table_name, &params.filter_expr, &params.updates)
        .await?;
    to_json(&report)
}

pub async fn delete_documents(
    state: &AppState,
    params: DeleteDocumentsParams,
) -> Result<Value, OperationError> {
    tracing::info!(
        table = %params.table_name,
        filter = %params.filter_expr,
        "delete_documents"
    );
    let report = state
        .documents
        .delete(&params.table_name, &params.filter_expr)
        .await?;
    to_json(&report)
}

pub async fn query_table(
    state: &AppState,
    params: QueryTableParams,
) -> Result<Value, OperationError> {
    tracing::info!(table = ?params.table_name, top_k = params.top_k, "query_table");
    let outcome = state
        .search
        .query_table(
            &params.query,
            params.table_name.as_deref(),
            params.top_k,
            params.auto_create_table,
        )
        .await?;
    to_json(&outcome)
}

pub async fn hybrid_search(
    state: &AppState,
    params: HybridSearchParams,
) -> Result<Value, OperationError> {
    let metric: DistanceMetric = params.metric.parse().map_err(OperationError::InvalidArgument)?;
    tracing::info!(
        table = ?params.table_name,
        top_k = params.top_k,
        metric = %metric,
        "hybrid_search"
    );
    let outcome = state
        .search
        .hybrid_search(SearchRequest {
            query: &params.query,
            table_name: params.table_name.as_deref(),
            top_k: params.top_k,
            metric,
            filter_expr: params.filter_expr.as_deref(),
            distance_threshold: params.distance_threshold,
            auto_create: params.auto_create_table,
        })
        .await?;
    to_json(&outcome)
}

pub async fn optimize_table(
    state: &AppState,
    params: TableParams,
) -> Result<Value, OperationError> {
    tracing::info!(table = %params.table_name, "optimize_table");
    to_json(&state.maintenance.optimize(&params.table_name).await?)
}

pub async fn table_versions(
    state: &AppState,
    params: TableParams,
) -> Result<Value, OperationError> {
    tracing::info!(table = %params.table_name, "table_versions");
    to_json(&state.maintenance.versions(&params.table_name).await?)
}

pub async fn index_stats(state: &AppState, params: TableParams) -> Result<Value, OperationError> {
    tracing::info!(table = %params.table_name, "index_stats");
    to_json(&state.maintenance.index_stats(&params.table_name).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::state::test_support::state_in;

    async fn call(state: &AppState, name: &str, args: Value) -> Value {
        dispatch(state, name, args)
            .await
            .unwrap_or_else(|e| panic!("{name} failed: {e}"))
    }

    #[tokio::test]
    async fn test_create_twice_fails_with_already_exists() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let state = state_in(&dir).await;

        call(&state, "create_table", json!({"table_name": "notes"})).await;
        let err = dispatch(&state, "create_table", json!({"table_name": "notes"}))
            .await
            .unwrap_err();
        assert!(matches!(err, OperationError::TableAlreadyExists(_)));
        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn test_ingest_increases_row_count_by_document_count() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let state = state_in(&dir).await;

        let first = call(
            &state,
            "ingest_docs",
            json!({"docs": ["alpha", "beta", "gamma"], "table_name": "notes"}),
        )
        .await;
        assert_eq!(first["documents_added"], 3);
        assert_eq!(first["row_count"], 3);

        let second = call(
            &state,
            "ingest_docs",
            json!({"docs": "delta", "table_name": "notes"}),
        )
        .await;
        assert_eq!(second["row_count"], 4);
    }

    #[tokio::test]
    async fn test_table_count_matches_list_tables() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let state = state_in(&dir).await;

        for name in ["one", "two", "three"] {
            call(&state, "create_table", json!({"table_name": name})).await;
        }
        let listed = call(&state, "list_tables", Value::Null).await;
        let counted = call(&state, "table_count", json!({})).await;
        assert_eq!(listed["tables"].as_array().unwrap().len(), 3);
        assert_eq!(counted["count"], 3);
        assert_eq!(counted["message"], "Database contains 3 tables");
    }

    #[tokio::test]
    async fn test_delete_documents_removes_only_matches() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let state = state_in(&dir).await;

        call(
            &state,
            "create_table",
            json!({"table_name": "posts", "schema": {"doc": "str", "vector": "Vector", "topic": "str"}}),
        )
        .await;
        call(
            &state,
            "ingest_docs",
            json!({
                "table_name": "posts",
                "docs": ["a", "b", "c"],
                "auto_create_table": false,
                "metadata": [{"topic": "keep"}, {"topic": "drop"}, {"topic": "keep"}]
            }),
        )
        .await;

        let report = call(
            &state,
            "delete_documents",
            json!({"table_name": "posts", "filter_expr": "topic = 'drop'"}),
        )
        .await;
        assert_eq!(report["rows_deleted"], 1);
        assert_eq!(report["rows_remaining"], 2);

        let remaining = call(
            &state,
            "hybrid_search",
            json!({"query": "a", "table_name": "posts", "top_k": 10}),
        )
        .await;
        let mut survivors: Vec<(String, String)> = remaining["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|row| {
                (
                    row["doc"].as_str().unwrap().to_string(),
                    row["topic"].as_str().unwrap().to_string(),
                )
            })
            .collect();
        survivors.sort();
        assert_eq!(
            survivors,
            vec![
                ("a".to_string(), "keep".to_string()),
                ("c".to_string(), "keep".to_string()),
            ]
        );

        let err = dispatch(
            &state,
            "delete_documents",
            json!({"table_name": "posts", "filter_expr": "1=1"}),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, OperationError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_search_on_empty_table_returns_empty_list() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let state = state_in(&dir).await;

        call(&state, "create_table", json!({"table_name": "empty"})).await;
        let response = call(
            &state,
            "query_table",
            json!({"query": "anything", "table_name": "empty"}),
        )
        .await;
        assert_eq!(response["count"], 0);
        assert_eq!(response["results"], json!([]));

        let response = call(
            &state,
            "hybrid_search",
            json!({"query": "anything", "table_name": "empty", "metric": "euclidean"}),
        )
        .await;
        assert_eq!(response["metric"], "l2");
        assert_eq!(response["count"], 0);
    }

    #[tokio::test]
    async fn test_query_finds_ingested_document() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let state = state_in(&dir).await;

        call(
            &state,
            "ingest_docs",
            json!({"docs": ["the cat sat on the mat", "stock market report"]}),
        )
        .await;
        let response = call(&state, "query_table", json!({"query": "cat on a mat", "top_k": 1})).await;
        assert_eq!(response["count"], 1);
        assert_eq!(response["results"][0]["doc"], "the cat sat on the mat");

        let exists = call(&state, "query_table", json!({"query": "cat", "top_k": 0})).await;
        assert_eq!(exists["exists"], true);
    }

    #[tokio::test]
    async fn test_argument_errors() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let state = state_in(&dir).await;

        let err = dispatch(&state, "no_such_tool", json!({})).await.unwrap_err();
        assert!(err.to_string().contains("unknown tool"));

        let err = dispatch(&state, "delete_table", json!({})).await.unwrap_err();
        assert!(matches!(err, OperationError::InvalidArgument(_)));

        let err = dispatch(&state, "hybrid_search", json!({"query": "q", "metric": "hamming"}))
            .await
            .unwrap_err();
        assert!(matches!(err, OperationError::InvalidArgument(_)));

        let err = dispatch(&state, "table_details", json!({"table_name": "ghost"}))
            .await
            .unwrap_err();
        assert!(matches!(err, OperationError::TableNotFound(_)));
    }

    #[tokio::test]
    async fn test_maintenance_tools() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let state = state_in(&dir).await;

        call(&state, "ingest_docs", json!({"docs": ["x", "y"], "table_name": "kb"})).await;

        let versions = call(&state, "table_versions", json!({"table_name": "kb"})).await;
        assert!(versions["current_version"].as_u64().unwrap() >= 1);

        let optimized = call(&state, "optimize_table", json!({"table_name": "kb"})).await;
        assert_eq!(optimized["table_name"], "kb");

        let stats = call(&state, "index_stats", json!({"table_name": "kb"})).await;
        assert_eq!(stats["row_count"], 2);
    }
}
