//! MCP server exposing the LanceDB tools over stdio.

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router,
};

use super::params::{
    CreateTableParams, DeleteDocumentsParams, HybridSearchParams, IngestDocsParams,
    OptionalTableParams, QueryTableParams, TableParams, UpdateDocumentsParams,
};
use super::response::into_call_result;
use super::tools;
use crate::state::AppState;

/// Usage notes sent to the client on `initialize`.
pub const INSTRUCTIONS: &str = "\
LanceDB MCP server: vector tables, documents and semantic search.

1. Table Management:
   - 'create_table' creates a table sized to the embedding model. Optional schema, e.g.
     {\"table_name\": \"notes\", \"schema\": {\"doc\": \"str\", \"vector\": \"Vector\", \"category\": \"str\"}}
   - 'list_tables' lists tables with row counts; 'table_count' only counts them
   - 'table_details' shows the schema; 'table_stats' adds field categories and version
   - 'delete_table' removes a table and all of its rows

2. Document Management:
   - 'ingest_docs' embeds and stores one document or a list, with optional per-document metadata
   - 'update_documents' sets column values on rows matching a SQL filter (vectors are not recomputed)
   - 'delete_documents' removes rows matching a SQL filter
   - Example: {\"docs\": [\"Hello world\"], \"table_name\": \"notes\"}

3. Search Operations:
   - 'query_table' runs cosine similarity search; top_k = 0 only checks for any match
   - 'hybrid_search' adds a metric (cosine, dot, euclidean, l2) and a metadata filter;
     clauses like '_distance < 0.5' in the filter set a distance threshold
   - Example: {\"query\": \"Hello\", \"top_k\": 5, \"filter_expr\": \"category = 'news'\"}

4. Maintenance:
   - 'optimize_table' builds indices and compacts; 'table_versions' reports and prunes
     versions; 'index_stats' lists indices

Table names are stored in CamelCase ('my_docs' becomes 'MyDocs'); either form works in calls.";

#[derive(Clone)]
pub struct LanceDbMcpServer {
    state: AppState,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl LanceDbMcpServer {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Create a new table. The vector column is sized to the configured \
        embedding model. An optional schema maps field names to types and must include \
        'doc' and 'vector'.")]
    async fn create_table(
        &self,
        Parameters(params): Parameters<CreateTableParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(tools::create_table(&self.state, params).await))
    }

    #[tool(description = "List all tables with their row counts.")]
    async fn list_tables(&self) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(tools::list_tables(&self.state).await))
    }

    #[tool(description = "Count the tables in the database.")]
    async fn table_count(&self) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(tools::table_count(&self.state).await))
    }

    #[tool(description = "Show a table's row count and schema, including vector dimensions.")]
    async fn table_details(
        &self,
        Parameters(params): Parameters<OptionalTableParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(tools::table_details(&self.state, params).await))
    }

    #[tool(description = "Detailed table statistics: fields grouped into vector, text and \
        other categories, row count and current version.")]
    async fn table_stats(
        &self,
        Parameters(params): Parameters<OptionalTableParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(tools::table_stats(&self.state, params).await))
    }

    #[tool(description = "Delete a table and all of its rows.")]
    async fn delete_table(
        &self,
        Parameters(params): Parameters<TableParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(tools::delete_table(&self.state, params).await))
    }

    #[tool(description = "Embed and store documents. 'docs' is a string or a list of strings; \
        'metadata' is an optional list with one object per document. Creates the table \
        when missing unless auto_create_table is false.")]
    async fn ingest_docs(
        &self,
        Parameters(params): Parameters<IngestDocsParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(tools::ingest_docs(&self.state, params).await))
    }

    #[tool(description = "Set column values on every row matching a SQL filter expression. \
        The vector column cannot be updated and text changes are not re-embedded.")]
    async fn update_documents(
        &self,
        Parameters(params): Parameters<UpdateDocumentsParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(tools::update_documents(&self.state, params).await))
    }

    #[tool(description = "Delete every row matching a SQL filter expression. Filters that \
        match all rows are refused; use delete_table instead.")]
    async fn delete_documents(
        &self,
        Parameters(params): Parameters<DeleteDocumentsParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(tools::delete_documents(&self.state, params).await))
    }

    #[tool(description = "Semantic search: embed the query and return the top_k nearest \
        documents by cosine distance. top_k = 0 only reports whether anything matches.")]
    async fn query_table(
        &self,
        Parameters(params): Parameters<QueryTableParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(tools::query_table(&self.state, params).await))
    }

    #[tool(description = "Vector search with a selectable metric (cosine, dot, euclidean, l2) \
        and an optional SQL filter on metadata columns. Distance clauses such as \
        '_distance < 0.5' in the filter become a result threshold.")]
    async fn hybrid_search(
        &self,
        Parameters(params): Parameters<HybridSearchParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(tools::hybrid_search(&self.state, params).await))
    }

    #[tool(description = "Build scalar, full-text and vector indices where useful, then \
        compact the table. Reports each step as applied or skipped.")]
    async fn optimize_table(
        &self,
        Parameters(params): Parameters<TableParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(tools::optimize_table(&self.state, params).await))
    }

    #[tool(description = "Report a table's current version and retained versions, pruning \
        old versions when cleanup is enabled.")]
    async fn table_versions(
        &self,
        Parameters(params): Parameters<TableParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(tools::table_versions(&self.state, params).await))
    }

    #[tool(description = "List a table's indices with indexed and unindexed row counts.")]
    async fn index_stats(
        &self,
        Parameters(params): Parameters<TableParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(tools::index_stats(&self.state, params).await))
    }
}

#[tool_handler]
impl ServerHandler for LanceDbMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::tools::TOOL_NAMES;
    use crate::state::test_support::state_in;

    #[tokio::test]
    async fn test_every_tool_is_routed() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let server = LanceDbMcpServer::new(state_in(&dir).await);

        let mut routed: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        routed.sort();

        let mut expected: Vec<String> = TOOL_NAMES.iter().map(|s| s.to_string()).collect();
        expected.sort();
        assert_eq!(routed, expected);
    }

    #[tokio::test]
    async fn test_server_info_advertises_tools() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let server = LanceDbMcpServer::new(state_in(&dir).await);

        let info = server.get_info();
        assert!(info.capabilities.tools.is_some());
        let instructions = info.instructions.unwrap_or_default();
        assert!(instructions.contains("Table Management"));
        assert!(instructions.contains("Document Management"));
        assert!(instructions.contains("Search Operations"));
    }
}
