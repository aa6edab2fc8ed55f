//! Conversion of tool outcomes into MCP `CallToolResult`s.
//!
//! Success payloads are pretty-printed JSON text. Failures are tool errors
//! (`is_error = true`) carrying a small JSON object:
//! ```json
//! { "error": { "kind": "not_found", "message": "table 'x' does not exist" } }
//! ```
//! Protocol-level errors are never used for operation failures, so the
//! calling model always gets a readable message back.

use rmcp::model::{CallToolResult, Content};
use serde_json::{Value, json};

use lancedb_mcp_types::error::OperationError;

/// JSON body for a failed tool call.
pub fn error_body(err: &OperationError) -> Value {
    json!({
        "error": {
            "kind": err.kind().to_string(),
            "message": err.to_string(),
        }
    })
}

pub fn into_call_result(outcome: Result<Value, OperationError>) -> CallToolResult {
    match outcome {
        Ok(value) => CallToolResult::success(vec![Content::text(pretty(&value))]),
        Err(err) => {
            tracing::warn!(kind = %err.kind(), error = %err, "Tool call failed");
            CallToolResult::error(vec![Content::text(pretty(&error_body(&err)))])
        }
    }
}

/// Pretty JSON; falls back to compact output if pretty-printing fails.
pub fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
