//! Request validation logic and the embedding port for the LanceDB MCP server.
//!
//! This crate holds everything that can be decided without touching the
//! database: table-name sanitization, user schema parsing, filter analysis,
//! and the `Embedder` trait the infrastructure layer implements. It depends
//! only on `lancedb-mcp-types` -- never on `lancedb-mcp-infra` or LanceDB.

pub mod embedding;
pub mod query;
pub mod table;
