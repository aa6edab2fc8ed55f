//! Infrastructure layer for the LanceDB MCP server.
//!
//! Contains the LanceDB connection manager and the table, document, search,
//! and maintenance operations built on it, the embedding backends
//! implementing `lancedb_mcp_core::embedding::embedder::Embedder`, and the
//! configuration loader.

pub mod config;
pub mod embedding;
pub mod vector;
