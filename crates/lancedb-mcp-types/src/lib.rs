//! Shared domain types for the LanceDB MCP server.
//!
//! Tables, documents, search results, configuration, and the error type
//! every operation returns.
//!
//! Zero infrastructure dependencies -- only serde and thiserror.

pub mod config;
pub mod document;
pub mod error;
pub mod search;
pub mod table;
