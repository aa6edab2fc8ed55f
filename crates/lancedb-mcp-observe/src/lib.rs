//! Logging setup for the LanceDB MCP server.

pub mod tracing_setup;
