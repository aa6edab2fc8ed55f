//! Model Context Protocol surface: tool parameters, tool implementations,
//! result formatting and the rmcp server.

pub mod params;
pub mod response;
pub mod server;
pub mod tools;
