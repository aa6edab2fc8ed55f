//! Filter expression analysis and update value rendering.
//!
//! LanceDB evaluates filters itself; this module only does the checks and
//! rewrites that have to happen before a filter reaches the database.

pub mod filter;
pub mod literal;
