//! Text-to-vector embedding abstraction.

pub mod box_embedder;
pub mod embedder;
