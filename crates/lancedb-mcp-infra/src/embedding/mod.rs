//! Embedding backends implementing `lancedb_mcp_core::embedding::embedder::Embedder`.

pub mod fastembed;
pub mod hashing;

use std::path::PathBuf;

use lancedb_mcp_core::embedding::box_embedder::BoxEmbedder;
use lancedb_mcp_core::embedding::embedder::Embedder;
use lancedb_mcp_types::config::{EmbeddingFunction, ServerConfig};
use lancedb_mcp_types::error::OperationError;

use self::fastembed::FastEmbedder;
use self::hashing::{HashingEmbedder, HASHING_DIMENSION};

/// Build the embedder selected by `config.embedding_function`.
///
/// Loading a fastembed model may download it on first use, so this is called
/// once at startup and the result shared.
pub fn build_embedder(config: &ServerConfig) -> Result<BoxEmbedder, OperationError> {
    match config.embedding_function {
        EmbeddingFunction::Fastembed => {
            let cache_dir = config.model_cache_dir.as_deref().map(PathBuf::from);
            let embedder = FastEmbedder::new(&config.model_name, cache_dir)?;
            tracing::info!(
                model = embedder.model_code(),
                dimension = embedder.dimension(),
                "Embedding model loaded"
            );
            Ok(BoxEmbedder::new(embedder))
        }
        EmbeddingFunction::Hashing => {
            tracing::info!(dimension = HASHING_DIMENSION, "Using hashing embedder");
            Ok(BoxEmbedder::new(HashingEmbedder::new(HASHING_DIMENSION)))
        }
    }
}
