//! FastEmbed-based local embedding generator.
//!
//! Implements the `Embedder` trait from `lancedb-mcp-core` using fastembed's
//! ONNX sentence-transformer models. Model inference is CPU-bound and
//! `TextEmbedding::embed` takes `&mut self`, so calls run on the blocking
//! pool behind a mutex.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use fastembed::{EmbeddingModel, ModelInfo, TextEmbedding, TextInitOptions};

use lancedb_mcp_core::embedding::embedder::Embedder;
use lancedb_mcp_types::error::OperationError;

/// Common sentence-transformer names mapped to their full-precision models.
const MODEL_ALIASES: &[(&str, EmbeddingModel)] = &[
    ("all-minilm-l6-v2", EmbeddingModel::AllMiniLML6V2),
    ("all-minilm-l12-v2", EmbeddingModel::AllMiniLML12V2),
    ("bge-small-en-v1.5", EmbeddingModel::BGESmallENV15),
    ("bge-base-en-v1.5", EmbeddingModel::BGEBaseENV15),
    ("bge-large-en-v1.5", EmbeddingModel::BGELargeENV15),
];

pub struct FastEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
    model_name: String,
    model_code: String,
    dimension: usize,
}

impl FastEmbedder {
    /// Load `model_name`, downloading it into `cache_dir` if needed.
    pub fn new(model_name: &str, cache_dir: Option<PathBuf>) -> Result<Self, OperationError> {
        let info = resolve_model(model_name)?;

        let mut options = TextInitOptions::new(info.model.clone()).with_show_download_progress(false);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(dir);
        }

        let model = TextEmbedding::try_new(options).map_err(|e| {
            OperationError::Embedding(format!("failed to load model '{model_name}': {e}"))
        })?;

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
            model_name: model_name.to_string(),
            model_code: info.model_code.clone(),
            dimension: info.dim,
        })
    }

    /// Upstream identifier of the loaded model, e.g. `Qdrant/all-MiniLM-L6-v2-onnx`.
    pub fn model_code(&self) -> &str {
        &self.model_code
    }
}

/// Find a supported model by alias, full code, or the last path segment of
/// its code (with any `-onnx` suffix dropped). Matching ignores case.
fn resolve_model(model_name: &str) -> Result<ModelInfo<EmbeddingModel>, OperationError> {
    let wanted = model_name.trim().to_ascii_lowercase();
    let supported = TextEmbedding::list_supported_models();

    let aliased = MODEL_ALIASES
        .iter()
        .find(|(alias, _)| *alias == wanted)
        .and_then(|(_, model)| supported.iter().find(|info| info.model == *model));

    let matched = aliased.or_else(|| {
        supported.iter().find(|info| {
            let code = info.model_code.to_ascii_lowercase();
            let short = code.rsplit('/').next().unwrap_or(&code);
            code == wanted || short == wanted || short.trim_end_matches("-onnx") == wanted
        })
    });

    matched.cloned().ok_or_else(|| {
        OperationError::Embedding(format!(
            "unsupported embedding model '{model_name}'; supported models: {}",
            supported
                .iter()
                .map(|info| info.model_code.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    })
}

impl Embedder for FastEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, OperationError> {
        let model = Arc::clone(&self.model);
        let texts = texts.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|_| OperationError::Embedding("embedding model lock poisoned".to_string()))?;
            model
                .embed(texts, None)
                .map_err(|e| OperationError::Embedding(format!("embedding failed: {e}")))
        })
        .await
        .map_err(|e| OperationError::Embedding(format!("embedding task failed: {e}")))?
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
