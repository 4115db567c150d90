//! C6 Embedding Engine: local, network-free text embedding via `fastembed`.

use astdb_domain::error::{Error, Result};
use astdb_domain::ports::embedding_provider::EmbeddingProvider;
use astdb_domain::value_objects::VectorSpace;
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tokio::sync::Mutex;

/// Default model id: small, CPU-friendly, and widely cached by
/// `fastembed`'s model zoo.
pub const DEFAULT_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Known model ids this provider can load, each with `fastembed`'s fixed
/// output dimension for that model.
const KNOWN_MODELS: &[(&str, EmbeddingModel, usize)] = &[
    ("sentence-transformers/all-MiniLM-L6-v2", EmbeddingModel::AllMiniLML6V2, 384),
    ("sentence-transformers/all-MiniLM-L12-v2", EmbeddingModel::AllMiniLML12V2, 384),
    ("BAAI/bge-small-en-v1.5", EmbeddingModel::BGESmallENV15, 384),
    ("BAAI/bge-base-en-v1.5", EmbeddingModel::BGEBaseENV15, 768),
    ("BAAI/bge-large-en-v1.5", EmbeddingModel::BGELargeENV15, 1024),
    ("intfloat/multilingual-e5-small", EmbeddingModel::MultilingualE5Small, 384),
    ("intfloat/multilingual-e5-base", EmbeddingModel::MultilingualE5Base, 768),
    ("intfloat/multilingual-e5-large", EmbeddingModel::MultilingualE5Large, 1024),
    ("mixedbread-ai/mxbai-embed-large-v1", EmbeddingModel::MxbaiEmbedLargeV1, 1024),
    ("nomic-ai/nomic-embed-text-v1.5", EmbeddingModel::NomicEmbedTextV15, 768),
];

/// Resolve a configured model id to its `fastembed` model and fixed
/// output dimension, per spec §4.C6 ("unknown model IDs fail with
/// `embedding` error kind and a suggestion listing available models").
fn resolve_model(model_id: &str) -> Result<(EmbeddingModel, usize)> {
    KNOWN_MODELS
        .iter()
        .find(|(id, _, _)| *id == model_id)
        .map(|(_, model, dimension)| (*model, *dimension))
        .ok_or_else(|| {
            let available = KNOWN_MODELS.iter().map(|(id, _, _)| *id).collect::<Vec<_>>().join(", ");
            Error::embedding(format!("unknown embedding model id: {model_id}"))
                .with_context("model_id", model_id)
                .with_suggestion(format!("available models: {available}"))
        })
}

/// [`EmbeddingProvider`] backed by a locally loaded `fastembed` model.
///
/// `fastembed` itself is not `Sync`-safe across concurrent `embed` calls, so
/// access is serialized behind a mutex; batching happens inside each call
/// rather than across callers.
pub struct FastEmbedProvider {
    model: Mutex<TextEmbedding>,
    model_id: String,
    dimension: usize,
    space: VectorSpace,
}

impl FastEmbedProvider {
    /// Load the embedding model identified by `model_id`, rejecting any id
    /// not in [`KNOWN_MODELS`] with an `embedding` error suggesting the
    /// available ones. Use [`DEFAULT_MODEL_ID`] for the default model.
    pub fn new(model_id: &str, space: VectorSpace) -> Result<Self> {
        let (model, dimension) = resolve_model(model_id)?;
        let options = InitOptions::new(model).with_show_download_progress(false);
        let model = TextEmbedding::try_new(options)
            .map_err(|e| Error::embedding(format!("failed to load embedding model: {e}")))?;
        Ok(Self {
            model: Mutex::new(model),
            model_id: model_id.to_string(),
            dimension,
            space,
        })
    }
}

fn l2_normalize(vector: Vec<f32>) -> Vec<f32> {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return vector;
    }
    vector.into_iter().map(|v| v / norm).collect()
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn encode(&self, texts: &[String], max_batch: usize) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let max_batch = max_batch.max(1);
        let mut output = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(max_batch) {
            let owned: Vec<String> = chunk.to_vec();
            let space = self.space;
            let vectors = {
                let mut model = self.model.lock().await;
                model
                    .embed(owned, None)
                    .map_err(|e| Error::embedding(format!("embedding batch failed: {e}")))?
            };
            for vector in vectors {
                let vector = if space == VectorSpace::Cosine {
                    l2_normalize(vector)
                } else {
                    vector
                };
                if vector.len() != self.dimension {
                    return Err(Error::embedding(format!(
                        "model {} returned dimension {}, expected {}",
                        self.model_id,
                        vector.len(),
                        self.dimension
                    )));
                }
                output.push(vector);
            }
        }

        Ok(output)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
