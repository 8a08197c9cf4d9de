//! Text-to-vector embedding collaborators.
//!
//! The retrieval core only sees [`TextEmbedder`]. Two implementations exist:
//! [`local::OnnxEmbedder`] runs all-MiniLM-L6-v2 through ONNX Runtime, and
//! [`hash::HashEmbedder`] is a deterministic token-hashing embedder used by the
//! test suite and for offline runs. Both emit L2-normalized vectors of
//! [`EMBEDDING_DIM`] dimensions.

pub mod hash;
pub mod local;

use anyhow::Result;

/// Number of dimensions in every stored and query vector.
pub const EMBEDDING_DIM: usize = 384;

/// Black-box `embed(text) -> vector[D]`.
///
/// Calls are synchronous and may be CPU-heavy; async callers should use
/// `tokio::task::spawn_blocking`.
pub trait TextEmbedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Identifier recorded in `schema_meta` so a model change can be detected.
    fn model_id(&self) -> &str;

    fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }
}

/// Create an embedder from config. Supported providers: `local`, `hash`.
pub fn create_embedder(config: &crate::config::EmbeddingConfig) -> Result<Box<dyn TextEmbedder>> {
    match config.provider.as_str() {
        "local" => Ok(Box::new(local::OnnxEmbedder::new(config)?)),
        "hash" => Ok(Box::new(hash::HashEmbedder::new())),
        other => anyhow::bail!("unknown embedding provider: {other}. Supported: local, hash"),
    }
}

/// L2-normalize a vector in place. A zero vector is left unchanged.
pub(crate) fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}
