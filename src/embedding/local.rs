//! ONNX Runtime embedder for all-MiniLM-L6-v2.
//!
//! Tokenize → run the transformer → attention-masked mean pooling → L2 normalize.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;

use super::{l2_normalize, TextEmbedder, EMBEDDING_DIM};
use crate::config::EmbeddingConfig;

/// all-MiniLM-L6-v2 was trained on 256-token sequences.
const MAX_SEQ_LEN: usize = 256;

pub struct OnnxEmbedder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    model_id: String,
}

// Safety: Tokenizer is Send+Sync and the Session is only reached through the Mutex.
unsafe impl Send for OnnxEmbedder {}
unsafe impl Sync for OnnxEmbedder {}

/// Token ids and attention mask for a padded batch, flattened row-major.
struct EncodedBatch {
    input_ids: Vec<i64>,
    attention_mask: Vec<i64>,
    batch_size: usize,
    seq_len: usize,
}

/// Paths of the model and tokenizer inside the configured cache directory.
pub fn model_files(config: &EmbeddingConfig) -> (PathBuf, PathBuf) {
    let cache_dir = crate::config::expand_tilde(&config.cache_dir);
    (cache_dir.join("model.onnx"), cache_dir.join("tokenizer.json"))
}

impl OnnxEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let (model_path, tokenizer_path) = model_files(config);

        anyhow::ensure!(
            model_path.exists(),
            "ONNX model not found at {}. Run `liftlog model download` first.",
            model_path.display()
        );
        anyhow::ensure!(
            tokenizer_path.exists(),
            "Tokenizer not found at {}. Run `liftlog model download` first.",
            tokenizer_path.display()
        );

        let session = Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(&model_path)
            .context("failed to load ONNX model")?;
        tracing::info!(model = %model_path.display(), "ONNX model loaded");

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("failed to load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_SEQ_LEN,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("failed to set truncation: {e}"))?;
        tokenizer.with_padding(Some(tokenizers::PaddingParams {
            strategy: tokenizers::PaddingStrategy::BatchLongest,
            ..Default::default()
        }));

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            model_id: config.model.clone(),
        })
    }

    fn encode(&self, texts: &[&str]) -> Result<EncodedBatch> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("tokenization failed: {e}"))?;

        let batch_size = encodings.len();
        let seq_len = encodings.first().map(|e| e.get_ids().len()).unwrap_or(0);
        let mut input_ids = Vec::with_capacity(batch_size * seq_len);
        let mut attention_mask = Vec::with_capacity(batch_size * seq_len);
        for encoding in &encodings {
            input_ids.extend(encoding.get_ids().iter().map(|&id| id as i64));
            attention_mask.extend(encoding.get_attention_mask().iter().map(|&m| m as i64));
        }

        Ok(EncodedBatch {
            input_ids,
            attention_mask,
            batch_size,
            seq_len,
        })
    }
}

/// Average the token embeddings of each row, weighting padding tokens by zero.
fn mean_pool(
    token_embeddings: &[f32],
    attention_mask: &[i64],
    batch_size: usize,
    seq_len: usize,
    hidden_dim: usize,
) -> Vec<Vec<f32>> {
    (0..batch_size)
        .map(|b| {
            let mut pooled = vec![0.0f32; hidden_dim];
            let mut count = 0.0f32;
            for s in 0..seq_len {
                if attention_mask[b * seq_len + s] == 0 {
                    continue;
                }
                let offset = (b * seq_len + s) * hidden_dim;
                for (d, acc) in pooled.iter_mut().enumerate() {
                    *acc += token_embeddings[offset + d];
                }
                count += 1.0;
            }
            if count > 0.0 {
                pooled.iter_mut().for_each(|x| *x /= count);
            }
            l2_normalize(&mut pooled);
            pooled
        })
        .collect()
}

impl TextEmbedder for OnnxEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .pop()
            .context("embedding batch returned no rows")
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let batch = self.encode(texts)?;
        let shape = vec![batch.batch_size as i64, batch.seq_len as i64];
        let input_ids = Tensor::from_array((shape.clone(), batch.input_ids.into_boxed_slice()))?;
        let attention_mask =
            Tensor::from_array((shape.clone(), batch.attention_mask.clone().into_boxed_slice()))?;
        // single-segment input
        let token_type_ids = Tensor::from_array((
            shape,
            vec![0i64; batch.batch_size * batch.seq_len].into_boxed_slice(),
        ))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("session lock poisoned: {e}"))?;
        let outputs = session.run(ort::inputs! {
            "input_ids" => input_ids,
            "attention_mask" => attention_mask,
            "token_type_ids" => token_type_ids,
        })?;

        // Output naming differs between exports
        let hidden = outputs
            .get("token_embeddings")
            .or_else(|| outputs.get("last_hidden_state"))
            .unwrap_or_else(|| &outputs[0]);
        let (dims, data) = hidden
            .try_extract_tensor::<f32>()
            .context("failed to extract token embeddings")?;

        let dims: &[i64] = &dims;
        anyhow::ensure!(
            dims.len() == 3 && dims[2] == EMBEDDING_DIM as i64,
            "unexpected token embedding shape {dims:?}, expected [batch, seq, {EMBEDDING_DIM}]"
        );

        Ok(mean_pool(
            data,
            &batch.attention_mask,
            batch.batch_size,
            dims[1] as usize,
            dims[2] as usize,
        ))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
