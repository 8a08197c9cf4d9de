//! Deterministic bag-of-words embedder.
//!
//! Each lower-cased alphanumeric token is hashed with BLAKE3 into one of
//! [`EMBEDDING_DIM`] buckets; the bucket counts are L2-normalized. Texts that
//! share most of their tokens score high cosine similarity, and identical
//! texts always produce identical vectors across runs and platforms.

use anyhow::Result;

use super::{l2_normalize, TextEmbedder, EMBEDDING_DIM};

pub const HASH_MODEL_ID: &str = "blake3-bow-384";

#[derive(Debug, Default, Clone)]
pub struct HashEmbedder;

impl HashEmbedder {
    pub fn new() -> Self {
        Self
    }
}

fn bucket(token: &str) -> usize {
    let digest = blake3::hash(token.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest.as_bytes()[..8]);
    (u64::from_le_bytes(prefix) % EMBEDDING_DIM as u64) as usize
}

impl TextEmbedder for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0.0f32; EMBEDDING_DIM];
        let lowered = text.to_lowercase();
        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            v[bucket(token)] += 1.0;
        }
        l2_normalize(&mut v);
        Ok(v)
    }

    fn model_id(&self) -> &str {
        HASH_MODEL_ID
    }
}
