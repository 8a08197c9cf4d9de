//! Retrieval core: store, index, planner, ranker and the pipelines built on them.

pub mod category;
pub mod index;
pub mod planner;
pub mod ranker;
pub mod reconcile;
pub mod retrieval;
pub mod stats;
pub mod store;
pub mod types;

/// View an f32 slice as raw bytes for sqlite-vec.
pub fn embedding_to_bytes(embedding: &[f32]) -> &[u8] {
    unsafe {
        std::slice::from_raw_parts(
            embedding.as_ptr() as *const u8,
            std::mem::size_of_val(embedding),
        )
    }
}

/// Decode a sqlite-vec float32 blob.
pub fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
