//! Semantic workout memory.
//!
//! liftlog stores structured workout activities and retrieves them by meaning.
//! Each activity is written to a relational store and, in the same
//! transaction, to a vector index that carries a denormalized copy of its
//! filterable metadata (owner, day, category). Searches embed the free-text
//! part of a query, run a nearest-neighbor scan constrained by those filters,
//! drop weak matches, then rank and group the survivors by date.
//!
//! # Architecture
//!
//! - **Storage**: SQLite for records and
//!   [sqlite-vec](https://github.com/asg017/sqlite-vec) for the vector index
//! - **Embeddings**: local ONNX Runtime with all-MiniLM-L6-v2 (384 dimensions),
//!   or a deterministic hashing embedder for tests and offline use
//! - **Ranking**: cosine similarity plus recency and exact-exercise boosts
//!
//! # Modules
//!
//! - [`activity`]: store, index, planner, ranker, and the log/search/delete pipelines
//! - [`config`]: configuration loading from TOML files and environment variables
//! - [`db`]: SQLite initialization, schema, migrations, and health checks
//! - [`embedding`]: the [`embedding::TextEmbedder`] abstraction and its implementations
//! - [`error`]: the library [`Error`] type
//! - [`service`]: async front with timeouts for concurrent callers

pub mod activity;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod service;

pub use error::{Error, Result};
