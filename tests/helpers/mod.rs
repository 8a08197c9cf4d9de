#![allow(dead_code)]

use chrono::NaiveDate;
use liftlog::activity::retrieval::{self, SearchOutcome};
use liftlog::activity::types::{ActivityId, ParsedActivity, QueryIntent};
use liftlog::config::{RankingWeights, RetrievalConfig};
use liftlog::db;
use liftlog::embedding::hash::HashEmbedder;
use liftlog::embedding::EMBEDDING_DIM;
use rusqlite::Connection;

pub const OWNER: &str = "athlete";

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    db::open_memory_database().unwrap()
}

pub fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

/// Reference date for recency scoring in tests.
pub fn today() -> NaiveDate {
    d("2026-01-22")
}

/// Deterministic 384-dim unit vector with a spike at position `seed`.
pub fn test_embedding(seed: u16) -> Vec<f32> {
    let mut v = vec![0.0f32; EMBEDDING_DIM];
    v[seed as usize % EMBEDDING_DIM] = 1.0;
    v
}

/// Log an activity through the full write path with the hashing embedder.
pub fn log(conn: &mut Connection, parsed: ParsedActivity) -> ActivityId {
    retrieval::log_activity(conn, OWNER, &parsed, &HashEmbedder::new()).unwrap()
}

pub fn log_simple(conn: &mut Connection, exercise: &str, day: &str) -> ActivityId {
    log(conn, ParsedActivity::new(exercise, d(day)))
}

/// Search with default settings, anchored at [`today`].
pub fn search(conn: &Connection, intent: &QueryIntent) -> SearchOutcome {
    retrieval::search(
        conn,
        intent,
        &HashEmbedder::new(),
        &RetrievalConfig::default(),
        &RankingWeights::default(),
        today(),
    )
    .unwrap()
}

/// Ids in output order.
pub fn result_ids(outcome: &SearchOutcome) -> Vec<String> {
    outcome.results().map(|r| r.activity.id.clone()).collect()
}
