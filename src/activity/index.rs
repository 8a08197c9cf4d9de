//! Vector index over activity embeddings.
//!
//! Backed by the sqlite-vec `activities_vec` table. Owner, day and category are
//! vec0 metadata columns, so filter constraints are evaluated inside the KNN
//! scan: `search` returns up to `k` vectors that satisfy the filter rather than
//! `k` raw neighbors trimmed afterwards.

use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use serde::Serialize;

use super::types::{epoch_day, from_epoch_day, ActivityId, MetadataFilter, VectorMetadata};
use super::{bytes_to_embedding, embedding_to_bytes};
use crate::embedding::EMBEDDING_DIM;
use crate::error::{Error, Result};

/// Largest `k` a vec0 KNN query accepts.
pub const MAX_K: usize = 4096;

/// One nearest-neighbor match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexHit {
    pub id: ActivityId,
    /// Cosine similarity to the query vector, clamped to `[0, 1]`.
    pub similarity: f64,
    pub performed_on: NaiveDate,
}

/// Cosine similarity in `[-1, 1]`; `0.0` when either vector is zero.
///
/// Symmetric, and exactly `1.0` for identical non-zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b).sqrt()).clamp(-1.0, 1.0)
}

fn check_vector(vector: &[f32]) -> Result<()> {
    if vector.len() != EMBEDDING_DIM {
        return Err(Error::validation(format!(
            "vector has {} dimensions, expected {EMBEDDING_DIM}",
            vector.len()
        )));
    }
    if vector.iter().any(|x| !x.is_finite()) {
        return Err(Error::validation("vector contains non-finite values"));
    }
    if vector.iter().all(|x| *x == 0.0) {
        return Err(Error::validation("vector is all zeros"));
    }
    Ok(())
}

/// Add the vector for `id` with its filter metadata.
pub fn index(conn: &Connection, id: &str, vector: &[f32], meta: &VectorMetadata) -> Result<()> {
    check_vector(vector)?;
    if contains(conn, id)? {
        return Err(Error::validation(format!("activity {id} is already indexed")));
    }
    conn.execute(
        "INSERT INTO activities_vec (id, embedding, owner_id, performed_day, category) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            id,
            embedding_to_bytes(vector),
            meta.owner_id,
            epoch_day(meta.performed_on),
            meta.category.as_str(),
        ],
    )?;
    tracing::debug!(id, "vector indexed");
    Ok(())
}

/// Remove the vector for `id`.
pub fn remove(conn: &Connection, id: &str) -> Result<()> {
    if !contains(conn, id)? {
        return Err(Error::not_found("vector", id));
    }
    conn.execute("DELETE FROM activities_vec WHERE id = ?1", params![id])?;
    tracing::debug!(id, "vector removed");
    Ok(())
}

pub fn contains(conn: &Connection, id: &str) -> Result<bool> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM activities_vec WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    Ok(n > 0)
}

pub fn count(conn: &Connection) -> Result<u64> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM activities_vec", [], |row| row.get(0))?;
    Ok(n as u64)
}

/// Every indexed id. Full scan; used by reconciliation.
pub fn ids(conn: &Connection) -> Result<Vec<ActivityId>> {
    let mut stmt = conn.prepare("SELECT id FROM activities_vec")?;
    let ids = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

/// Filtered KNN search.
///
/// Returns at most `k` hits satisfying `filter`, ordered by similarity
/// descending, then most recent day, then id.
pub fn search(
    conn: &Connection,
    query: &[f32],
    k: usize,
    filter: &MetadataFilter,
) -> Result<Vec<IndexHit>> {
    check_vector(query)?;
    let k = k.min(MAX_K);
    if k == 0 {
        return Ok(Vec::new());
    }

    let mut sql = String::from(
        "SELECT id, embedding, performed_day FROM activities_vec \
         WHERE embedding MATCH ?1 AND k = ?2",
    );
    let mut values: Vec<Value> = vec![
        Value::Blob(embedding_to_bytes(query).to_vec()),
        Value::Integer(k as i64),
    ];
    if let Some(owner) = &filter.owner_id {
        values.push(Value::Text(owner.clone()));
        sql.push_str(&format!(" AND owner_id = ?{}", values.len()));
    }
    if let Some(range) = &filter.time_range {
        values.push(Value::Integer(epoch_day(range.start())));
        sql.push_str(&format!(" AND performed_day >= ?{}", values.len()));
        values.push(Value::Integer(epoch_day(range.end())));
        sql.push_str(&format!(" AND performed_day < ?{}", values.len()));
    }
    if let Some(category) = filter.category {
        values.push(Value::Text(category.as_str().to_string()));
        sql.push_str(&format!(" AND category = ?{}", values.len()));
    }
    sql.push_str(" ORDER BY distance");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(values.iter()), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Vec<u8>>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut hits = Vec::with_capacity(rows.len());
    for (id, blob, day) in rows {
        let performed_on = from_epoch_day(day).ok_or_else(|| {
            Error::IndexInconsistency(format!("vector {id} has invalid day {day}"))
        })?;
        let similarity = cosine_similarity(query, &bytes_to_embedding(&blob)).clamp(0.0, 1.0);
        hits.push(IndexHit {
            id,
            similarity,
            performed_on,
        });
    }

    hits.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then_with(|| b.performed_on.cmp(&a.performed_on))
            .then_with(|| a.id.cmp(&b.id))
    });

    tracing::debug!(k, hits = hits.len(), "vector search complete");
    Ok(hits)
}
