//! Reconciliation sweep between the activity store and the vector index.
//!
//! Detects records without a vector and vectors without a record, then repairs
//! them: orphan vectors are dropped, unindexed records are re-embedded. Each
//! repair commits on its own, so one bad record does not block the rest.

use std::collections::HashSet;

use rusqlite::Connection;
use serde::Serialize;

use super::retrieval::embed_document;
use super::types::ActivityId;
use super::{index, store};
use crate::embedding::TextEmbedder;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Inconsistency {
    /// Record whose vector is missing or was never written.
    UnindexedActivity { id: ActivityId },
    /// Vector whose record no longer exists.
    OrphanVector { id: ActivityId },
}

impl Inconsistency {
    pub fn id(&self) -> &str {
        match self {
            Self::UnindexedActivity { id } | Self::OrphanVector { id } => id,
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct ReconcileReport {
    pub found: Vec<Inconsistency>,
    pub reindexed: usize,
    pub orphans_removed: usize,
    /// `(id, error)` for repairs that failed.
    pub failed: Vec<(ActivityId, String)>,
    pub dry_run: bool,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.found.is_empty()
    }
}

/// Compare the two stores. Results are sorted by id within each kind.
pub fn find_inconsistencies(conn: &Connection) -> Result<Vec<Inconsistency>> {
    let vector_ids: HashSet<ActivityId> = index::ids(conn)?.into_iter().collect();
    let records = store::index_refs(conn)?;
    let record_ids: HashSet<&str> = records.iter().map(|(id, _)| id.as_str()).collect();

    let mut unindexed: Vec<ActivityId> = records
        .iter()
        .filter(|(id, embedding_ref)| match embedding_ref {
            Some(r) => r != id || !vector_ids.contains(r),
            None => true,
        })
        .map(|(id, _)| id.clone())
        .collect();
    unindexed.sort();

    let mut orphans: Vec<ActivityId> = vector_ids
        .iter()
        .filter(|id| !record_ids.contains(id.as_str()))
        .cloned()
        .collect();
    orphans.sort();

    Ok(unindexed
        .into_iter()
        .map(|id| Inconsistency::UnindexedActivity { id })
        .chain(orphans.into_iter().map(|id| Inconsistency::OrphanVector { id }))
        .collect())
}

/// Find and, unless `dry_run`, repair every inconsistency.
pub fn reconcile(
    conn: &mut Connection,
    embedder: &dyn TextEmbedder,
    dry_run: bool,
) -> Result<ReconcileReport> {
    reconcile_with_progress(conn, embedder, dry_run, |_| {})
}

/// [`reconcile`] with a callback invoked after each repair attempt.
pub fn reconcile_with_progress(
    conn: &mut Connection,
    embedder: &dyn TextEmbedder,
    dry_run: bool,
    mut on_progress: impl FnMut(&Inconsistency),
) -> Result<ReconcileReport> {
    let found = find_inconsistencies(conn)?;
    let mut report = ReconcileReport {
        dry_run,
        ..Default::default()
    };

    if !found.is_empty() {
        tracing::warn!(count = found.len(), dry_run, "store and index are inconsistent");
    }

    if !dry_run {
        for item in &found {
            let outcome = match item {
                Inconsistency::OrphanVector { id } => {
                    remove_orphan(conn, id).map(|()| report.orphans_removed += 1)
                }
                Inconsistency::UnindexedActivity { id } => {
                    reindex(conn, embedder, id).map(|()| report.reindexed += 1)
                }
            };
            if let Err(e) = outcome {
                tracing::warn!(id = item.id(), error = %e, "repair failed");
                report.failed.push((item.id().to_string(), e.to_string()));
            }
            on_progress(item);
        }
    }

    tracing::info!(
        found = found.len(),
        reindexed = report.reindexed,
        orphans_removed = report.orphans_removed,
        failed = report.failed.len(),
        "reconciliation complete"
    );
    report.found = found;
    Ok(report)
}

fn remove_orphan(conn: &mut Connection, id: &str) -> Result<()> {
    let tx = conn.transaction()?;
    index::remove(&tx, id)?;
    store::write_audit_log(&tx, "remove_orphan", id, None)?;
    tx.commit()?;
    Ok(())
}

/// Re-embed one activity and replace its vector.
pub fn reindex(conn: &mut Connection, embedder: &dyn TextEmbedder, id: &str) -> Result<()> {
    let activity = store::get(conn, id)?;
    let vector = embed_document(embedder, &activity)?;

    let tx = conn.transaction()?;
    if index::contains(&tx, id)? {
        index::remove(&tx, id)?;
    }
    index::index(&tx, id, &vector, &activity.metadata())?;
    store::set_embedding_ref(&tx, id, Some(id))?;
    store::write_audit_log(
        &tx,
        "reindex",
        id,
        Some(&serde_json::json!({ "model": embedder.model_id() })),
    )?;
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::retrieval::log_activity;
    use crate::activity::types::{ParsedActivity, VectorMetadata, Category};
    use crate::db;
    use crate::embedding::hash::HashEmbedder;

    fn log(conn: &mut Connection, exercise: &str) -> ActivityId {
        let parsed = ParsedActivity::new(exercise, "2026-01-14".parse().unwrap());
        log_activity(conn, "u", &parsed, &HashEmbedder::new()).unwrap()
    }

    #[test]
    fn consistent_store_reports_nothing() {
        let mut conn = db::open_memory_database().unwrap();
        log(&mut conn, "squat");
        log(&mut conn, "bench press");
        assert!(find_inconsistencies(&conn).unwrap().is_empty());
    }

    #[test]
    fn detects_and_repairs_both_kinds() {
        let mut conn = db::open_memory_database().unwrap();
        let unindexed = log(&mut conn, "squat");
        conn.execute("DELETE FROM activities_vec WHERE id = ?1", [&unindexed])
            .unwrap();

        let mut orphan_vec = vec![0.0f32; crate::embedding::EMBEDDING_DIM];
        orphan_vec[0] = 1.0;
        index::index(
            &conn,
            "ghost",
            &orphan_vec,
            &VectorMetadata {
                owner_id: "u".into(),
                performed_on: "2026-01-10".parse().unwrap(),
                category: Category::Other,
            },
        )
        .unwrap();

        let found = find_inconsistencies(&conn).unwrap();
        assert_eq!(
            found,
            vec![
                Inconsistency::UnindexedActivity { id: unindexed.clone() },
                Inconsistency::OrphanVector { id: "ghost".into() },
            ]
        );

        let dry = reconcile(&mut conn, &HashEmbedder::new(), true).unwrap();
        assert_eq!(dry.found.len(), 2);
        assert_eq!(dry.reindexed, 0);
        assert_eq!(find_inconsistencies(&conn).unwrap().len(), 2);

        let report = reconcile(&mut conn, &HashEmbedder::new(), false).unwrap();
        assert_eq!(report.reindexed, 1);
        assert_eq!(report.orphans_removed, 1);
        assert!(report.failed.is_empty());
        assert!(find_inconsistencies(&conn).unwrap().is_empty());
        assert!(index::contains(&conn, &unindexed).unwrap());
        assert!(!index::contains(&conn, "ghost").unwrap());
    }

    #[test]
    fn null_embedding_ref_is_unindexed() {
        let mut conn = db::open_memory_database().unwrap();
        let id = log(&mut conn, "deadlift");
        store::set_embedding_ref(&conn, &id, None).unwrap();

        let found = find_inconsistencies(&conn).unwrap();
        assert_eq!(found, vec![Inconsistency::UnindexedActivity { id: id.clone() }]);

        reconcile(&mut conn, &HashEmbedder::new(), false).unwrap();
        assert_eq!(
            store::get(&conn, &id).unwrap().embedding_ref.as_deref(),
            Some(id.as_str())
        );
        assert_eq!(index::count(&conn).unwrap(), 1);
    }
}
