//! Log, search and delete pipelines.
//!
//! Every write touches both the `activities` table and the `activities_vec`
//! index inside one SQLite transaction, so a record and its vector are
//! committed or rolled back together.

use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use serde::Serialize;

use super::category::derive_category;
use super::index;
use super::planner::{self, PlannedQuery};
use super::ranker::{self, Candidate};
use super::store;
use super::types::{Activity, ActivityId, DateGroup, ParsedActivity, QueryIntent};
use crate::config::{RankingWeights, RetrievalConfig};
use crate::db::migrations;
use crate::embedding::TextEmbedder;
use crate::error::{Error, Result};

/// Search output: ranked results grouped by workout date.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    /// The text that was embedded, or empty for a filter-only search.
    pub query: String,
    pub groups: Vec<DateGroup>,
    /// Results above threshold before truncation to `max_results`.
    pub total_results: usize,
    /// Index hits whose activity record is missing or no longer matches the filter.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inconsistent_ids: Vec<ActivityId>,
}

impl SearchOutcome {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Ranked results in output order.
    pub fn results(&self) -> impl Iterator<Item = &super::types::RankedResult> {
        self.groups.iter().flat_map(|g| g.results.iter())
    }
}

/// Text embedded for an activity: exercise, category and notes.
///
/// Metrics and dates stay out of the vector; they are structured filters.
pub fn document_text(activity: &Activity) -> String {
    let mut text = format!(
        "{} {}",
        activity.exercise,
        activity.category.as_str().replace('_', " ")
    );
    if let Some(notes) = activity.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        text.push(' ');
        text.push_str(notes);
    }
    text
}

/// Validate a parsed activity and build the record to commit.
pub fn build_activity(owner_id: &str, parsed: &ParsedActivity) -> Result<Activity> {
    if owner_id.trim().is_empty() {
        return Err(Error::validation("owner id must not be empty"));
    }
    parsed.validate()?;

    let exercise = parsed.normalized_exercise();
    Ok(Activity {
        id: uuid::Uuid::now_v7().to_string(),
        owner_id: owner_id.to_string(),
        category: derive_category(&exercise),
        exercise,
        sets: parsed.sets,
        reps: parsed.reps,
        weight: parsed.weight,
        unit: parsed.weight_unit(),
        duration_minutes: parsed.duration,
        notes: parsed
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string),
        performed_on: parsed.date,
        created_at: Utc::now(),
        embedding_ref: None,
    })
}

/// Embed an activity's [`document_text`].
pub fn embed_document(embedder: &dyn TextEmbedder, activity: &Activity) -> Result<Vec<f32>> {
    embedder
        .embed(&document_text(activity))
        .map_err(|e| Error::Embedding(e.to_string()))
}

/// Validate, embed and commit a new activity.
pub fn log_activity(
    conn: &mut Connection,
    owner_id: &str,
    parsed: &ParsedActivity,
    embedder: &dyn TextEmbedder,
) -> Result<ActivityId> {
    let activity = build_activity(owner_id, parsed)?;
    let vector = embed_document(embedder, &activity)?;
    commit_activity(conn, activity, &vector, embedder.model_id())
}

/// Store the record and its vector in one transaction.
///
/// `activity.id` is kept as given, so imports preserve identity. `model_id`
/// names the embedder that produced `vector`; the first commit records it as
/// the database's embedding model.
pub fn commit_activity(
    conn: &mut Connection,
    mut activity: Activity,
    vector: &[f32],
    model_id: &str,
) -> Result<ActivityId> {
    activity.embedding_ref = Some(activity.id.clone());

    let tx = conn.transaction()?;
    let id = store::put(&tx, &activity)?;
    index::index(&tx, &id, vector, &activity.metadata())?;
    migrations::record_embedding_model(&tx, model_id)?;
    store::write_audit_log(
        &tx,
        "create",
        &id,
        Some(&serde_json::json!({
            "exercise": activity.exercise,
            "performed_on": store::format_date(activity.performed_on),
        })),
    )?;
    tx.commit()?;

    tracing::info!(
        id = %id,
        owner = %activity.owner_id,
        exercise = %activity.exercise,
        category = %activity.category,
        "activity logged"
    );
    Ok(id)
}

/// Plan and execute a search.
pub fn search(
    conn: &Connection,
    intent: &QueryIntent,
    embedder: &dyn TextEmbedder,
    config: &RetrievalConfig,
    weights: &RankingWeights,
    today: NaiveDate,
) -> Result<SearchOutcome> {
    let plan = planner::plan(intent, embedder, config)?;
    execute(conn, &plan, config, weights, today)
}

/// Run a planned query against the index or, for filter-only plans, the store.
pub fn execute(
    conn: &Connection,
    plan: &PlannedQuery,
    config: &RetrievalConfig,
    weights: &RankingWeights,
    today: NaiveDate,
) -> Result<SearchOutcome> {
    let mut inconsistent_ids = Vec::new();

    let candidates: Vec<Candidate> = match &plan.vector_query {
        Some(vector) => {
            let hits = index::search(conn, vector, plan.k, &plan.filter)?;
            let considered = hits.len();
            let hits: Vec<_> = hits
                .into_iter()
                .filter(|h| h.similarity >= plan.similarity_threshold)
                .collect();
            tracing::debug!(
                considered,
                above_threshold = hits.len(),
                threshold = plan.similarity_threshold,
                "vector candidates"
            );

            let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
            let mut records = store::get_many(conn, &ids)?;
            let mut candidates = Vec::with_capacity(hits.len());
            for hit in hits {
                match records.remove(&hit.id) {
                    Some(activity) if plan.filter.matches(&activity.metadata()) => {
                        candidates.push(Candidate {
                            activity,
                            similarity: hit.similarity,
                        })
                    }
                    Some(_) => {
                        tracing::error!(
                            id = %hit.id,
                            "index inconsistency: vector metadata disagrees with its record; run `liftlog re-embed`"
                        );
                        inconsistent_ids.push(hit.id);
                    }
                    None => {
                        tracing::error!(
                            id = %hit.id,
                            "index inconsistency: vector has no activity record; run `liftlog reconcile`"
                        );
                        inconsistent_ids.push(hit.id);
                    }
                }
            }
            candidates
        }
        None => store::scan(conn, &plan.filter, Some(plan.k))?
            .into_iter()
            .map(|activity| Candidate {
                activity,
                similarity: 1.0,
            })
            .collect(),
    };

    let mut ranked = ranker::rank(&candidates, plan.exercise.as_deref(), today, weights);
    let total_results = ranked.len();
    ranked.truncate(config.max_results);
    let groups = ranker::group_by_date(ranked);

    tracing::info!(
        query = plan.query_text.as_deref().unwrap_or(""),
        filter_only = plan.is_filter_only(),
        total_results,
        groups = groups.len(),
        "search complete"
    );

    Ok(SearchOutcome {
        query: plan.query_text.clone().unwrap_or_default(),
        groups,
        total_results,
        inconsistent_ids,
    })
}

/// Remove an activity and its vector in one transaction.
pub fn delete_activity(conn: &mut Connection, id: &str) -> Result<()> {
    let tx = conn.transaction()?;
    let activity = store::get(&tx, id)?;

    let had_vector = index::contains(&tx, id)?;
    if had_vector {
        index::remove(&tx, id)?;
    } else {
        tracing::warn!(id, "deleting activity that had no vector");
    }
    store::delete(&tx, id)?;
    store::write_audit_log(
        &tx,
        "delete",
        id,
        Some(&serde_json::json!({
            "exercise": activity.exercise,
            "had_vector": had_vector,
        })),
    )?;
    tx.commit()?;

    tracing::info!(id, "activity deleted");
    Ok(())
}
