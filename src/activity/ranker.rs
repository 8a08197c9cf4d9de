//! Scoring and ordering of search candidates.
//!
//! `score = w_sim·similarity + w_recency·max(0, 1 − age/horizon) + w_exact·[exercise matches]`
//!
//! Pure: identical inputs always yield identical output, so searches are
//! reproducible.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::types::{Activity, DateGroup, RankedResult};
use crate::config::RankingWeights;

/// A hydrated activity with its similarity to the query.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub activity: Activity,
    pub similarity: f64,
}

/// Linear decay from 1 today to 0 at the horizon. Future dates count as today.
pub fn recency_boost(performed_on: NaiveDate, today: NaiveDate, weights: &RankingWeights) -> f64 {
    if weights.recency_horizon_days == 0 {
        return 0.0;
    }
    let age_days = (today - performed_on).num_days().max(0) as f64;
    (1.0 - age_days / weights.recency_horizon_days as f64).max(0.0)
}

/// Score and sort candidates, best first.
///
/// Ties fall back to the most recently logged, then to id.
pub fn rank(
    candidates: &[Candidate],
    exercise: Option<&str>,
    today: NaiveDate,
    weights: &RankingWeights,
) -> Vec<RankedResult> {
    let mut results: Vec<RankedResult> = candidates
        .iter()
        .map(|c| {
            let recency = weights.recency * recency_boost(c.activity.performed_on, today, weights);
            let exact = match exercise {
                Some(name) if c.activity.exercise.eq_ignore_ascii_case(name) => weights.exact_match,
                _ => 0.0,
            };
            RankedResult {
                activity: c.activity.clone(),
                similarity: c.similarity,
                score: weights.similarity * c.similarity + recency + exact,
                recency_boost: recency,
                exact_match_boost: exact,
            }
        })
        .collect();

    results.sort_by(compare);
    results
}

fn compare(a: &RankedResult, b: &RankedResult) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.activity.created_at.cmp(&a.activity.created_at))
        .then_with(|| a.activity.id.cmp(&b.activity.id))
}

/// Bucket ranked results by workout date, newest date first.
///
/// Results keep their ranked order inside each bucket.
pub fn group_by_date(results: Vec<RankedResult>) -> Vec<DateGroup> {
    let mut buckets: BTreeMap<NaiveDate, Vec<RankedResult>> = BTreeMap::new();
    for result in results {
        buckets
            .entry(result.activity.performed_on)
            .or_default()
            .push(result);
    }

    buckets
        .into_iter()
        .rev()
        .map(|(date, results)| DateGroup {
            date,
            best_similarity: results.iter().map(|r| r.similarity).fold(0.0, f64::max),
            results,
        })
        .collect()
}
