//! Turns a [`QueryIntent`] into an executable [`PlannedQuery`].

use super::types::{MetadataFilter, QueryIntent};
use crate::config::RetrievalConfig;
use crate::embedding::{TextEmbedder, EMBEDDING_DIM};
use crate::error::{Error, Result};

/// Everything the executor needs; built once per search.
#[derive(Debug, Clone)]
pub struct PlannedQuery {
    /// Text that was embedded, if any.
    pub query_text: Option<String>,
    /// `None` for filter-only plans, which skip the vector index.
    pub vector_query: Option<Vec<f32>>,
    pub filter: MetadataFilter,
    pub k: usize,
    pub similarity_threshold: f64,
    /// Normalized exercise name for the exact-match boost.
    pub exercise: Option<String>,
}

impl PlannedQuery {
    pub fn is_filter_only(&self) -> bool {
        self.vector_query.is_none()
    }
}

/// Build the plan: filters from the intent, a query vector from its free text.
///
/// With no free text the requested exercise is embedded instead. Text without
/// a single letter or digit counts as absent. An intent with neither text,
/// exercise nor filters is rejected.
pub fn plan(
    intent: &QueryIntent,
    embedder: &dyn TextEmbedder,
    config: &RetrievalConfig,
) -> Result<PlannedQuery> {
    let filter = MetadataFilter {
        owner_id: intent.owner_id().map(str::to_string),
        time_range: intent.time_range().copied(),
        category: intent.category(),
    };
    let exercise = intent.exercise();

    let query_text = [Some(intent.text().trim().to_string()), exercise.clone()]
        .into_iter()
        .flatten()
        .find(|t| has_words(t));

    if query_text.is_none() && filter.is_empty() {
        return Err(Error::validation(
            "query has no text, exercise, or filters",
        ));
    }

    let vector_query = match &query_text {
        Some(text) => {
            let vector = embedder
                .embed(text)
                .map_err(|e| Error::Embedding(e.to_string()))?;
            if vector.len() != EMBEDDING_DIM {
                return Err(Error::Embedding(format!(
                    "embedder {} returned {} dimensions, expected {EMBEDDING_DIM}",
                    embedder.model_id(),
                    vector.len()
                )));
            }
            if vector.iter().all(|x| *x == 0.0) {
                return Err(Error::validation(format!(
                    "query {text:?} has no searchable terms"
                )));
            }
            Some(vector)
        }
        None => None,
    };

    tracing::debug!(
        query = query_text.as_deref().unwrap_or(""),
        filter_only = vector_query.is_none(),
        owner = filter.owner_id.as_deref().unwrap_or("*"),
        "query planned"
    );

    Ok(PlannedQuery {
        query_text,
        vector_query,
        filter,
        k: config.candidate_k,
        similarity_threshold: config.similarity_threshold,
        exercise,
    })
}

fn has_words(text: &str) -> bool {
    text.chars().any(char::is_alphanumeric)
}
