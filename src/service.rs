//! Async front for the retrieval core.
//!
//! [`ActivityService`] owns the shared connection, embedder and config. The
//! core is synchronous, so embedding and database work run on
//! `spawn_blocking`; embedding happens before the connection lock is taken.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use rusqlite::Connection;

use crate::activity::reconcile::{self, ReconcileReport};
use crate::activity::retrieval::{self, SearchOutcome};
use crate::activity::stats::{self, WorkoutStats};
use crate::activity::types::{Activity, ActivityId, ParsedActivity, QueryIntent};
use crate::activity::{planner, store};
use crate::config::LiftlogConfig;
use crate::embedding::TextEmbedder;
use crate::error::{Error, Result};

#[derive(Clone)]
pub struct ActivityService {
    db: Arc<Mutex<Connection>>,
    embedder: Arc<dyn TextEmbedder>,
    config: Arc<LiftlogConfig>,
}

/// Await a blocking task, turning a panic into [`Error::Internal`].
async fn run_blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| Error::Internal(format!("blocking task failed: {e}")))?
}

fn lock(db: &Mutex<Connection>) -> Result<std::sync::MutexGuard<'_, Connection>> {
    db.lock()
        .map_err(|e| Error::Internal(format!("db lock poisoned: {e}")))
}

impl ActivityService {
    pub fn new(
        db: Arc<Mutex<Connection>>,
        embedder: Arc<dyn TextEmbedder>,
        config: Arc<LiftlogConfig>,
    ) -> Self {
        Self {
            db,
            embedder,
            config,
        }
    }

    pub fn config(&self) -> &LiftlogConfig {
        &self.config
    }

    /// Log an activity for `owner_id`, or the configured default owner.
    pub async fn log(&self, owner_id: Option<&str>, parsed: ParsedActivity) -> Result<ActivityId> {
        let owner = owner_id
            .unwrap_or(&self.config.storage.default_owner)
            .to_string();
        let activity = retrieval::build_activity(&owner, &parsed)?;

        let embedder = Arc::clone(&self.embedder);
        let (activity, vector) = run_blocking(move || {
            let vector = retrieval::embed_document(embedder.as_ref(), &activity)?;
            Ok((activity, vector))
        })
        .await?;

        let db = Arc::clone(&self.db);
        let model_id = self.embedder.model_id().to_string();
        run_blocking(move || {
            let mut conn = lock(&db)?;
            retrieval::commit_activity(&mut conn, activity, &vector, &model_id)
        })
        .await
    }

    /// Search with today's date as the recency anchor.
    pub async fn search(&self, intent: QueryIntent) -> Result<SearchOutcome> {
        self.search_at(intent, Utc::now().date_naive()).await
    }

    /// Search, failing with [`Error::Timeout`] past `retrieval.search_timeout_ms`.
    pub async fn search_at(&self, intent: QueryIntent, today: NaiveDate) -> Result<SearchOutcome> {
        let timeout = Duration::from_millis(self.config.retrieval.search_timeout_ms);
        tokio::time::timeout(timeout, self.run_search(intent, today))
            .await
            .map_err(|_| {
                tracing::warn!(timeout_ms = timeout.as_millis() as u64, "search timed out");
                Error::Timeout(format!("search exceeded {} ms", timeout.as_millis()))
            })?
    }

    async fn run_search(&self, intent: QueryIntent, today: NaiveDate) -> Result<SearchOutcome> {
        let embedder = Arc::clone(&self.embedder);
        let config = Arc::clone(&self.config);
        let plan = run_blocking(move || planner::plan(&intent, embedder.as_ref(), &config.retrieval))
            .await?;

        let db = Arc::clone(&self.db);
        let config = Arc::clone(&self.config);
        run_blocking(move || {
            let conn = lock(&db)?;
            retrieval::execute(&conn, &plan, &config.retrieval, &config.ranking, today)
        })
        .await
    }

    pub async fn get(&self, id: &str) -> Result<Activity> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();
        run_blocking(move || store::get(&*lock(&db)?, &id)).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();
        run_blocking(move || retrieval::delete_activity(&mut *lock(&db)?, &id)).await
    }

    pub async fn stats(&self, owner_id: Option<&str>) -> Result<WorkoutStats> {
        let db = Arc::clone(&self.db);
        let owner = owner_id.map(str::to_string);
        run_blocking(move || stats::workout_stats(&*lock(&db)?, owner.as_deref())).await
    }

    pub async fn reconcile(&self, dry_run: bool) -> Result<ReconcileReport> {
        let db = Arc::clone(&self.db);
        let embedder = Arc::clone(&self.embedder);
        run_blocking(move || reconcile::reconcile(&mut *lock(&db)?, embedder.as_ref(), dry_run))
            .await
    }
}
