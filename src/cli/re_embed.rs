//! CLI `re-embed` command: regenerate every vector with the current embedder.

use anyhow::{Context, Result};

use liftlog::activity::{reconcile, store};
use liftlog::config::LiftlogConfig;
use liftlog::db;

/// Re-embed all activities and record the embedder's model id.
pub async fn re_embed(config: &LiftlogConfig) -> Result<()> {
    let mut conn = db::open_database(config.resolved_db_path())
        .context("failed to open database")?;
    let embedder = super::load_embedder(config)?;

    let ids: Vec<String> = store::index_refs(&conn)?
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    let total = ids.len();
    if total == 0 {
        println!("No activities to re-embed.");
        return Ok(());
    }

    println!("Re-embedding {total} activities with model '{}'...", embedder.model_id());
    let pb = super::bar(total as u64)?;

    let model_id = embedder.model_id().to_string();
    let pb = tokio::task::spawn_blocking(move || -> Result<_> {
        for id in &ids {
            reconcile::reindex(&mut conn, embedder.as_ref(), id)
                .with_context(|| format!("failed to re-embed {id}"))?;
            pb.inc(1);
        }
        db::migrations::set_embedding_model(&conn, embedder.model_id())?;
        Ok(pb)
    })
    .await
    .context("re-embed task failed")??;
    pb.finish_and_clear();

    println!("Re-embedded {total} activities with model '{model_id}'.");
    Ok(())
}
