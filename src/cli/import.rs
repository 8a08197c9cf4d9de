use std::path::Path;

use anyhow::{Context, Result};

use liftlog::activity::{retrieval, store};
use liftlog::config::LiftlogConfig;

use super::export::ExportData;

/// Import activities from an `export` file.
///
/// Each activity is re-embedded with the configured embedder and committed
/// under its original id. Ids that already exist are skipped.
pub async fn import(config: &LiftlogConfig, file: &Path) -> Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read import file: {}", file.display()))?;
    let data: ExportData = serde_json::from_str(&json).context("failed to parse import JSON")?;

    let mut conn = liftlog::db::open_database(config.resolved_db_path())?;
    let embedder = super::load_embedder(config)?;

    println!("Importing {} activities...", data.activities.len());
    let pb = super::bar(data.activities.len() as u64)?;

    let (imported, skipped, pb) = tokio::task::spawn_blocking(move || -> Result<_> {
        let (mut imported, mut skipped) = (0u64, 0u64);
        for activity in data.activities {
            pb.inc(1);
            if store::exists(&conn, &activity.id)? {
                skipped += 1;
                continue;
            }
            let vector = retrieval::embed_document(embedder.as_ref(), &activity)?;
            retrieval::commit_activity(&mut conn, activity, &vector, embedder.model_id())?;
            imported += 1;
        }
        Ok((imported, skipped, pb))
    })
    .await
    .context("import task failed")??;
    pb.finish_and_clear();

    println!("Import complete:");
    println!("  Activities imported: {imported}");
    println!("  Activities skipped:  {skipped} (already exist)");
    Ok(())
}
