//! CLI `reconcile` command.

use anyhow::{Context, Result};

use liftlog::activity::reconcile::{self, Inconsistency};
use liftlog::config::LiftlogConfig;
use liftlog::db;

/// Find, and unless `dry_run` repair, store/index inconsistencies.
pub async fn reconcile(config: &LiftlogConfig, dry_run: bool) -> Result<()> {
    let mut conn = db::open_database(config.resolved_db_path())?;

    let found = reconcile::find_inconsistencies(&conn)?;
    if found.is_empty() {
        println!("Store and index are consistent.");
        return Ok(());
    }

    for item in &found {
        match item {
            Inconsistency::UnindexedActivity { id } => println!("  unindexed activity  {id}"),
            Inconsistency::OrphanVector { id } => println!("  orphan vector       {id}"),
        }
    }
    if dry_run {
        println!("{} inconsistenc(ies) found. Dry run, nothing repaired.", found.len());
        return Ok(());
    }

    let embedder = super::load_embedder(config)?;
    let pb = super::bar(found.len() as u64)?;
    let (report, pb) = tokio::task::spawn_blocking(move || {
        reconcile::reconcile_with_progress(&mut conn, embedder.as_ref(), false, |_| pb.inc(1))
            .map(|report| (report, pb))
    })
    .await
    .context("reconcile task failed")??;
    pb.finish_and_clear();

    println!("Reconciliation complete:");
    println!("  Re-indexed:       {}", report.reindexed);
    println!("  Orphans removed:  {}", report.orphans_removed);
    if !report.failed.is_empty() {
        println!("  Failed:           {}", report.failed.len());
        for (id, error) in &report.failed {
            println!("    {id}: {error}");
        }
    }
    Ok(())
}
