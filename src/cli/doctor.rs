//! CLI `doctor` command: run database diagnostics and print a health report.

use anyhow::{Context, Result};

use liftlog::config::LiftlogConfig;
use liftlog::db;
use liftlog::embedding::hash::HASH_MODEL_ID;

/// Model id the configured embedder will write.
fn configured_model(config: &LiftlogConfig) -> &str {
    match config.embedding.provider.as_str() {
        "hash" => HASH_MODEL_ID,
        _ => &config.embedding.model,
    }
}

/// Run database diagnostics and print a health report.
pub fn doctor(config: &LiftlogConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `liftlog log ...` to create it.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    let conn = db::open_database(&db_path).context("failed to open database (may be corrupt)")?;
    let report = db::check_database_health(&conn).context("failed to run health check")?;

    println!("liftlog Health Report");
    println!("=====================");
    println!();
    println!("Database:          {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!("sqlite-vec:        {}", report.sqlite_vec_version);
    println!();
    println!("Embedding model:");
    println!("  Stored:          {}", report.embedding_model.as_deref().unwrap_or("(not set)"));
    println!("  Configured:      {}", configured_model(config));
    if let Some(ref stored) = report.embedding_model {
        if stored != configured_model(config) {
            println!("  WARNING: model mismatch! Run `liftlog re-embed` to update vectors.");
        } else {
            println!("  Status:          OK (match)");
        }
    }
    println!();
    println!("Row counts:");
    println!("  Activities:      {}", report.activity_count);
    println!("  Vectors:         {}", report.vector_count);
    println!("  Audit log:       {}", report.log_count);
    if report.activity_count != report.vector_count {
        println!("  WARNING: counts differ. Run `liftlog reconcile`.");
    }
    println!();
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
        println!();
        println!("Recovery steps:");
        println!("  1. Restore from a backup: cp backup.db {}", db_path.display());
        println!("  2. Or export from a good copy and reimport:");
        println!("     liftlog export > backup.json");
        println!("     liftlog import backup.json");
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
