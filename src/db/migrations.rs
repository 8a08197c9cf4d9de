//! Schema migrations.
//!
//! `schema_meta.schema_version` records the last applied step. Steps in
//! [`MIGRATIONS`] run in order, each inside its own transaction, and never run
//! twice.

use rusqlite::{Connection, OptionalExtension};

type Step = fn(&Connection) -> rusqlite::Result<()>;

/// `(target version, step)` pairs, ascending. Version 1 is the base schema
/// written by [`init_schema`](super::schema::init_schema).
const MIGRATIONS: &[(u32, Step)] = &[];

pub const CURRENT_SCHEMA_VERSION: u32 = 1;

fn meta_value(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = ?1",
        [key],
        |row| row.get(0),
    )
    .optional()
}

fn set_meta_value(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO schema_meta (key, value) VALUES (?1, ?2) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        [key, value],
    )?;
    Ok(())
}

/// Applied schema version; 0 if the marker is missing or unreadable.
pub fn get_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    Ok(meta_value(conn, "schema_version")?
        .and_then(|v| v.parse().ok())
        .unwrap_or(0))
}

/// Model id that produced the stored vectors.
pub fn get_embedding_model(conn: &Connection) -> rusqlite::Result<Option<String>> {
    meta_value(conn, "embedding_model")
}

pub fn set_embedding_model(conn: &Connection, model: &str) -> rusqlite::Result<()> {
    set_meta_value(conn, "embedding_model", model)
}

/// Claim the marker for `model` unless another model already holds it.
pub fn record_embedding_model(conn: &Connection, model: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('embedding_model', ?1)",
        [model],
    )?;
    Ok(())
}

/// The stored model id when it differs from `model`.
pub fn embedding_model_mismatch(conn: &Connection, model: &str) -> rusqlite::Result<Option<String>> {
    Ok(get_embedding_model(conn)?.filter(|stored| stored != model))
}

/// Bring the schema up to [`CURRENT_SCHEMA_VERSION`].
pub fn run_migrations(conn: &mut Connection) -> rusqlite::Result<()> {
    let current = get_schema_version(conn)?;
    let pending: Vec<&(u32, Step)> = MIGRATIONS.iter().filter(|(v, _)| *v > current).collect();
    if pending.is_empty() {
        tracing::debug!(schema_version = current, "schema up to date");
        return Ok(());
    }

    for &(version, step) in pending {
        tracing::info!(to = version, "applying migration");
        let tx = conn.transaction()?;
        step(&tx)?;
        set_meta_value(&tx, "schema_version", &version.to_string())?;
        tx.commit()?;
    }
    Ok(())
}
