//! SQL DDL for all liftlog tables.
//!
//! Defines `activities`, `activities_vec` (vec0), `activity_log`, and
//! `schema_meta`. All DDL uses `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

use crate::embedding::EMBEDDING_DIM;

const SCHEMA_SQL: &str = r#"
-- Canonical activity records
CREATE TABLE IF NOT EXISTS activities (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    exercise TEXT NOT NULL CHECK(length(exercise) > 0),
    category TEXT NOT NULL CHECK(category IN ('chest','back','legs','shoulders','arms','core','cardio','full_body','other')),
    sets INTEGER CHECK(sets IS NULL OR sets > 0),
    reps INTEGER CHECK(reps IS NULL OR reps > 0),
    weight REAL CHECK(weight IS NULL OR weight >= 0.0),
    unit TEXT CHECK(unit IS NULL OR unit IN ('lbs','kg')),
    duration_minutes INTEGER CHECK(duration_minutes IS NULL OR duration_minutes > 0),
    notes TEXT,
    performed_on TEXT NOT NULL,
    created_at TEXT NOT NULL,
    embedding_ref TEXT
);

CREATE INDEX IF NOT EXISTS idx_activities_owner_date ON activities(owner_id, performed_on);
CREATE INDEX IF NOT EXISTS idx_activities_category ON activities(category);
CREATE INDEX IF NOT EXISTS idx_activities_created ON activities(created_at);
CREATE INDEX IF NOT EXISTS idx_activities_exercise ON activities(exercise COLLATE NOCASE);

-- Audit log
CREATE TABLE IF NOT EXISTS activity_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    operation TEXT NOT NULL CHECK(operation IN ('create','delete','reindex','remove_orphan')),
    activity_id TEXT NOT NULL,
    details TEXT,
    created_at TEXT NOT NULL
);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// The vec0 table carries a denormalized copy of the filterable metadata so
/// KNN queries can constrain on it without joining `activities`.
fn vec_table_sql() -> String {
    format!(
        r#"
CREATE VIRTUAL TABLE IF NOT EXISTS activities_vec USING vec0(
    id TEXT PRIMARY KEY,
    embedding FLOAT[{EMBEDDING_DIM}] distance_metric=cosine,
    owner_id TEXT,
    performed_day INTEGER,
    category TEXT
);
"#
    )
}

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute_batch(&vec_table_sql())?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_creates_all_tables() {
        crate::db::load_sqlite_vec();
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"activities".to_string()));
        assert!(tables.contains(&"activities_vec".to_string()));
        assert!(tables.contains(&"activity_log".to_string()));
        assert!(tables.contains(&"schema_meta".to_string()));

        let version: String = conn
            .query_row("SELECT vec_version()", [], |r| r.get(0))
            .unwrap();
        assert!(!version.is_empty());
    }

    #[test]
    fn schema_is_idempotent() {
        crate::db::load_sqlite_vec();
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
    }

    #[test]
    fn check_constraint_rejects_unknown_category() {
        crate::db::load_sqlite_vec();
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO activities (id, owner_id, exercise, category, performed_on, created_at) \
             VALUES ('a', 'u', 'squat', 'neck', '2026-01-14', '2026-01-14T10:00:00Z')",
            [],
        );
        assert!(result.is_err());
    }
}
