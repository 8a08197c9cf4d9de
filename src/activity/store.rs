//! Activity store: the canonical `activities` table.
//!
//! Plain record persistence. Nothing here touches the vector index; the
//! retrieval pipeline wraps store and index writes in one transaction.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::types::{Activity, ActivityId, Category, MetadataFilter, TimeRange};
use crate::error::{Error, Result};

const ACTIVITY_COLUMNS: &str = "id, owner_id, exercise, category, sets, reps, weight, unit, \
     duration_minutes, notes, performed_on, created_at, embedding_ref";

const DATE_FORMAT: &str = "%Y-%m-%d";

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn text_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

/// Map a row selected with [`ACTIVITY_COLUMNS`] to an [`Activity`].
fn row_to_activity(row: &Row) -> rusqlite::Result<Activity> {
    let category: String = row.get(3)?;
    let unit: Option<String> = row.get(7)?;
    let performed_on: String = row.get(10)?;
    let created_at: String = row.get(11)?;

    Ok(Activity {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        exercise: row.get(2)?,
        category: category.parse().map_err(|e| text_error(3, e))?,
        sets: row.get(4)?,
        reps: row.get(5)?,
        weight: row.get(6)?,
        unit: unit.map(|u| u.parse()).transpose().map_err(|e| text_error(7, e))?,
        duration_minutes: row.get(8)?,
        notes: row.get(9)?,
        performed_on: NaiveDate::parse_from_str(&performed_on, DATE_FORMAT)
            .map_err(|e| conversion_error(10, e))?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| conversion_error(11, e))?
            .with_timezone(&Utc),
        embedding_ref: row.get(12)?,
    })
}

/// Timestamps are stored at fixed precision so they also sort as text.
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Insert a new activity. Fails if the id already exists.
pub fn put(conn: &Connection, activity: &Activity) -> Result<ActivityId> {
    if exists(conn, &activity.id)? {
        return Err(Error::validation(format!(
            "activity {} already exists",
            activity.id
        )));
    }
    conn.execute(
        &format!(
            "INSERT INTO activities ({ACTIVITY_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
        ),
        params![
            activity.id,
            activity.owner_id,
            activity.exercise,
            activity.category.as_str(),
            activity.sets,
            activity.reps,
            activity.weight,
            activity.unit.map(|u| u.as_str()),
            activity.duration_minutes,
            activity.notes,
            format_date(activity.performed_on),
            format_timestamp(&activity.created_at),
            activity.embedding_ref,
        ],
    )?;
    Ok(activity.id.clone())
}

pub fn exists(conn: &Connection, id: &str) -> Result<bool> {
    let found = conn
        .query_row("SELECT 1 FROM activities WHERE id = ?1", params![id], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

pub fn get(conn: &Connection, id: &str) -> Result<Activity> {
    conn.query_row(
        &format!("SELECT {ACTIVITY_COLUMNS} FROM activities WHERE id = ?1"),
        params![id],
        row_to_activity,
    )
    .optional()?
    .ok_or_else(|| Error::not_found("activity", id))
}

/// Batch fetch. Ids with no record are absent from the map.
pub fn get_many(conn: &Connection, ids: &[&str]) -> Result<HashMap<ActivityId, Activity>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "SELECT {ACTIVITY_COLUMNS} FROM activities WHERE id IN ({})",
        placeholders.join(", ")
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(ids.iter()), row_to_activity)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows.into_iter().map(|a| (a.id.clone(), a)).collect())
}

/// Delete the record. The caller is responsible for the vector.
pub fn delete(conn: &Connection, id: &str) -> Result<()> {
    let rows = conn.execute("DELETE FROM activities WHERE id = ?1", params![id])?;
    if rows == 0 {
        return Err(Error::not_found("activity", id));
    }
    Ok(())
}

pub fn set_embedding_ref(conn: &Connection, id: &str, embedding_ref: Option<&str>) -> Result<()> {
    let rows = conn.execute(
        "UPDATE activities SET embedding_ref = ?1 WHERE id = ?2",
        params![embedding_ref, id],
    )?;
    if rows == 0 {
        return Err(Error::not_found("activity", id));
    }
    Ok(())
}

/// All of an owner's activities matching the optional range and category.
pub fn list_by_filter(
    conn: &Connection,
    owner_id: &str,
    time_range: Option<&TimeRange>,
    category: Option<Category>,
) -> Result<Vec<Activity>> {
    let filter = MetadataFilter {
        owner_id: Some(owner_id.to_string()),
        time_range: time_range.copied(),
        category,
    };
    scan(conn, &filter, None)
}

/// Structured scan, newest workout first. Backs filter-only searches.
pub fn scan(conn: &Connection, filter: &MetadataFilter, limit: Option<usize>) -> Result<Vec<Activity>> {
    let mut clauses = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(owner) = &filter.owner_id {
        values.push(Value::Text(owner.clone()));
        clauses.push(format!("owner_id = ?{}", values.len()));
    }
    if let Some(range) = &filter.time_range {
        values.push(Value::Text(format_date(range.start())));
        clauses.push(format!("performed_on >= ?{}", values.len()));
        values.push(Value::Text(format_date(range.end())));
        clauses.push(format!("performed_on < ?{}", values.len()));
    }
    if let Some(category) = filter.category {
        values.push(Value::Text(category.as_str().to_string()));
        clauses.push(format!("category = ?{}", values.len()));
    }

    let mut sql = format!("SELECT {ACTIVITY_COLUMNS} FROM activities");
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY performed_on DESC, created_at DESC, id ASC");
    if let Some(limit) = limit {
        values.push(Value::Integer(limit as i64));
        sql.push_str(&format!(" LIMIT ?{}", values.len()));
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(values.iter()), row_to_activity)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Most recently logged first.
pub fn list_recent(conn: &Connection, owner_id: Option<&str>, limit: usize) -> Result<Vec<Activity>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ACTIVITY_COLUMNS} FROM activities \
         WHERE (?1 IS NULL OR owner_id = ?1) \
         ORDER BY created_at DESC, id DESC LIMIT ?2"
    ))?;
    let rows = stmt
        .query_map(params![owner_id, limit as i64], row_to_activity)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Case-insensitive exact exercise match, newest workout first.
pub fn list_by_exercise(
    conn: &Connection,
    owner_id: Option<&str>,
    exercise: &str,
) -> Result<Vec<Activity>> {
    let exercise = super::types::normalize_exercise(exercise);
    let mut stmt = conn.prepare(&format!(
        "SELECT {ACTIVITY_COLUMNS} FROM activities \
         WHERE exercise = ?1 COLLATE NOCASE AND (?2 IS NULL OR owner_id = ?2) \
         ORDER BY performed_on DESC, created_at DESC"
    ))?;
    let rows = stmt
        .query_map(params![exercise, owner_id], row_to_activity)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn count(conn: &Connection) -> Result<u64> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM activities", [], |row| row.get(0))?;
    Ok(n as u64)
}

/// `(id, embedding_ref)` for every record. Used by reconciliation.
pub fn index_refs(conn: &Connection) -> Result<Vec<(ActivityId, Option<String>)>> {
    let mut stmt = conn.prepare("SELECT id, embedding_ref FROM activities")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// One row of the `activity_log` audit table.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AuditEntry {
    pub operation: String,
    pub details: Option<serde_json::Value>,
    pub created_at: String,
}

/// Audit entries for an activity, oldest first.
pub fn audit_history(conn: &Connection, activity_id: &str) -> Result<Vec<AuditEntry>> {
    let mut stmt = conn.prepare(
        "SELECT operation, details, created_at FROM activity_log \
         WHERE activity_id = ?1 ORDER BY id",
    )?;
    let rows = stmt
        .query_map(params![activity_id], |row| {
            let details: Option<String> = row.get(1)?;
            Ok(AuditEntry {
                operation: row.get(0)?,
                details: details.and_then(|d| serde_json::from_str(&d).ok()),
                created_at: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Write an entry to the `activity_log` audit table.
pub(crate) fn write_audit_log(
    conn: &Connection,
    operation: &str,
    activity_id: &str,
    details: Option<&serde_json::Value>,
) -> Result<()> {
    let now = format_timestamp(&Utc::now());
    let details_json = details.map(|d| d.to_string());
    conn.execute(
        "INSERT INTO activity_log (operation, activity_id, details, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![operation, activity_id, details_json, now],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::types::WeightUnit;
    use crate::db;
    use chrono::Duration;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn activity(id: &str, owner: &str, exercise: &str, category: Category, day: &str) -> Activity {
        Activity {
            id: id.into(),
            owner_id: owner.into(),
            exercise: exercise.into(),
            category,
            sets: Some(3),
            reps: Some(10),
            weight: Some(135.0),
            unit: Some(WeightUnit::Lbs),
            duration_minutes: None,
            notes: None,
            performed_on: d(day),
            created_at: Utc::now(),
            embedding_ref: None,
        }
    }

    #[test]
    fn test_put_and_get() {
        let conn = db::open_memory_database().unwrap();
        let mut a = activity("a1", "u", "bench press", Category::Chest, "2026-01-21");
        a.notes = Some("felt strong".into());
        put(&conn, &a).unwrap();

        let got = get(&conn, "a1").unwrap();
        assert_eq!(got.exercise, "bench press");
        assert_eq!(got.category, Category::Chest);
        assert_eq!(got.unit, Some(WeightUnit::Lbs));
        assert_eq!(got.performed_on, d("2026-01-21"));
        assert_eq!(got.notes.as_deref(), Some("felt strong"));
        assert_eq!(
            got.created_at.timestamp_micros(),
            a.created_at.timestamp_micros()
        );
    }

    #[test]
    fn test_put_duplicate_rejected() {
        let conn = db::open_memory_database().unwrap();
        let a = activity("a1", "u", "squat", Category::Legs, "2026-01-14");
        put(&conn, &a).unwrap();
        assert!(matches!(put(&conn, &a), Err(Error::Validation(_))));
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let conn = db::open_memory_database().unwrap();
        assert!(matches!(get(&conn, "nope"), Err(Error::NotFound(_))));
        assert!(matches!(delete(&conn, "nope"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_get_many_skips_missing() {
        let conn = db::open_memory_database().unwrap();
        put(&conn, &activity("a1", "u", "squat", Category::Legs, "2026-01-14")).unwrap();
        put(&conn, &activity("a2", "u", "bench press", Category::Chest, "2026-01-21")).unwrap();

        let found = get_many(&conn, &["a1", "a2", "ghost"]).unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.contains_key("a1"));
        assert!(!found.contains_key("ghost"));
        assert!(get_many(&conn, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_scan_applies_filter_newest_first() {
        let conn = db::open_memory_database().unwrap();
        put(&conn, &activity("bench", "u", "bench press", Category::Chest, "2026-01-21")).unwrap();
        put(&conn, &activity("squat", "u", "squat", Category::Legs, "2026-01-14")).unwrap();
        put(&conn, &activity("row", "u", "barbell row", Category::Back, "2026-01-13")).unwrap();
        put(&conn, &activity("theirs", "v", "squat", Category::Legs, "2026-01-14")).unwrap();

        let range = TimeRange::new(d("2026-01-13"), d("2026-01-15")).unwrap();
        let got = list_by_filter(&conn, "u", Some(&range), None).unwrap();
        let ids: Vec<&str> = got.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["squat", "row"]);

        let legs = list_by_filter(&conn, "u", None, Some(Category::Legs)).unwrap();
        assert_eq!(legs.len(), 1);

        let all = scan(&conn, &MetadataFilter::default(), Some(2)).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "bench");
    }

    #[test]
    fn test_list_recent_orders_by_created_at() {
        let conn = db::open_memory_database().unwrap();
        let now = Utc::now();
        let mut older = activity("older", "u", "squat", Category::Legs, "2026-01-20");
        older.created_at = now - Duration::hours(2);
        let mut newer = activity("newer", "u", "squat", Category::Legs, "2026-01-10");
        newer.created_at = now;
        put(&conn, &older).unwrap();
        put(&conn, &newer).unwrap();

        let recent = list_recent(&conn, Some("u"), 10).unwrap();
        assert_eq!(recent[0].id, "newer");
        assert_eq!(list_recent(&conn, Some("v"), 10).unwrap().len(), 0);
        assert_eq!(list_recent(&conn, None, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_list_by_exercise_is_case_insensitive() {
        let conn = db::open_memory_database().unwrap();
        put(&conn, &activity("a1", "u", "bench press", Category::Chest, "2026-01-07")).unwrap();
        put(&conn, &activity("a2", "u", "bench press", Category::Chest, "2026-01-21")).unwrap();
        put(&conn, &activity("a3", "u", "incline bench press", Category::Chest, "2026-01-14")).unwrap();

        let got = list_by_exercise(&conn, None, "  Bench   PRESS ").unwrap();
        let ids: Vec<&str> = got.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a2", "a1"]);
    }

    #[test]
    fn test_audit_log_written() {
        let conn = db::open_memory_database().unwrap();
        write_audit_log(&conn, "create", "a1", Some(&serde_json::json!({"k": 1}))).unwrap();
        let op: String = conn
            .query_row(
                "SELECT operation FROM activity_log WHERE activity_id = 'a1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(op, "create");

        write_audit_log(&conn, "delete", "a1", None).unwrap();
        let history = audit_history(&conn, "a1").unwrap();
        let ops: Vec<&str> = history.iter().map(|e| e.operation.as_str()).collect();
        assert_eq!(ops, vec!["create", "delete"]);
        assert_eq!(history[0].details, Some(serde_json::json!({"k": 1})));
    }
}
