use std::collections::BTreeMap;

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::error::Result;

/// Aggregate view of an owner's training log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutStats {
    /// Logged activities.
    pub total_workouts: u64,
    /// Distinct exercise names.
    pub total_exercises: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_frequent_exercise: Option<String>,
    pub exercise_breakdown: BTreeMap<String, u64>,
    pub category_breakdown: BTreeMap<String, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_workout_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_workout_date: Option<NaiveDate>,
    /// Distinct training days per week over the logged span (at least one week).
    pub avg_weekly_workouts: f64,
}

/// Compute statistics for one owner, or across all owners when `owner_id` is `None`.
pub fn workout_stats(conn: &Connection, owner_id: Option<&str>) -> Result<WorkoutStats> {
    let exercise_breakdown = count_by(conn, "exercise", owner_id)?;
    let category_breakdown = count_by(conn, "category", owner_id)?;

    // highest count wins; BTreeMap order makes ties resolve alphabetically
    let most_frequent_exercise = exercise_breakdown
        .iter()
        .fold(None::<(&String, u64)>, |best, (name, &n)| match best {
            Some((_, m)) if m >= n => best,
            _ => Some((name, n)),
        })
        .map(|(name, _)| name.clone());

    let (first, last, training_days): (Option<String>, Option<String>, i64) = conn.query_row(
        "SELECT MIN(performed_on), MAX(performed_on), COUNT(DISTINCT performed_on) \
         FROM activities WHERE (?1 IS NULL OR owner_id = ?1)",
        params![owner_id],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;
    let first_workout_date = first.and_then(|d| d.parse::<NaiveDate>().ok());
    let last_workout_date = last.and_then(|d| d.parse::<NaiveDate>().ok());

    let avg_weekly_workouts = match (first_workout_date, last_workout_date) {
        (Some(first), Some(last)) => {
            let span_days = ((last - first).num_days() + 1) as f64;
            training_days as f64 / (span_days / 7.0).max(1.0)
        }
        _ => 0.0,
    };

    Ok(WorkoutStats {
        total_workouts: exercise_breakdown.values().sum(),
        total_exercises: exercise_breakdown.len() as u64,
        most_frequent_exercise,
        exercise_breakdown,
        category_breakdown,
        first_workout_date,
        last_workout_date,
        avg_weekly_workouts,
    })
}

/// `column` is one of our own column names, never user input.
fn count_by(conn: &Connection, column: &str, owner_id: Option<&str>) -> Result<BTreeMap<String, u64>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {column}, COUNT(*) FROM activities \
         WHERE (?1 IS NULL OR owner_id = ?1) GROUP BY {column}"
    ))?;
    let rows = stmt
        .query_map(params![owner_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?
        .collect::<Result<BTreeMap<_, _>, _>>()?;
    Ok(rows)
}
