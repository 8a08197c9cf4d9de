use anyhow::Result;

use liftlog::activity::stats::workout_stats;
use liftlog::config::LiftlogConfig;

/// Display workout statistics in the terminal.
pub fn stats(config: &LiftlogConfig, all_owners: bool, json: bool) -> Result<()> {
    let conn = liftlog::db::open_database(config.resolved_db_path())?;
    let owner = (!all_owners).then_some(config.storage.default_owner.as_str());
    let stats = workout_stats(&conn, owner)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Workout Statistics ({})", owner.unwrap_or("all owners"));
    println!("{}", "=".repeat(40));
    println!("  Total workouts:      {}", stats.total_workouts);
    println!("  Distinct exercises:  {}", stats.total_exercises);
    if let Some(ref most) = stats.most_frequent_exercise {
        println!("  Most frequent:       {most}");
    }
    if let Some(first) = stats.first_workout_date {
        println!("  First workout:       {first}");
    }
    if let Some(last) = stats.last_workout_date {
        println!("  Last workout:        {last}");
    }
    println!("  Per week (avg):      {:.1}", stats.avg_weekly_workouts);
    println!();

    if !stats.category_breakdown.is_empty() {
        println!("By Category:");
        for (category, count) in &stats.category_breakdown {
            println!("  {:<12} {}", category, count);
        }
        println!();
    }

    if !stats.exercise_breakdown.is_empty() {
        println!("By Exercise:");
        let mut exercises: Vec<_> = stats.exercise_breakdown.iter().collect();
        exercises.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (exercise, count) in exercises {
            println!("  {:<24} {}", exercise, count);
        }
    }

    Ok(())
}
