//! CLI `get` and `delete` commands.

use anyhow::Result;

use liftlog::activity::store;
use liftlog::config::LiftlogConfig;

/// Show one activity with its audit history.
pub fn inspect(config: &LiftlogConfig, id: &str, json: bool) -> Result<()> {
    let conn = liftlog::db::open_database(config.resolved_db_path())?;
    let activity = store::get(&conn, id)?;
    let history = store::audit_history(&conn, id)?;

    if json {
        let out = serde_json::json!({ "activity": activity, "history": history });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Activity: {}", activity.id);
    println!("{}", "=".repeat(50));
    println!("  Exercise:       {}", activity.exercise);
    println!("  Category:       {}", activity.category);
    println!("  Performed on:   {}", activity.performed_on);
    if let Some(sets) = activity.sets {
        println!("  Sets:           {sets}");
    }
    if let Some(reps) = activity.reps {
        println!("  Reps:           {reps}");
    }
    if let Some(weight) = activity.weight {
        let unit = activity.unit.map(|u| u.as_str()).unwrap_or("lbs");
        println!("  Weight:         {weight} {unit}");
    }
    if let Some(minutes) = activity.duration_minutes {
        println!("  Duration:       {minutes} min");
    }
    println!("  Owner:          {}", activity.owner_id);
    println!("  Logged at:      {}", activity.created_at.to_rfc3339());
    println!(
        "  Indexed:        {}",
        if activity.embedding_ref.is_some() { "yes" } else { "no" }
    );
    if let Some(notes) = &activity.notes {
        println!();
        println!("Notes:");
        println!("  {notes}");
    }

    if !history.is_empty() {
        println!();
        println!("Audit Log:");
        for entry in &history {
            let details = entry
                .details
                .as_ref()
                .map(|d| d.to_string())
                .unwrap_or_default();
            println!("  {} [{}] {}", entry.created_at, entry.operation, details);
        }
    }

    Ok(())
}

/// Delete an activity and its vector.
pub async fn delete(config: &LiftlogConfig, id: &str) -> Result<()> {
    let service = super::open_service(config)?;
    service.delete(id).await?;
    println!("Deleted {id}");
    Ok(())
}
