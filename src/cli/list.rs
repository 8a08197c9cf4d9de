use anyhow::Result;

use liftlog::activity::store;
use liftlog::config::LiftlogConfig;

/// List the owner's activities, most recently logged first.
pub fn list(config: &LiftlogConfig, limit: usize, exercise: Option<&str>, json: bool) -> Result<()> {
    let conn = liftlog::db::open_database(config.resolved_db_path())?;
    let owner = Some(config.storage.default_owner.as_str());

    let activities = match exercise {
        Some(name) => {
            let mut found = store::list_by_exercise(&conn, owner, name)?;
            found.truncate(limit);
            found
        }
        None => store::list_recent(&conn, owner, limit)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&activities)?);
        return Ok(());
    }

    if activities.is_empty() {
        println!("No activities logged.");
        return Ok(());
    }

    for activity in &activities {
        println!(
            "{}  {}  {}",
            activity.performed_on,
            super::describe(activity),
            activity.id
        );
    }
    Ok(())
}
