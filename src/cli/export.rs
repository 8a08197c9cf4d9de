use anyhow::Result;
use serde::{Deserialize, Serialize};

use liftlog::activity::store;
use liftlog::activity::types::{Activity, MetadataFilter};
use liftlog::config::LiftlogConfig;

/// Export format, shared with `import`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportData {
    pub activities: Vec<Activity>,
}

/// Export every activity, all owners, as JSON to stdout.
pub fn export(config: &LiftlogConfig) -> Result<()> {
    let conn = liftlog::db::open_database(config.resolved_db_path())?;
    let data = ExportData {
        activities: store::scan(&conn, &MetadataFilter::default(), None)?,
    };

    println!("{}", serde_json::to_string_pretty(&data)?);
    eprintln!("Exported {} activities.", data.activities.len());
    Ok(())
}
