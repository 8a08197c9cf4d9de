use std::io::Read;

use anyhow::{Context, Result};
use chrono::Utc;

use liftlog::activity::types::ParsedActivity;
use liftlog::config::LiftlogConfig;

use crate::LogArgs;

fn parsed_from_args(args: LogArgs) -> Result<ParsedActivity> {
    if let Some(path) = args.json {
        let json = if path.as_os_str() == "-" {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        } else {
            std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?
        };
        return serde_json::from_str(&json).context("failed to parse activity JSON");
    }

    let exercise = args.exercise.context("--exercise is required")?;
    Ok(ParsedActivity {
        exercise,
        sets: args.sets,
        reps: args.reps,
        weight: args.weight,
        unit: args.unit,
        duration: args.duration,
        date: args.date.unwrap_or_else(|| Utc::now().date_naive()),
        notes: args.notes,
    })
}

/// Log one activity and print its id.
pub async fn log(config: &LiftlogConfig, args: LogArgs) -> Result<()> {
    let parsed = parsed_from_args(args)?;
    let service = super::open_service(config)?;
    let id = service.log(None, parsed).await?;
    println!("{id}");
    Ok(())
}
