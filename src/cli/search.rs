use anyhow::{Context, Result};
use chrono::NaiveDate;

use liftlog::activity::types::{Category, QueryIntent, TimeRange};
use liftlog::config::LiftlogConfig;

use crate::SearchArgs;

/// Open ends are clamped to four-digit years so stored dates compare as text.
fn year_bound(year: i32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1).context("invalid year bound")
}

/// Inclusive CLI dates become a half-open range.
fn time_range(args: &SearchArgs) -> Result<Option<TimeRange>> {
    if let Some(day) = args.on {
        return Ok(Some(TimeRange::day(day)?));
    }
    let end = match args.to {
        Some(to) => Some(to.succ_opt().context("--to date out of range")?),
        None => None,
    };
    let range = match (args.from, end) {
        (Some(start), Some(end)) => Some(TimeRange::new(start, end)?),
        (Some(start), None) => Some(TimeRange::new(start, year_bound(9999)?)?),
        (None, Some(end)) => Some(TimeRange::new(year_bound(1)?, end)?),
        (None, None) => None,
    };
    Ok(range)
}

fn intent(config: &LiftlogConfig, args: &SearchArgs) -> Result<QueryIntent> {
    let mut intent = QueryIntent::new(args.text.join(" "));
    if let Some(range) = time_range(args)? {
        intent = intent.with_time_range(range);
    }
    if let Some(category) = &args.category {
        let category: Category = category.parse().map_err(anyhow::Error::msg)?;
        intent = intent.with_category(category);
    }
    if let Some(exercise) = &args.exercise {
        intent = intent.with_exercise(exercise);
    }
    if !args.all_owners {
        intent = intent.with_owner(&config.storage.default_owner);
    }
    Ok(intent)
}

/// Run a search from the terminal.
pub async fn search(config: &LiftlogConfig, args: SearchArgs) -> Result<()> {
    let intent = intent(config, &args)?;
    let service = super::open_service(config)?;
    let outcome = service.search(intent).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    if !outcome.inconsistent_ids.is_empty() {
        eprintln!(
            "Warning: {} index entr(ies) have no activity record. Run `liftlog reconcile`.",
            outcome.inconsistent_ids.len()
        );
    }

    if outcome.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    let shown: usize = outcome.groups.iter().map(|g| g.results.len()).sum();
    println!("Found {} result(s), showing {shown}\n", outcome.total_results);

    for group in &outcome.groups {
        println!("{} (best match {:.2})", group.date, group.best_similarity);
        for result in &group.results {
            println!(
                "  {}  (similarity {:.2}, score {:.3})",
                super::describe(&result.activity),
                result.similarity,
                result.score,
            );
            println!("     {}", result.activity.id);
        }
        println!();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> SearchArgs {
        SearchArgs {
            text: vec![],
            from: None,
            to: None,
            on: None,
            category: None,
            exercise: None,
            all_owners: false,
            json: false,
        }
    }

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn inclusive_to_becomes_exclusive_end() {
        let mut a = args();
        a.from = Some(d("2026-01-13"));
        a.to = Some(d("2026-01-14"));
        let range = time_range(&a).unwrap().unwrap();
        assert_eq!(range.start(), d("2026-01-13"));
        assert_eq!(range.end(), d("2026-01-15"));
    }

    #[test]
    fn on_covers_a_single_day() {
        let mut a = args();
        a.on = Some(d("2026-01-14"));
        let range = time_range(&a).unwrap().unwrap();
        assert!(range.contains(d("2026-01-14")));
        assert!(!range.contains(d("2026-01-15")));
    }

    #[test]
    fn open_ends_are_clamped() {
        let mut a = args();
        a.from = Some(d("2026-01-01"));
        assert_eq!(time_range(&a).unwrap().unwrap().end(), d("9999-01-01"));

        let mut a = args();
        a.to = Some(d("2026-01-01"));
        assert_eq!(time_range(&a).unwrap().unwrap().start(), d("0001-01-01"));
        assert!(time_range(&args()).unwrap().is_none());
    }

    #[test]
    fn intent_scopes_to_default_owner() {
        let config = LiftlogConfig::default();
        let mut a = args();
        a.text = vec!["bench".into(), "press".into()];
        a.category = Some("chest".into());
        let intent = intent(&config, &a).unwrap();
        assert_eq!(intent.text(), "bench press");
        assert_eq!(intent.owner_id(), Some("default"));
        assert_eq!(intent.category(), Some(Category::Chest));

        a.all_owners = true;
        assert_eq!(super::intent(&config, &a).unwrap().owner_id(), None);
    }
}
