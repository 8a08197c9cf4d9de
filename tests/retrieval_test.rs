mod helpers;

use helpers::{d, log, log_simple, result_ids, search, test_db, OWNER};
use liftlog::activity::retrieval;
use liftlog::activity::types::{Category, ParsedActivity, QueryIntent, TimeRange};
use liftlog::config::{RankingWeights, RetrievalConfig};
use liftlog::embedding::hash::HashEmbedder;
use liftlog::Error;

fn bench_and_squat(conn: &mut rusqlite::Connection) -> (String, String) {
    let mut bench = ParsedActivity::new("bench press", d("2026-01-21"));
    bench.sets = Some(3);
    bench.weight = Some(185.0);
    bench.unit = Some("lbs".into());
    let bench = log(conn, bench);

    let mut squat = ParsedActivity::new("squat", d("2026-01-14"));
    squat.sets = Some(4);
    squat.reps = Some(8);
    squat.weight = Some(225.0);
    squat.unit = Some("lbs".into());
    let squat = log(conn, squat);

    (bench, squat)
}

#[test]
fn last_tuesday_returns_only_the_squat() {
    let mut conn = test_db();
    let (_bench, squat) = bench_and_squat(&mut conn);

    let intent = QueryIntent::new("")
        .with_owner(OWNER)
        .with_time_range(TimeRange::new(d("2026-01-13"), d("2026-01-15")).unwrap());
    let outcome = search(&conn, &intent);

    assert_eq!(outcome.groups.len(), 1);
    assert_eq!(outcome.groups[0].date, d("2026-01-14"));
    assert_eq!(result_ids(&outcome), vec![squat]);
    assert_eq!(outcome.groups[0].results[0].activity.sets, Some(4));
}

#[test]
fn text_query_with_range_excludes_out_of_range_matches() {
    let mut conn = test_db();
    let (_bench, squat) = bench_and_squat(&mut conn);
    log_simple(&mut conn, "squat", "2026-01-20");

    let intent = QueryIntent::new("squat")
        .with_owner(OWNER)
        .with_time_range(TimeRange::new(d("2026-01-13"), d("2026-01-15")).unwrap());
    let outcome = search(&conn, &intent);
    assert_eq!(result_ids(&outcome), vec![squat]);
}

#[test]
fn exact_exercise_round_trip_clears_threshold() {
    let mut conn = test_db();
    let (bench, _squat) = bench_and_squat(&mut conn);

    let intent = QueryIntent::new("bench press")
        .with_owner(OWNER)
        .with_time_range(TimeRange::new(d("2020-01-01"), d("2030-01-01")).unwrap());
    let outcome = search(&conn, &intent);

    let top = outcome.results().next().unwrap();
    assert_eq!(top.activity.id, bench);
    assert!(top.similarity >= 0.7);
}

#[test]
fn closer_wording_scores_higher_similarity() {
    let mut conn = test_db();
    let flat = log_simple(&mut conn, "bench press", "2026-01-12");
    let incline = log_simple(&mut conn, "incline bench press", "2026-01-12");
    let close_grip = log_simple(&mut conn, "close grip bench press", "2026-01-12");

    let outcome = search(&conn, &QueryIntent::new("bench press").with_owner(OWNER));
    let ranked: Vec<_> = outcome.results().collect();
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].activity.id, flat);
    assert_eq!(ranked[1].activity.id, incline);
    assert!(ranked[0].similarity > ranked[1].similarity);
    // four-token document falls under the threshold
    assert!(ranked.iter().all(|r| r.activity.id != close_grip));
}

#[test]
fn below_threshold_candidates_never_appear() {
    let mut conn = test_db();
    log_simple(&mut conn, "squat", "2026-01-14");
    log_simple(&mut conn, "treadmill intervals", "2026-01-15");

    let outcome = search(&conn, &QueryIntent::new("squat").with_owner(OWNER));
    assert!(outcome.results().all(|r| r.similarity >= 0.7));
    assert!(outcome
        .results()
        .all(|r| r.activity.exercise != "treadmill intervals"));
}

#[test]
fn unrelated_query_is_empty_not_an_error() {
    let mut conn = test_db();
    log_simple(&mut conn, "squat", "2026-01-14");

    let outcome = search(&conn, &QueryIntent::new("swimming laps").with_owner(OWNER));
    assert!(outcome.is_empty());
    assert_eq!(outcome.total_results, 0);
}

#[test]
fn owners_are_isolated() {
    let mut conn = test_db();
    log_simple(&mut conn, "squat", "2026-01-14");
    retrieval::log_activity(
        &mut conn,
        "someone-else",
        &ParsedActivity::new("squat", d("2026-01-14")),
        &HashEmbedder::new(),
    )
    .unwrap();

    let outcome = search(&conn, &QueryIntent::new("squat").with_owner(OWNER));
    assert_eq!(outcome.total_results, 1);
    assert!(outcome.results().all(|r| r.activity.owner_id == OWNER));
}

#[test]
fn category_filter_applies() {
    let mut conn = test_db();
    let (bench, _squat) = bench_and_squat(&mut conn);

    let intent = QueryIntent::new("")
        .with_owner(OWNER)
        .with_category(Category::Chest);
    let outcome = search(&conn, &intent);
    assert_eq!(result_ids(&outcome), vec![bench]);
}

#[test]
fn fewer_matches_than_k_returns_exactly_the_matches() {
    let mut conn = test_db();
    for day in ["2026-01-02", "2026-01-03", "2026-01-04"] {
        log_simple(&mut conn, "squat", day);
    }
    // plenty of same-text activities for another owner, which must not pad the result
    for i in 0..30 {
        retrieval::log_activity(
            &mut conn,
            "crowd",
            &ParsedActivity::new("squat", d("2026-01-01") + chrono::Duration::days(i)),
            &HashEmbedder::new(),
        )
        .unwrap();
    }

    let config = RetrievalConfig {
        candidate_k: 20,
        max_results: 50,
        ..Default::default()
    };
    let outcome = retrieval::search(
        &conn,
        &QueryIntent::new("squat").with_owner(OWNER),
        &HashEmbedder::new(),
        &config,
        &RankingWeights::default(),
        helpers::today(),
    )
    .unwrap();
    assert_eq!(outcome.total_results, 3);
    assert!(outcome.results().all(|r| r.activity.owner_id == OWNER));
}

#[test]
fn results_are_capped_and_grouped_newest_first() {
    let mut conn = test_db();
    for i in 0..15 {
        log_simple(&mut conn, "deadlift", &format!("2026-01-{:02}", i + 1));
    }

    let outcome = search(&conn, &QueryIntent::new("deadlift").with_owner(OWNER));
    assert_eq!(outcome.total_results, 15);
    assert_eq!(outcome.results().count(), 10);
    for pair in outcome.groups.windows(2) {
        assert!(pair[0].date > pair[1].date);
    }
}

#[test]
fn search_is_deterministic() {
    let mut conn = test_db();
    bench_and_squat(&mut conn);
    log_simple(&mut conn, "bench press", "2026-01-07");
    log_simple(&mut conn, "incline bench press", "2026-01-08");

    let intent = QueryIntent::new("bench press").with_owner(OWNER);
    let first = search(&conn, &intent);
    let second = search(&conn, &intent);
    assert_eq!(result_ids(&first), result_ids(&second));
    assert_eq!(first.groups, second.groups);
}

#[test]
fn exact_exercise_match_gets_the_boost() {
    let mut conn = test_db();
    let incline = log_simple(&mut conn, "incline bench press", "2026-01-20");
    let flat = log_simple(&mut conn, "bench press", "2026-01-20");

    let intent = QueryIntent::new("bench press")
        .with_owner(OWNER)
        .with_exercise("Bench Press");
    let outcome = search(&conn, &intent);
    let ranked: Vec<_> = outcome.results().collect();
    assert_eq!(ranked[0].activity.id, flat);
    assert!((ranked[0].exact_match_boost - 0.15).abs() < 1e-9);

    let other = ranked.iter().find(|r| r.activity.id == incline).unwrap();
    assert_eq!(other.exact_match_boost, 0.0);
}

#[test]
fn empty_intent_is_a_validation_error() {
    let conn = test_db();
    let err = retrieval::search(
        &conn,
        &QueryIntent::new("   "),
        &HashEmbedder::new(),
        &RetrievalConfig::default(),
        &RankingWeights::default(),
        helpers::today(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[test]
fn inverted_range_is_rejected_at_construction() {
    assert!(matches!(
        TimeRange::new(d("2026-01-15"), d("2026-01-13")),
        Err(Error::Validation(_))
    ));
    let json = r#"{"text": "", "time_range": {"start": "2026-01-15", "end": "2026-01-13"}}"#;
    assert!(serde_json::from_str::<QueryIntent>(json).is_err());
}

#[test]
fn malformed_activity_never_reaches_the_store() {
    let mut conn = test_db();
    let mut parsed = ParsedActivity::new("squat", d("2026-01-14"));
    parsed.reps = Some(0);
    let err = retrieval::log_activity(&mut conn, OWNER, &parsed, &HashEmbedder::new())
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(liftlog::activity::store::count(&conn).unwrap(), 0);
}

#[test]
fn punctuation_query_with_filters_lists_the_range() {
    let mut conn = test_db();
    let (_bench, squat) = bench_and_squat(&mut conn);

    let intent = QueryIntent::new("??")
        .with_owner(OWNER)
        .with_time_range(TimeRange::new(d("2026-01-13"), d("2026-01-15")).unwrap());
    let outcome = search(&conn, &intent);
    assert_eq!(outcome.query, "");
    assert_eq!(result_ids(&outcome), vec![squat]);
}

#[test]
fn walking_lunge_is_found_by_the_legs_filter() {
    let mut conn = test_db();
    let lunge = log_simple(&mut conn, "walking lunge", "2026-01-16");
    log_simple(&mut conn, "treadmill walk", "2026-01-16");

    let intent = QueryIntent::new("")
        .with_owner(OWNER)
        .with_category(Category::Legs);
    assert_eq!(result_ids(&search(&conn, &intent)), vec![lunge]);
}
