mod helpers;

use helpers::{log_simple, result_ids, search, test_db, OWNER};
use liftlog::activity::reconcile::find_inconsistencies;
use liftlog::activity::types::QueryIntent;
use liftlog::activity::{index, retrieval, store};
use liftlog::Error;

#[test]
fn deleted_activity_never_resurfaces() {
    let mut conn = test_db();
    let keep = log_simple(&mut conn, "squat", "2026-01-14");
    let gone = log_simple(&mut conn, "squat", "2026-01-15");

    let intent = QueryIntent::new("squat").with_owner(OWNER);
    assert_eq!(search(&conn, &intent).total_results, 2);

    retrieval::delete_activity(&mut conn, &gone).unwrap();

    let outcome = search(&conn, &intent);
    assert_eq!(result_ids(&outcome), vec![keep]);
    assert!(outcome.inconsistent_ids.is_empty());
}

#[test]
fn delete_leaves_no_orphan_vector() {
    let mut conn = test_db();
    let id = log_simple(&mut conn, "deadlift", "2026-01-10");

    retrieval::delete_activity(&mut conn, &id).unwrap();

    assert!(!store::exists(&conn, &id).unwrap());
    assert!(!index::contains(&conn, &id).unwrap());
    assert!(find_inconsistencies(&conn).unwrap().is_empty());
}

#[test]
fn delete_is_audited() {
    let mut conn = test_db();
    let id = log_simple(&mut conn, "bench press", "2026-01-21");
    retrieval::delete_activity(&mut conn, &id).unwrap();

    let history = store::audit_history(&conn, &id).unwrap();
    let ops: Vec<&str> = history.iter().map(|e| e.operation.as_str()).collect();
    assert_eq!(ops, vec!["create", "delete"]);
    let details = history[1].details.as_ref().unwrap();
    assert_eq!(details["had_vector"], true);
}

#[test]
fn deleting_unknown_id_is_not_found() {
    let mut conn = test_db();
    let err = retrieval::delete_activity(&mut conn, "no-such-id").unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn deleting_twice_fails_the_second_time() {
    let mut conn = test_db();
    let id = log_simple(&mut conn, "plank", "2026-01-03");
    retrieval::delete_activity(&mut conn, &id).unwrap();
    assert!(matches!(
        retrieval::delete_activity(&mut conn, &id),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn activity_without_vector_can_still_be_deleted() {
    let mut conn = test_db();
    let id = log_simple(&mut conn, "lunge", "2026-01-08");
    conn.execute("DELETE FROM activities_vec WHERE id = ?1", [&id])
        .unwrap();

    retrieval::delete_activity(&mut conn, &id).unwrap();
    assert_eq!(store::count(&conn).unwrap(), 0);
    assert!(find_inconsistencies(&conn).unwrap().is_empty());
}
