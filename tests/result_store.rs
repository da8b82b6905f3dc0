use belbin_roles::backup::JsonBackup;
use belbin_roles::{ResultStore, Role, ScoreMap, ScoringEngine, POINT_ALLOCATION};
use tempfile::TempDir;

fn scores(pairs: &[(Role, u32)]) -> ScoreMap {
    pairs.iter().copied().collect()
}

fn open_store() -> (TempDir, ResultStore) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = ResultStore::new(dir.path().join("data").join("results.db"))
        .with_backup(JsonBackup::new(dir.path().join("data").join("results.json")));
    store.initialize().expect("schema created");
    (dir, store)
}

#[test]
fn save_then_read_back_matches_ranking() {
    let (_dir, store) = open_store();
    let map = scores(&[
        (Role::Plant, 10),
        (Role::ResourceInvestigator, 8),
        (Role::Coordinator, 6),
        (Role::Shaper, 4),
        (Role::MonitorEvaluator, 2),
        (Role::Teamworker, 1),
        (Role::Implementer, 1),
        (Role::CompleterFinisher, 1),
    ]);

    let id = store.save("test_user", &map).expect("saved");
    assert!(id > 0);

    let results = store.user_results("test_user");
    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.id, id);
    assert_eq!(result.username, "test_user");
    assert_eq!(result.scores, map);

    let engine = ScoringEngine::new(&POINT_ALLOCATION);
    let top = engine.primary_roles(&map, 2);
    assert_eq!(result.primary_role, Some(top[0].0));
    assert_eq!(result.secondary_role, Some(top[1].0));
}

#[test]
fn zero_scores_have_no_primary_role() {
    let (_dir, store) = open_store();
    store.save("zero", &ScoreMap::default()).expect("saved");
    store
        .save("one", &scores(&[(Role::Specialist, 3)]))
        .expect("saved");

    let zero = store.latest_result("zero").expect("stored");
    assert_eq!(zero.primary_role, None);
    assert_eq!(zero.secondary_role, None);

    let one = store.latest_result("one").expect("stored");
    assert_eq!(one.primary_role, Some(Role::Specialist));
    assert_eq!(one.secondary_role, None);
}

#[test]
fn results_are_newest_first_and_username_is_exact() {
    let (_dir, store) = open_store();
    let first = store.save("Alice", &scores(&[(Role::Plant, 1)])).unwrap();
    let second = store.save("Alice", &scores(&[(Role::Shaper, 1)])).unwrap();
    store.save("alice", &scores(&[(Role::Teamworker, 1)])).unwrap();

    let results = store.user_results("Alice");
    assert_eq!(
        results.iter().map(|result| result.id).collect::<Vec<_>>(),
        vec![second, first]
    );
    assert!(results[0].timestamp >= results[1].timestamp);
    assert!(store.user_results("ALICE").is_empty());

    let all = store.all_results();
    assert_eq!(all.len(), 3);
    assert!(all
        .windows(2)
        .all(|pair| pair[0].timestamp >= pair[1].timestamp));
}

#[test]
fn statistics_count_tests_users_and_popular_roles() {
    let (_dir, store) = open_store();
    assert_eq!(store.statistics().total_tests, 0);

    store.save("u1", &scores(&[(Role::Plant, 5)])).unwrap();
    store.save("u2", &scores(&[(Role::Shaper, 5)])).unwrap();
    store.save("u3", &scores(&[(Role::Plant, 2)])).unwrap();
    store.save("u4", &ScoreMap::default()).unwrap();

    let statistics = store.statistics();
    assert_eq!(statistics.total_tests, 4);
    assert_eq!(statistics.unique_users, 4);
    assert_eq!(
        statistics.popular_roles,
        vec![(Role::Plant, 2), (Role::Shaper, 1)]
    );

    store.save("u1", &scores(&[(Role::Teamworker, 5)])).unwrap();
    store.save("u2", &scores(&[(Role::Coordinator, 5)])).unwrap();
    let statistics = store.statistics();
    assert_eq!(statistics.total_tests, 6);
    assert_eq!(statistics.unique_users, 4);
    // equal counts come out in catalog order
    assert_eq!(
        statistics.popular_roles,
        vec![
            (Role::Plant, 2),
            (Role::Coordinator, 1),
            (Role::Shaper, 1),
            (Role::Teamworker, 1)
        ]
    );
}

#[test]
fn delete_removes_only_that_user() {
    let (_dir, store) = open_store();
    assert_eq!(store.delete_user_results("nobody").expect("no error"), 0);

    store.save("bob", &scores(&[(Role::Plant, 1)])).unwrap();
    store.save("bob", &scores(&[(Role::Plant, 2)])).unwrap();
    store.save("carol", &scores(&[(Role::Plant, 3)])).unwrap();

    assert_eq!(store.delete_user_results("bob").unwrap(), 2);
    assert!(store.user_results("bob").is_empty());
    assert_eq!(store.user_results("carol").len(), 1);
    assert_eq!(store.delete_user_results("bob").unwrap(), 0);
}

#[test]
fn every_save_is_mirrored_to_json() {
    let (_dir, store) = open_store();
    let map = scores(&[(Role::Implementer, 4)]);
    store.save("dave", &map).unwrap();
    store.save("erin", &ScoreMap::default()).unwrap();

    let entries = store.backup().expect("backup configured").entries().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].username, "dave");
    assert_eq!(entries[0].scores, map);

    let stored = store.latest_result("dave").unwrap();
    assert_eq!(entries[0].timestamp, stored.timestamp);
}

#[test]
fn broken_mirror_does_not_fail_the_save() {
    let dir = tempfile::tempdir().unwrap();
    // a directory can't be read or replaced as a json file
    let store = ResultStore::new(dir.path().join("results.db"))
        .with_backup(JsonBackup::new(dir.path()));
    store.initialize().unwrap();

    let id = store.save("frank", &scores(&[(Role::Plant, 1)]));
    assert!(id.is_ok());
    assert_eq!(store.user_results("frank").len(), 1);
}
