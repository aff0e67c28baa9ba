mod common;

use common::*;
use relayarr_core::types::MediaStatus;
use relayarr_db::repo::snapshots;
use relayarr_sync::reconcile::ReconcileOutcome;

#[tokio::test]
async fn new_item_creates_message_without_events() {
    let pool = test_pool().await;
    let platform = FakePlatform::new();
    let reconciler = reconciler(&pool, &platform);

    let record = show(7, MediaStatus::Available, &[(1, "yy")]);
    let outcome = reconciler.reconcile(&record).await.unwrap();

    let ReconcileOutcome::Created { sink_object_id } = outcome else {
        panic!("expected a created outcome, got {outcome:?}");
    };
    assert_eq!(platform.titles_in(CHANNEL), vec!["Show 7"]);
    assert!(platform.state.lock().unwrap().threads.is_empty());

    let snapshot = snapshots::get(&pool, record.key()).await.unwrap().unwrap();
    assert_eq!(snapshot.sink_object_id, sink_object_id);
    assert_eq!(snapshot.last_state, serde_json::to_value(&record).unwrap());
}

#[tokio::test]
async fn unchanged_record_touches_nothing() {
    let pool = test_pool().await;
    let platform = FakePlatform::new();
    let reconciler = reconciler(&pool, &platform);

    let record = movie(1, MediaStatus::Pending);
    reconciler.reconcile(&record).await.unwrap();
    let before = snapshots::get(&pool, record.key()).await.unwrap().unwrap();

    let outcome = reconciler.reconcile(&record).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Unchanged);

    let state = platform.state.lock().unwrap();
    assert_eq!(state.sent.len(), 1);
    assert!(state.edits.is_empty());
    drop(state);

    let after = snapshots::get(&pool, record.key()).await.unwrap().unwrap();
    assert_eq!(after.updated_ts, before.updated_ts);
}

#[tokio::test]
async fn status_change_edits_in_place_and_notifies_thread() {
    let pool = test_pool().await;
    let platform = FakePlatform::new();
    let reconciler = reconciler(&pool, &platform);

    let pending = movie(1, MediaStatus::Pending);
    reconciler.reconcile(&pending).await.unwrap();

    let available = movie(1, MediaStatus::Available);
    let outcome = reconciler.reconcile(&available).await.unwrap();
    assert_eq!(
        outcome,
        ReconcileOutcome::Updated {
            sink_object_id: "msg-1".into(),
            events: 1
        }
    );

    let thread = platform.thread_of("msg-1").expect("thread started");
    assert_eq!(platform.titles_in(&thread), vec!["Status → Available"]);

    let state = platform.state.lock().unwrap();
    assert_eq!(state.edits, vec!["msg-1"]);
    assert_eq!(state.threads, vec![("msg-1".to_string(), "Movie 1".to_string())]);
    assert_eq!(state.members, vec![(thread.clone(), "111".to_string())]);
    drop(state);

    let snapshot = snapshots::get(&pool, available.key()).await.unwrap().unwrap();
    assert_eq!(snapshot.last_state["status"], "Available");
}

#[tokio::test]
async fn season_and_episode_events_in_order() {
    let pool = test_pool().await;
    let platform = FakePlatform::new();
    let reconciler = reconciler(&pool, &platform);

    let before = show(
        3,
        MediaStatus::Processing,
        &[(1, "yn"), (2, "nnn")],
    );
    reconciler.reconcile(&before).await.unwrap();

    let after = show(
        3,
        MediaStatus::Processing,
        &[(1, "yy"), (2, "yny")],
    );
    let outcome = reconciler.reconcile(&after).await.unwrap();
    assert_eq!(outcome.events(), 3);

    let thread = platform.thread_of("msg-1").unwrap();
    assert_eq!(
        platform.titles_in(&thread),
        vec![
            "Season 1 → Available",
            "Episode S2E1 → Available",
            "Episode S2E3 → Available",
        ]
    );
}

#[tokio::test]
async fn existing_thread_is_reused() {
    let pool = test_pool().await;
    let platform = FakePlatform::new();
    let reconciler = reconciler(&pool, &platform);

    reconciler
        .reconcile(&movie(1, MediaStatus::Pending))
        .await
        .unwrap();
    reconciler
        .reconcile(&movie(1, MediaStatus::Processing))
        .await
        .unwrap();
    reconciler
        .reconcile(&movie(1, MediaStatus::Available))
        .await
        .unwrap();

    let thread = platform.thread_of("msg-1").unwrap();
    assert_eq!(
        platform.titles_in(&thread),
        vec!["Status → Processing", "Status → Available"]
    );
    let state = platform.state.lock().unwrap();
    assert_eq!(state.threads.len(), 1);
    assert_eq!(state.members.len(), 1, "participants added only on thread creation");
}

#[tokio::test]
async fn vanished_message_is_recreated() {
    let pool = test_pool().await;
    let platform = FakePlatform::new();
    let reconciler = reconciler(&pool, &platform);

    let pending = movie(1, MediaStatus::Pending);
    reconciler.reconcile(&pending).await.unwrap();
    platform.delete_message("msg-1");

    let available = movie(1, MediaStatus::Available);
    let outcome = reconciler.reconcile(&available).await.unwrap();
    let ReconcileOutcome::Updated {
        sink_object_id,
        events,
    } = outcome
    else {
        panic!("expected an updated outcome, got {outcome:?}");
    };
    assert_ne!(sink_object_id, "msg-1");
    assert_eq!(events, 1);

    assert!(
        snapshots::get_by_sink_object_id(&pool, "msg-1")
            .await
            .unwrap()
            .is_none()
    );
    let snapshot = snapshots::get(&pool, available.key()).await.unwrap().unwrap();
    assert_eq!(snapshot.sink_object_id, sink_object_id);
    assert_eq!(snapshots::list(&pool).await.unwrap().len(), 1);

    let thread = platform.thread_of(&sink_object_id).unwrap();
    assert_eq!(platform.titles_in(&thread), vec!["Status → Available"]);
}

#[tokio::test]
async fn edit_reporting_not_found_recreates() {
    let pool = test_pool().await;
    let platform = FakePlatform::new();
    let reconciler = reconciler(&pool, &platform);

    reconciler
        .reconcile(&movie(1, MediaStatus::Pending))
        .await
        .unwrap();
    platform.state.lock().unwrap().edits_vanish = true;

    let record = movie(1, MediaStatus::Processing);
    reconciler.reconcile(&record).await.unwrap();

    let snapshot = snapshots::get(&pool, record.key()).await.unwrap().unwrap();
    assert_ne!(snapshot.sink_object_id, "msg-1");
    assert_eq!(platform.titles_in(CHANNEL), vec!["Movie 1", "Movie 1"]);
}

#[tokio::test]
async fn failing_participant_does_not_block_others() {
    let pool = test_pool().await;
    let platform = FakePlatform::new();
    platform
        .state
        .lock()
        .unwrap()
        .failing_members
        .insert("111".into());
    let reconciler = reconciler(&pool, &platform);

    reconciler
        .reconcile(&show(2, MediaStatus::Pending, &[]))
        .await
        .unwrap();
    let outcome = reconciler
        .reconcile(&show(2, MediaStatus::Processing, &[]))
        .await
        .unwrap();
    assert_eq!(outcome.events(), 1);

    let thread = platform.thread_of("msg-1").unwrap();
    let state = platform.state.lock().unwrap();
    // Bob has no chat id, Alice's add fails
    assert_eq!(state.members, vec![(thread, "333".to_string())]);
}

#[tokio::test]
async fn sink_failure_leaves_no_snapshot() {
    let pool = test_pool().await;
    let platform = FakePlatform::new();
    platform.state.lock().unwrap().fail_sends = true;
    let reconciler = reconciler(&pool, &platform);

    let record = movie(9, MediaStatus::Pending);
    assert!(reconciler.reconcile(&record).await.is_err());
    assert!(snapshots::get(&pool, record.key()).await.unwrap().is_none());
}

#[tokio::test]
async fn older_snapshot_shape_diffs_as_not_previously_available() {
    let pool = test_pool().await;
    let platform = FakePlatform::new();
    let reconciler = reconciler(&pool, &platform);

    let record = show(5, MediaStatus::Pending, &[(1, "y"), (2, "n")]);
    // Written before seasons were tracked.
    snapshots::insert(
        &pool,
        record.key(),
        "msg-old",
        &serde_json::json!({ "id": 5, "title": "Show 5", "status": "Pending" }),
    )
    .await
    .unwrap();

    let outcome = reconciler.reconcile(&record).await.unwrap();
    assert_eq!(outcome.events(), 1);

    let snapshot = snapshots::get(&pool, record.key()).await.unwrap().unwrap();
    let thread = platform.thread_of(&snapshot.sink_object_id).unwrap();
    assert_eq!(platform.titles_in(&thread), vec!["Season 1 → Available"]);
}

#[tokio::test]
async fn failed_fetch_keeps_snapshot_and_sends_nothing() {
    let pool = test_pool().await;
    let platform = FakePlatform::new();
    let reconciler = reconciler(&pool, &platform);

    let pending = movie(1, MediaStatus::Pending);
    reconciler.reconcile(&pending).await.unwrap();
    platform.state.lock().unwrap().fail_fetches = true;

    assert!(
        reconciler
            .reconcile(&movie(1, MediaStatus::Processing))
            .await
            .is_err()
    );

    let snapshot = snapshots::get(&pool, pending.key()).await.unwrap().unwrap();
    assert_eq!(snapshot.sink_object_id, "msg-1");
    assert_eq!(snapshot.last_state["status"], "Pending");
    assert_eq!(platform.titles_in(CHANNEL), vec!["Movie 1"]);
}

#[tokio::test]
async fn failed_recreate_is_retried_with_events() {
    let pool = test_pool().await;
    let platform = FakePlatform::new();
    let reconciler = reconciler(&pool, &platform);

    let pending = movie(1, MediaStatus::Pending);
    reconciler.reconcile(&pending).await.unwrap();
    platform.delete_message("msg-1");
    platform.state.lock().unwrap().fail_sends = true;

    assert!(
        reconciler
            .reconcile(&movie(1, MediaStatus::Processing))
            .await
            .is_err()
    );
    let snapshot = snapshots::get(&pool, pending.key()).await.unwrap().unwrap();
    assert_eq!(snapshot.sink_object_id, "msg-1");
    assert_eq!(snapshot.last_state["status"], "Pending");

    platform.state.lock().unwrap().fail_sends = false;
    let outcome = reconciler
        .reconcile(&movie(1, MediaStatus::Available))
        .await
        .unwrap();
    let ReconcileOutcome::Updated {
        sink_object_id,
        events,
    } = outcome
    else {
        panic!("expected an updated outcome, got {outcome:?}");
    };
    assert_ne!(sink_object_id, "msg-1");
    assert_eq!(events, 1);

    let thread = platform.thread_of(&sink_object_id).unwrap();
    assert_eq!(platform.titles_in(&thread), vec!["Status → Available"]);
}

#[tokio::test]
async fn deleted_thread_is_replaced() {
    let pool = test_pool().await;
    let platform = FakePlatform::new();
    let reconciler = reconciler(&pool, &platform);

    reconciler
        .reconcile(&movie(1, MediaStatus::Pending))
        .await
        .unwrap();
    reconciler
        .reconcile(&movie(1, MediaStatus::Processing))
        .await
        .unwrap();
    let old_thread = platform.thread_of("msg-1").unwrap();
    platform.delete_thread(&old_thread);

    let outcome = reconciler
        .reconcile(&movie(1, MediaStatus::Available))
        .await
        .unwrap();
    assert_eq!(outcome.events(), 1);

    let new_thread = platform.thread_of("msg-1").unwrap();
    assert_ne!(new_thread, old_thread);
    assert_eq!(platform.titles_in(&new_thread), vec!["Status → Available"]);

    let state = platform.state.lock().unwrap();
    assert_eq!(state.threads.len(), 2);
    assert_eq!(state.members.len(), 2);
}
