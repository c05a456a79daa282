// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end sync runs against in-memory source and store.

use std::sync::atomic::Ordering;

use workout_sync::config::Config;
use workout_sync::error::{SyncError, SyncStage};
use workout_sync::models::{FieldValue, WorkoutId};
use workout_sync::services::{transform, SyncOptions, SyncOrchestrator, SyncReport};
use workout_sync::shutdown::ShutdownSignal;

mod common;
use common::{workout, FakeSource, SpyStore};

fn two_workouts() -> FakeSource {
    FakeSource::new(vec![
        workout(
            "W1",
            &[("bench_press", &["Chest", "Triceps"], &[(10, 50.0), (8, 55.0)])],
        ),
        workout(
            "W2",
            &[
                ("squat", &["Quadriceps"], &[(5, 100.0), (5, 100.0), (5, 105.0)]),
                ("plank", &[], &[(1, 0.0)]),
            ],
        ),
    ])
}

async fn run(
    source: &FakeSource,
    store: &SpyStore,
    options: SyncOptions,
) -> (Result<SyncReport, SyncError>, SyncStage) {
    let config = Config::test_default();
    let mut orchestrator = SyncOrchestrator::new(&config, source, store, ShutdownSignal::new());
    let result = orchestrator.run(options).await;
    (result, orchestrator.stage())
}

fn reset() -> SyncOptions {
    SyncOptions {
        reset: true,
        ..SyncOptions::incremental()
    }
}

fn dry_run(sample_size: usize) -> SyncOptions {
    SyncOptions {
        reset: false,
        dry_run: true,
        sample_size,
    }
}

#[tokio::test]
async fn test_incremental_fetches_only_new_workouts() {
    let source = two_workouts();
    let w1 = transform(&workout("W1", &[("bench_press", &["Chest"], &[(10, 50.0)])]))
        .unwrap()
        .points();
    let store = SpyStore::with_points(w1.clone());

    let (result, stage) = run(&source, &store, SyncOptions::incremental()).await;
    let report = result.expect("sync should succeed");

    assert_eq!(stage, SyncStage::Done);
    assert_eq!(source.fetched(), vec![WorkoutId::new("W2")]);
    assert_eq!(report.remote_total, 2);
    assert_eq!(report.stored_total, 1);
    assert_eq!(report.pending, 1);
    assert_eq!(report.processed, 1);
    // 1 summary + 4 sets
    assert_eq!(report.points, 5);
    assert_eq!(store.points_for("W2"), 5);
    // W1's existing points are untouched.
    assert_eq!(store.points_for("W1"), w1.len());
    assert_eq!(store.deletes(), 0);
}

#[tokio::test]
async fn test_second_run_writes_nothing() {
    let source = two_workouts();
    let store = SpyStore::new();

    let (first, _) = run(&source, &store, SyncOptions::incremental()).await;
    assert_eq!(first.unwrap().processed, 2);
    let writes_after_first = store.writes();
    assert_eq!(writes_after_first, 2);

    let (second, stage) = run(&source, &store, SyncOptions::incremental()).await;
    let report = second.unwrap();

    assert_eq!(stage, SyncStage::Done);
    assert_eq!(report.pending, 0);
    assert_eq!(report.processed, 0);
    assert_eq!(store.writes(), writes_after_first);
    assert_eq!(source.fetched().len(), 2);
}

#[tokio::test]
async fn test_each_workout_is_one_write() {
    let source = two_workouts();
    let store = SpyStore::new();

    run(&source, &store, SyncOptions::incremental())
        .await
        .0
        .unwrap();

    assert_eq!(store.writes(), 2);
    assert_eq!(store.points_for("W1"), 3);
    assert_eq!(store.points_for("W2"), 5);
}

#[tokio::test]
async fn test_reset_reproduces_fresh_import() {
    let source = two_workouts();

    let fresh = SpyStore::new();
    run(&source, &fresh, SyncOptions::incremental())
        .await
        .0
        .unwrap();

    // Store holding stale data for W1 plus an orphan workout.
    let stale = transform(&workout("W1", &[("old", &[], &[(1, 1.0)])]))
        .unwrap()
        .points()
        .into_iter()
        .chain(
            transform(&workout("GONE", &[("x", &[], &[(2, 2.0)])]))
                .unwrap()
                .points(),
        )
        .collect();
    let reset_store = SpyStore::with_points(stale);

    let (result, stage) = run(&source, &reset_store, reset()).await;
    let report = result.unwrap();

    assert_eq!(stage, SyncStage::Done);
    assert_eq!(reset_store.deletes(), 1);
    // Reset never asks the store what it has.
    assert_eq!(reset_store.query_calls.load(Ordering::SeqCst), 0);
    assert_eq!(report.stored_total, 0);
    assert_eq!(report.processed, 2);
    assert_eq!(reset_store.lines(), fresh.lines());
}

#[tokio::test]
async fn test_dry_run_never_mutates_store() {
    let source = two_workouts();
    let real = SpyStore::new();
    let real_report = run(&source, &real, SyncOptions::incremental())
        .await
        .0
        .unwrap();

    let source = two_workouts();
    let spy = SpyStore::new();
    let (result, stage) = run(&source, &spy, dry_run(100)).await;
    let report = result.unwrap();

    assert_eq!(stage, SyncStage::Done);
    assert_eq!(spy.mutations(), 0);
    assert!(report.dry_run);
    assert_eq!(report.points, real_report.points);

    let mut sampled: Vec<String> = report.sample.iter().map(|p| p.to_line_protocol()).collect();
    sampled.sort();
    assert_eq!(sampled, real.lines());
}

#[tokio::test]
async fn test_dry_run_sample_is_bounded() {
    let source = two_workouts();
    let store = SpyStore::new();

    let report = run(&source, &store, dry_run(4)).await.0.unwrap();

    assert_eq!(report.sample.len(), 4);
    assert_eq!(report.points, 8);
    assert_eq!(report.sample[0].measurement, "workout_summary");
}

#[tokio::test]
async fn test_dry_run_reset_skips_delete() {
    let source = two_workouts();
    let store = SpyStore::new();
    let options = SyncOptions {
        reset: true,
        dry_run: true,
        sample_size: 1,
    };

    let report = run(&source, &store, options).await.0.unwrap();

    assert_eq!(store.mutations(), 0);
    assert_eq!(report.processed, 2);
}

#[tokio::test]
async fn test_empty_remote_is_success() {
    let source = FakeSource::new(vec![]);
    let store = SpyStore::new();

    let (result, stage) = run(&source, &store, SyncOptions::incremental()).await;
    let report = result.unwrap();

    assert_eq!(stage, SyncStage::Done);
    assert_eq!(report.remote_total, 0);
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn test_listing_failure_is_fatal() {
    let source = FakeSource {
        fail_listing: true,
        ..two_workouts()
    };
    let store = SpyStore::new();

    let (result, stage) = run(&source, &store, SyncOptions::incremental()).await;
    let err = result.unwrap_err();

    assert_eq!(stage, SyncStage::Listing);
    assert_eq!(err.stage(), Some(SyncStage::Listing));
    assert!(matches!(err.root(), SyncError::RemoteUnavailable(_)));
    assert_eq!(store.query_calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn test_store_query_failure_is_fatal() {
    let source = two_workouts();
    let store = SpyStore {
        fail_query: true,
        ..SpyStore::new()
    };

    let (result, _) = run(&source, &store, SyncOptions::incremental()).await;
    let err = result.unwrap_err();

    assert_eq!(err.stage(), Some(SyncStage::Diffing));
    assert!(matches!(err.root(), SyncError::StoreQuery(_)));
    assert!(source.fetched().is_empty());
}

#[tokio::test]
async fn test_not_found_aborts_run_and_names_workout() {
    let source = FakeSource::new(vec![workout("W1", &[("row", &[], &[(8, 40.0)])])])
        .with_unknown_id("W404");
    let store = SpyStore::new();

    let (result, stage) = run(&source, &store, SyncOptions::incremental()).await;
    let err = result.unwrap_err();

    assert_eq!(stage, SyncStage::Fetching);
    assert_eq!(err.workout_id(), Some(&WorkoutId::new("W404")));
    assert_eq!(err.stage(), Some(SyncStage::Fetching));
    assert!(matches!(err.root(), SyncError::NotFound(_)));
    assert!(err.to_string().contains("W404"));
    // W1 was completed before the failure.
    assert_eq!(store.points_for("W1"), 2);
}

#[tokio::test]
async fn test_malformed_record_aborts_before_later_workouts() {
    let mut broken = workout("W1", &[("row", &[], &[(8, 40.0)])]);
    broken.end_time = None;
    let source = FakeSource::new(vec![
        broken,
        workout("W2", &[("row", &[], &[(8, 40.0)])]),
    ]);
    let store = SpyStore::new();

    let (result, _) = run(&source, &store, SyncOptions::incremental()).await;
    let err = result.unwrap_err();

    assert_eq!(err.stage(), Some(SyncStage::Transforming));
    assert!(matches!(err.root(), SyncError::MalformedRecord(_)));
    assert_eq!(source.fetched(), vec![WorkoutId::new("W1")]);
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn test_write_failure_leaves_workout_pending_for_next_run() {
    let source = two_workouts();
    let store = SpyStore {
        fail_write_for: Some(WorkoutId::new("W2")),
        ..SpyStore::new()
    };

    let (result, _) = run(&source, &store, SyncOptions::incremental()).await;
    let err = result.unwrap_err();
    assert_eq!(err.stage(), Some(SyncStage::Writing));
    assert!(matches!(err.root(), SyncError::StoreWrite(_)));
    assert_eq!(store.points_for("W2"), 0);

    // Store recovers; the next incremental run picks W2 up.
    let recovered = SpyStore::with_points(store.points.lock().unwrap().clone());
    let source = two_workouts();
    let report = run(&source, &recovered, SyncOptions::incremental())
        .await
        .0
        .unwrap();
    assert_eq!(source.fetched(), vec![WorkoutId::new("W2")]);
    assert_eq!(report.processed, 1);
}

#[tokio::test]
async fn test_shutdown_stops_before_next_workout() {
    let shutdown = ShutdownSignal::new();
    let source = FakeSource {
        shutdown_on_fetch: Some(shutdown.clone()),
        ..two_workouts()
    };
    let store = SpyStore::new();
    let config = Config::test_default();

    let mut orchestrator = SyncOrchestrator::new(&config, &source, &store, shutdown);
    let err = orchestrator
        .run(SyncOptions::incremental())
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Interrupted(ref id) if id.as_str() == "W2"));
    // The unit in flight when the signal arrived was completed.
    assert_eq!(store.points_for("W1"), 3);
    assert_eq!(store.points_for("W2"), 0);
    assert_eq!(source.fetched(), vec![WorkoutId::new("W1")]);
}

#[tokio::test]
async fn test_written_points_follow_schema() {
    let source = FakeSource::new(vec![workout(
        "W1",
        &[("bench_press", &["Chest", "Triceps"], &[(10, 50.0), (10, 50.0), (8, 45.0)])],
    )]);
    let store = SpyStore::new();

    run(&source, &store, SyncOptions::incremental())
        .await
        .0
        .unwrap();

    let points = store.points.lock().unwrap().clone();
    let details: Vec<_> = points.iter().filter(|p| p.measurement == "workouts").collect();
    assert_eq!(details.len(), 3);

    let volumes: Vec<FieldValue> = details.iter().map(|p| p.fields["volume"]).collect();
    assert_eq!(
        volumes,
        vec![
            FieldValue::Float(500.0),
            FieldValue::Float(500.0),
            FieldValue::Float(360.0)
        ]
    );
    for (i, point) in details.iter().enumerate() {
        assert_eq!(point.fields["set_number"], FieldValue::Integer(i as i64 + 1));
        assert_eq!(point.fields["workout_duration"], FieldValue::Float(4500.0));
        assert_eq!(point.tags["muscle_chest"], "true");
        assert_eq!(point.tags["muscle_triceps"], "true");
        assert_eq!(point.tags["exercise_name"], "bench_press");
    }
}
