// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory source and store for driving the orchestrator offline.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use workout_sync::db::{measurements, PointStore};
use workout_sync::error::{Result, SyncError};
use workout_sync::models::{ExerciseEntry, Point, SetEntry, WorkoutId, WorkoutRecord};
use workout_sync::services::WorkoutSource;
use workout_sync::shutdown::ShutdownSignal;

/// Build a workout with one exercise per `(name, muscles, sets)` entry.
#[allow(dead_code)]
pub fn workout(id: &str, exercises: &[(&str, &[&str], &[(u32, f64)])]) -> WorkoutRecord {
    WorkoutRecord {
        id: WorkoutId::new(id),
        name: format!("Workout {}", id),
        start_time: Some("2024-05-01T17:00:00Z".to_string()),
        end_time: Some("2024-05-01T18:15:00Z".to_string()),
        duration: Some(4500.0),
        exercises: exercises
            .iter()
            .map(|(name, muscles, sets)| ExerciseEntry {
                id: name.to_string(),
                name: name.to_string(),
                muscles: muscles.iter().map(|m| m.to_string()).collect(),
                sets: sets
                    .iter()
                    .map(|&(reps, weight)| SetEntry { reps, weight })
                    .collect(),
            })
            .collect(),
    }
}

/// Source serving a fixed listing and records, recording every fetch.
#[derive(Default)]
pub struct FakeSource {
    pub ids: Vec<WorkoutId>,
    pub records: HashMap<WorkoutId, WorkoutRecord>,
    pub fetched: Mutex<Vec<WorkoutId>>,
    pub list_calls: AtomicUsize,
    pub fail_listing: bool,
    /// Trigger this signal when the first workout is fetched.
    pub shutdown_on_fetch: Option<ShutdownSignal>,
}

#[allow(dead_code)]
impl FakeSource {
    pub fn new(records: Vec<WorkoutRecord>) -> Self {
        Self {
            ids: records.iter().map(|r| r.id.clone()).collect(),
            records: records.into_iter().map(|r| (r.id.clone(), r)).collect(),
            ..Self::default()
        }
    }

    /// List an ID that has no record behind it.
    pub fn with_unknown_id(mut self, id: &str) -> Self {
        self.ids.push(WorkoutId::new(id));
        self
    }

    pub fn fetched(&self) -> Vec<WorkoutId> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkoutSource for FakeSource {
    async fn list_workout_ids(&self) -> Result<Vec<WorkoutId>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing {
            return Err(SyncError::RemoteUnavailable(
                "connection refused".to_string(),
            ));
        }
        Ok(self.ids.clone())
    }

    async fn get_workout_detail(&self, id: &WorkoutId) -> Result<WorkoutRecord> {
        self.fetched.lock().unwrap().push(id.clone());
        if let Some(signal) = &self.shutdown_on_fetch {
            signal.trigger();
        }
        self.records
            .get(id)
            .cloned()
            .ok_or_else(|| SyncError::NotFound(id.to_string()))
    }
}

/// Store keeping points in memory and counting every call.
#[derive(Default)]
pub struct SpyStore {
    pub points: Mutex<Vec<Point>>,
    pub write_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub query_calls: AtomicUsize,
    pub fail_query: bool,
    /// Reject any write containing this workout.
    pub fail_write_for: Option<WorkoutId>,
}

#[allow(dead_code)]
impl SpyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with the points of already-imported workouts.
    pub fn with_points(points: Vec<Point>) -> Self {
        Self {
            points: Mutex::new(points),
            ..Self::default()
        }
    }

    pub fn writes(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn mutations(&self) -> usize {
        self.writes() + self.deletes()
    }

    /// Stored points encoded as line protocol, sorted.
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .points
            .lock()
            .unwrap()
            .iter()
            .map(Point::to_line_protocol)
            .collect();
        lines.sort();
        lines
    }

    pub fn points_for(&self, id: &str) -> usize {
        self.points
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.tags.get("workout_id").map(String::as_str) == Some(id))
            .count()
    }
}

#[async_trait]
impl PointStore for SpyStore {
    async fn list_stored_workout_ids(&self, _bucket: &str) -> Result<HashSet<WorkoutId>> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_query {
            return Err(SyncError::StoreQuery("timeout".to_string()));
        }
        Ok(self
            .points
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.measurement == measurements::WORKOUT_SUMMARY)
            .filter_map(|p| p.tags.get("workout_id"))
            .map(|id| WorkoutId::new(id.as_str()))
            .collect())
    }

    async fn write_points(&self, _bucket: &str, points: &[Point]) -> Result<()> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(bad) = &self.fail_write_for {
            if points
                .iter()
                .any(|p| p.tags.get("workout_id").map(String::as_str) == Some(bad.as_str()))
            {
                return Err(SyncError::StoreWrite("HTTP 500: boom".to_string()));
            }
        }
        self.points.lock().unwrap().extend_from_slice(points);
        Ok(())
    }

    async fn delete_all(&self, _bucket: &str) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.points.lock().unwrap().clear();
        Ok(())
    }
}
