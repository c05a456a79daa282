// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Workout records as fetched from the remote source.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of one remote workout (the idempotency key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutId(String);

impl WorkoutId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for WorkoutId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for WorkoutId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// One fetched workout. Lives for a single sync run.
///
/// Timestamps are kept as the raw upstream strings; validation happens
/// when the record is transformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    /// Remote workout ID
    pub id: WorkoutId,
    /// Workout name/title
    pub name: String,
    /// Start time (RFC 3339)
    pub start_time: Option<String>,
    /// End time (RFC 3339)
    pub end_time: Option<String>,
    /// Duration in seconds
    pub duration: Option<f64>,
    /// Exercises in the order they were performed
    pub exercises: Vec<ExerciseEntry>,
}

impl WorkoutRecord {
    /// Total number of sets across all exercises.
    pub fn total_sets(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }
}

/// One exercise within a workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseEntry {
    /// Upstream exercise ID (used for muscle lookups)
    pub id: String,
    /// Tag-safe exercise name
    pub name: String,
    /// Muscle groups as reported upstream (not normalized)
    pub muscles: Vec<String>,
    /// Sets in performed order; position gives the set number
    pub sets: Vec<SetEntry>,
}

/// One set of an exercise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetEntry {
    pub reps: u32,
    pub weight: f64,
}
