// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Storage layer (InfluxDB).

pub mod influx;

pub use influx::InfluxDb;

use async_trait::async_trait;
use std::collections::HashSet;

use crate::error::Result;
use crate::models::{Point, WorkoutId};

/// Measurement names as constants.
pub mod measurements {
    /// One point per workout, timestamped at the workout start.
    pub const WORKOUT_SUMMARY: &str = "workout_summary";
    /// One point per performed set, timestamped at the workout end.
    pub const WORKOUTS: &str = "workouts";

    /// Every measurement this tool owns, in deletion order.
    pub const ALL: [&str; 2] = [WORKOUTS, WORKOUT_SUMMARY];
}

/// Time-series store the sync writes into.
#[async_trait]
pub trait PointStore: Send + Sync {
    /// Workout IDs that already have a summary point in `bucket`.
    async fn list_stored_workout_ids(&self, bucket: &str) -> Result<HashSet<WorkoutId>>;

    /// Write a batch of points in a single request.
    async fn write_points(&self, bucket: &str, points: &[Point]) -> Result<()>;

    /// Delete everything this tool has written to `bucket`.
    async fn delete_all(&self, bucket: &str) -> Result<()>;
}
