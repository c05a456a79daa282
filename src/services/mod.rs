// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod diff;
pub mod ryot;
pub mod sync;
pub mod transform;

pub use diff::pending_ids;
pub use ryot::RyotClient;
pub use sync::{SyncOptions, SyncOrchestrator, SyncReport};
pub use transform::transform;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{WorkoutId, WorkoutRecord};

/// Remote system that owns the workout history.
#[async_trait]
pub trait WorkoutSource: Send + Sync {
    /// Every workout ID, in the order the source lists them.
    async fn list_workout_ids(&self) -> Result<Vec<WorkoutId>>;

    /// Full details of one workout.
    async fn get_workout_detail(&self, id: &WorkoutId) -> Result<WorkoutRecord>;
}
