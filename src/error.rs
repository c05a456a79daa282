// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sync error types.
//!
//! Every failure is fatal to the run. The context wrappers record which
//! stage failed and, for per-workout failures, which workout.

use std::fmt;

use crate::models::WorkoutId;

/// Stages of a sync run, in the order they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    Idle,
    Resetting,
    Listing,
    Diffing,
    Fetching,
    Transforming,
    Writing,
    Done,
}

impl SyncStage {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncStage::Idle => "idle",
            SyncStage::Resetting => "resetting",
            SyncStage::Listing => "listing",
            SyncStage::Diffing => "diffing",
            SyncStage::Fetching => "fetching",
            SyncStage::Transforming => "transforming",
            SyncStage::Writing => "writing",
            SyncStage::Done => "done",
        }
    }
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Remote API unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Workout not found: {0}")]
    NotFound(String),

    #[error("Malformed workout record: {0}")]
    MalformedRecord(String),

    #[error("Store write failed: {0}")]
    StoreWrite(String),

    #[error("Store query failed: {0}")]
    StoreQuery(String),

    #[error("Interrupted before workout {0}")]
    Interrupted(WorkoutId),

    #[error("{stage} failed")]
    Stage {
        stage: SyncStage,
        #[source]
        source: Box<SyncError>,
    },

    #[error("Workout {workout_id} failed while {stage}")]
    Workout {
        workout_id: WorkoutId,
        stage: SyncStage,
        #[source]
        source: Box<SyncError>,
    },
}

impl SyncError {
    /// Marker placed in `RemoteUnavailable` messages for rejected credentials.
    pub const REMOTE_AUTH_ERROR: &'static str = "Ryot rejected the auth token (401)";

    /// Wrap a run-level failure with the stage it happened in.
    pub fn at(self, stage: SyncStage) -> Self {
        SyncError::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// Wrap a per-workout failure with the workout and stage.
    pub fn for_workout(self, workout_id: &WorkoutId, stage: SyncStage) -> Self {
        SyncError::Workout {
            workout_id: workout_id.clone(),
            stage,
            source: Box::new(self),
        }
    }

    /// The stage this error was raised in, if it carries one.
    pub fn stage(&self) -> Option<SyncStage> {
        match self {
            SyncError::Stage { stage, .. } | SyncError::Workout { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The workout this error names, if any.
    pub fn workout_id(&self) -> Option<&WorkoutId> {
        match self {
            SyncError::Workout { workout_id, .. } | SyncError::Interrupted(workout_id) => {
                Some(workout_id)
            }
            _ => None,
        }
    }

    /// The innermost error, with stage/workout context peeled off.
    pub fn root(&self) -> &SyncError {
        match self {
            SyncError::Stage { source, .. } | SyncError::Workout { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_remote_auth_error(&self) -> bool {
        matches!(self.root(), SyncError::RemoteUnavailable(msg) if msg.contains("401"))
    }
}

/// Result type alias for the sync core
pub type Result<T> = std::result::Result<T, SyncError>;
