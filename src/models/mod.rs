// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod point;
pub mod workout;

pub use point::{DetailPoint, FieldValue, Point, SummaryPoint, TransformedWorkout};
pub use workout::{ExerciseEntry, SetEntry, WorkoutId, WorkoutRecord};
