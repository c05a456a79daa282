// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout record → time-series points.
//!
//! Pure: no I/O, identical input gives identical output.
//!
//! Set numbers restart at 1 for every exercise and come from the position
//! of the set in the response, never from an upstream index.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use crate::error::{Result, SyncError};
use crate::models::{
    DetailPoint, SummaryPoint, TransformedWorkout, WorkoutId, WorkoutRecord,
};
use crate::time_utils::parse_rfc3339_utc;

/// Transform one workout into its summary point and one detail point per set.
pub fn transform(record: &WorkoutRecord) -> Result<TransformedWorkout> {
    if record.id.as_str().trim().is_empty() {
        return Err(SyncError::MalformedRecord(
            "workout has no identifier".to_string(),
        ));
    }

    let start_time = parse_time(&record.id, "start time", record.start_time.as_deref())?;
    let end_time = parse_time(&record.id, "end time", record.end_time.as_deref())?;

    let duration = match record.duration {
        Some(seconds) => seconds,
        None => (end_time - start_time).num_milliseconds() as f64 / 1000.0,
    };
    if !duration.is_finite() || duration < 0.0 {
        return Err(SyncError::MalformedRecord(format!(
            "workout {}: invalid duration {}",
            record.id, duration
        )));
    }

    let summary = SummaryPoint {
        workout_id: record.id.clone(),
        workout_name: record.name.clone(),
        start_time,
        duration,
    };

    let mut details = Vec::with_capacity(record.total_sets());
    for exercise in &record.exercises {
        let muscles: BTreeSet<String> = exercise
            .muscles
            .iter()
            .filter_map(|m| normalize_muscle(m))
            .collect();

        for (index, set) in exercise.sets.iter().enumerate() {
            if !set.weight.is_finite() || set.weight < 0.0 {
                return Err(SyncError::MalformedRecord(format!(
                    "workout {} exercise {}: invalid weight {}",
                    record.id, exercise.id, set.weight
                )));
            }

            let set_number = u32::try_from(index + 1).map_err(|_| {
                SyncError::MalformedRecord(format!(
                    "workout {} exercise {}: too many sets",
                    record.id, exercise.id
                ))
            })?;

            details.push(DetailPoint {
                workout_id: record.id.clone(),
                workout_name: record.name.clone(),
                exercise_name: exercise.name.clone(),
                muscles: muscles.clone(),
                end_time,
                reps: set.reps,
                weight: set.weight,
                volume: f64::from(set.reps) * set.weight,
                set_number,
                workout_duration: duration,
            });
        }
    }

    Ok(TransformedWorkout { summary, details })
}

/// Lowercase, spaces and hyphens → underscores. Blank names are dropped.
pub fn normalize_muscle(raw: &str) -> Option<String> {
    let name = raw.trim().to_lowercase().replace([' ', '-'], "_");
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

fn parse_time(id: &WorkoutId, what: &str, raw: Option<&str>) -> Result<DateTime<Utc>> {
    let raw = raw
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| SyncError::MalformedRecord(format!("workout {}: missing {}", id, what)))?;

    let time = parse_rfc3339_utc(raw).map_err(|e| {
        SyncError::MalformedRecord(format!("workout {}: invalid {} {:?}: {}", id, what, raw, e))
    })?;

    // Line protocol timestamps are i64 nanoseconds.
    if time.timestamp_nanos_opt().is_none() {
        return Err(SyncError::MalformedRecord(format!(
            "workout {}: {} out of range",
            id, what
        )));
    }

    Ok(time)
}
