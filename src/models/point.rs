// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Time-series points and their InfluxDB line-protocol encoding.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use crate::db::measurements;
use crate::models::WorkoutId;

/// Typed field value. Integers are encoded with the `i` suffix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
}

/// A single time-series point.
///
/// Tags and fields are kept sorted so two equal points always encode to
/// the same bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, FieldValue>,
    pub timestamp: DateTime<Utc>,
}

impl Point {
    pub fn new(measurement: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            timestamp,
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Encode as one line of InfluxDB line protocol (nanosecond precision).
    ///
    /// Tags with empty values are omitted; line protocol cannot represent them.
    pub fn to_line_protocol(&self) -> String {
        let mut line = escape(&self.measurement, &[',', ' ']);

        for (key, value) in &self.tags {
            if value.is_empty() {
                continue;
            }
            let _ = write!(
                line,
                ",{}={}",
                escape(key, TAG_SPECIAL),
                escape(value, TAG_SPECIAL)
            );
        }

        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|(key, value)| {
                let key = escape(key, TAG_SPECIAL);
                match value {
                    FieldValue::Integer(v) => format!("{}={}i", key, v),
                    FieldValue::Float(v) => format!("{}={}", key, v),
                }
            })
            .collect();
        line.push(' ');
        line.push_str(&fields.join(","));

        // Out-of-range times are rejected at transform time.
        if let Some(ns) = self.timestamp.timestamp_nanos_opt() {
            let _ = write!(line, " {}", ns);
        }
        line
    }
}

/// Characters escaped in tag keys, tag values and field keys. A trailing
/// `\` would otherwise escape the following separator.
const TAG_SPECIAL: &[char] = &['\\', ',', '=', ' '];

fn escape(raw: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        // Newlines would terminate the line.
        let c = if c == '\n' || c == '\r' { ' ' } else { c };
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Per-workout summary, stored in `workout_summary`.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryPoint {
    pub workout_id: WorkoutId,
    pub workout_name: String,
    pub start_time: DateTime<Utc>,
    /// Seconds
    pub duration: f64,
}

impl SummaryPoint {
    pub fn to_point(&self) -> Point {
        Point::new(measurements::WORKOUT_SUMMARY, self.start_time)
            .tag("workout_id", self.workout_id.as_str())
            .tag("workout_name", self.workout_name.as_str())
            .field("duration", FieldValue::Float(self.duration))
    }
}

/// One performed set, stored in `workouts`.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailPoint {
    pub workout_id: WorkoutId,
    pub workout_name: String,
    pub exercise_name: String,
    /// Normalized muscle names (without the `muscle_` prefix)
    pub muscles: BTreeSet<String>,
    pub end_time: DateTime<Utc>,
    pub reps: u32,
    pub weight: f64,
    pub volume: f64,
    /// 1-based position within the exercise
    pub set_number: u32,
    /// Seconds, repeated on every set of the workout
    pub workout_duration: f64,
}

impl DetailPoint {
    pub fn to_point(&self) -> Point {
        let mut point = Point::new(measurements::WORKOUTS, self.end_time)
            .tag("workout_id", self.workout_id.as_str())
            .tag("workout_name", self.workout_name.as_str())
            .tag("exercise_name", self.exercise_name.as_str());

        for muscle in &self.muscles {
            point = point.tag(format!("muscle_{}", muscle), "true");
        }

        point
            .field("reps", FieldValue::Integer(i64::from(self.reps)))
            .field("weight", FieldValue::Float(self.weight))
            .field("volume", FieldValue::Float(self.volume))
            .field("set_number", FieldValue::Integer(i64::from(self.set_number)))
            .field("workout_duration", FieldValue::Float(self.workout_duration))
    }
}

/// Output of transforming one workout record.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedWorkout {
    pub summary: SummaryPoint,
    pub details: Vec<DetailPoint>,
}

impl TransformedWorkout {
    /// All points of this workout, summary first. Written as one unit.
    pub fn points(&self) -> Vec<Point> {
        std::iter::once(self.summary.to_point())
            .chain(self.details.iter().map(DetailPoint::to_point))
            .collect()
    }
}
