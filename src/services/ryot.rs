// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ryot GraphQL client for listing and fetching workouts.
//!
//! Handles:
//! - Workout ID listing
//! - Workout detail fetching
//! - Per-exercise muscle lookups (cached for the life of the client)
//! - Decimal scalars that arrive either as JSON numbers or strings

use async_trait::async_trait;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Result, SyncError};
use crate::models::{ExerciseEntry, SetEntry, WorkoutId, WorkoutRecord};
use crate::services::WorkoutSource;

/// Ryot appends this to the IDs of user-created reps/weight exercises.
const USER_EXERCISE_SUFFIX: &str = "_reps_and_weight_usr_";

const LIST_WORKOUTS_QUERY: &str = r#"
query {
  userWorkoutsList(input: {search: {query: ""}}) {
    response {
      items
    }
  }
}
"#;

const WORKOUT_DETAILS_QUERY: &str = r#"
query ($workoutId: String!) {
  userWorkoutDetails(workoutId: $workoutId) {
    details {
      id
      name
      duration
      startTime
      endTime
      information {
        exercises {
          id
          sets {
            statistic {
              reps
              weight
            }
          }
        }
      }
    }
  }
}
"#;

const EXERCISE_DETAILS_QUERY: &str = r#"
query ($exerciseId: String!) {
  exerciseDetails(exerciseId: $exerciseId) {
    muscles
  }
}
"#;

/// Exercise ID → upstream muscle names.
pub type MuscleCache = Arc<DashMap<String, Vec<String>>>;

/// Ryot GraphQL API client.
#[derive(Clone)]
pub struct RyotClient {
    http: reqwest::Client,
    api_url: String,
    auth_token: String,
    muscle_cache: MuscleCache,
}

impl RyotClient {
    /// Create a new Ryot client with a static bearer token.
    pub fn new(
        api_url: &str,
        auth_token: String,
        timeout: Duration,
    ) -> std::result::Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_url: api_url.to_string(),
            auth_token,
            muscle_cache: Arc::new(DashMap::new()),
        })
    }

    /// Muscle groups for an exercise, from cache or the API.
    pub async fn exercise_muscles(&self, exercise_id: &str) -> Result<Vec<String>> {
        if let Some(cached) = self.muscle_cache.get(exercise_id) {
            return Ok(cached.value().clone());
        }

        let variables = serde_json::json!({ "exerciseId": exercise_id });
        let response: GraphQlResponse<ExerciseDetailsData> = self
            .post_graphql(EXERCISE_DETAILS_QUERY, Some(variables))
            .await?;

        let muscles = exercise_muscles_from_response(response, exercise_id)?;

        self.muscle_cache
            .insert(exercise_id.to_string(), muscles.clone());
        Ok(muscles)
    }

    /// POST a GraphQL query and decode the envelope.
    async fn post_graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Option<serde_json::Value>,
    ) -> Result<GraphQlResponse<T>> {
        let mut payload = serde_json::json!({ "query": query });
        if let Some(variables) = variables {
            payload["variables"] = variables;
        }

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.auth_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SyncError::RemoteUnavailable(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 {
                return Err(SyncError::RemoteUnavailable(
                    SyncError::REMOTE_AUTH_ERROR.to_string(),
                ));
            }

            if status.as_u16() == 429 {
                tracing::warn!("Ryot rate limit hit (429)");
            }

            return Err(SyncError::RemoteUnavailable(format!(
                "HTTP {}: {}",
                status,
                body.trim()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| SyncError::RemoteUnavailable(format!("JSON parse error: {}", e)))
    }
}

#[async_trait]
impl WorkoutSource for RyotClient {
    async fn list_workout_ids(&self) -> Result<Vec<WorkoutId>> {
        let response: GraphQlResponse<WorkoutsListData> =
            self.post_graphql(LIST_WORKOUTS_QUERY, None).await?;
        workout_ids_from_response(response)
    }

    async fn get_workout_detail(&self, id: &WorkoutId) -> Result<WorkoutRecord> {
        let variables = serde_json::json!({ "workoutId": id.as_str() });
        let response: GraphQlResponse<WorkoutDetailsData> = self
            .post_graphql(WORKOUT_DETAILS_QUERY, Some(variables))
            .await?;
        let details = workout_details_from_response(response, id)?;

        let mut muscles = HashMap::new();
        for exercise in &details.exercises() {
            if !muscles.contains_key(&exercise.id) {
                let found = self.exercise_muscles(&exercise.id).await?;
                muscles.insert(exercise.id.clone(), found);
            }
        }

        details.into_record(id, &muscles)
    }
}

// ─── Wire Types ──────────────────────────────────────────────────────────────

/// GraphQL response envelope.
#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

impl<T> GraphQlResponse<T> {
    /// All error messages joined, or "none".
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return "none".to_string();
        }
        self.errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutsListData {
    pub user_workouts_list: Option<WorkoutsList>,
}

#[derive(Debug, Deserialize)]
pub struct WorkoutsList {
    pub response: IdResults,
}

#[derive(Debug, Deserialize)]
pub struct IdResults {
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutDetailsData {
    pub user_workout_details: Option<UserWorkoutDetails>,
}

#[derive(Debug, Deserialize)]
pub struct UserWorkoutDetails {
    pub details: RyotWorkout,
}

/// Workout as returned by `userWorkoutDetails`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RyotWorkout {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_decimal")]
    pub duration: Option<f64>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub information: Option<RyotWorkoutInformation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RyotWorkoutInformation {
    #[serde(default)]
    pub exercises: Vec<RyotExercise>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RyotExercise {
    pub id: String,
    #[serde(default)]
    pub sets: Vec<RyotSet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RyotSet {
    pub statistic: Option<RyotSetStatistic>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RyotSetStatistic {
    #[serde(default, deserialize_with = "deserialize_decimal")]
    pub reps: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_decimal")]
    pub weight: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseDetailsData {
    pub exercise_details: Option<ExerciseDetails>,
}

#[derive(Debug, Deserialize)]
pub struct ExerciseDetails {
    #[serde(default)]
    pub muscles: Vec<String>,
}

impl RyotWorkout {
    /// Exercises in performed order (empty if `information` is absent).
    pub fn exercises(&self) -> Vec<RyotExercise> {
        self.information
            .as_ref()
            .map(|info| info.exercises.clone())
            .unwrap_or_default()
    }

    /// Convert into a `WorkoutRecord`, attaching looked-up muscles.
    ///
    /// A missing `id` leaves the record's ID empty so the transform rejects
    /// it; an ID that differs from the requested one is rejected here.
    pub fn into_record(
        self,
        requested: &WorkoutId,
        muscles: &HashMap<String, Vec<String>>,
    ) -> Result<WorkoutRecord> {
        if let Some(returned) = self.id.as_deref() {
            if returned != requested.as_str() {
                return Err(SyncError::MalformedRecord(format!(
                    "requested workout {} but received {}",
                    requested, returned
                )));
            }
        }

        let exercises = self
            .exercises()
            .into_iter()
            .map(|exercise| -> Result<ExerciseEntry> {
                let sets = exercise
                    .sets
                    .iter()
                    .map(|set| set_entry(set, requested, &exercise.id))
                    .collect::<Result<Vec<_>>>()?;
                Ok(ExerciseEntry {
                    name: exercise_name_from_id(&exercise.id),
                    muscles: muscles.get(&exercise.id).cloned().unwrap_or_default(),
                    sets,
                    id: exercise.id,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(WorkoutRecord {
            id: WorkoutId::new(self.id.unwrap_or_default()),
            name: self.name.unwrap_or_default(),
            start_time: self.start_time,
            end_time: self.end_time,
            duration: self.duration,
            exercises,
        })
    }
}

fn set_entry(set: &RyotSet, workout_id: &WorkoutId, exercise_id: &str) -> Result<SetEntry> {
    let statistic = set.statistic.clone().unwrap_or_default();
    let reps = statistic.reps.unwrap_or(0.0);

    if !reps.is_finite() || reps < 0.0 || reps.fract() != 0.0 || reps > f64::from(u32::MAX) {
        return Err(SyncError::MalformedRecord(format!(
            "workout {} exercise {}: invalid reps {}",
            workout_id, exercise_id, reps
        )));
    }

    Ok(SetEntry {
        reps: reps as u32,
        weight: statistic.weight.unwrap_or(0.0),
    })
}

/// Extract the listed workout IDs, failing on GraphQL errors.
pub fn workout_ids_from_response(
    response: GraphQlResponse<WorkoutsListData>,
) -> Result<Vec<WorkoutId>> {
    if !response.errors.is_empty() {
        return Err(SyncError::RemoteUnavailable(format!(
            "GraphQL errors: {}",
            response.error_summary()
        )));
    }

    let list = response
        .data
        .and_then(|d| d.user_workouts_list)
        .ok_or_else(|| {
            SyncError::RemoteUnavailable("userWorkoutsList missing from response".to_string())
        })?;

    Ok(list
        .response
        .items
        .into_iter()
        .map(WorkoutId::from)
        .collect())
}

/// Extract workout details; a null result means the workout does not exist.
pub fn workout_details_from_response(
    response: GraphQlResponse<WorkoutDetailsData>,
    id: &WorkoutId,
) -> Result<RyotWorkout> {
    let summary = response.error_summary();
    match response.data.and_then(|d| d.user_workout_details) {
        Some(details) => {
            if summary != "none" {
                tracing::warn!(workout_id = %id, errors = %summary, "Partial GraphQL errors");
            }
            Ok(details.details)
        }
        None => Err(SyncError::NotFound(format!("{} (errors: {})", id, summary))),
    }
}

/// Extract an exercise's muscles.
///
/// A clean null `exerciseDetails` means the exercise has no muscles. A null
/// alongside GraphQL errors is a failed lookup, not an empty one.
pub fn exercise_muscles_from_response(
    response: GraphQlResponse<ExerciseDetailsData>,
    exercise_id: &str,
) -> Result<Vec<String>> {
    let summary = response.error_summary();
    let has_errors = !response.errors.is_empty();

    match response.data.and_then(|d| d.exercise_details) {
        Some(details) => {
            if has_errors {
                tracing::warn!(exercise_id, errors = %summary, "Partial GraphQL errors");
            }
            Ok(details.muscles)
        }
        None if has_errors => Err(SyncError::RemoteUnavailable(format!(
            "muscle lookup for {} failed: {}",
            exercise_id, summary
        ))),
        None => {
            tracing::debug!(exercise_id, "No exercise details, treating as no muscles");
            Ok(Vec::new())
        }
    }
}

/// Derive a tag-safe exercise name from a Ryot exercise ID.
pub fn exercise_name_from_id(exercise_id: &str) -> String {
    let name = exercise_id
        .split(USER_EXERCISE_SUFFIX)
        .next()
        .unwrap_or(exercise_id);
    slugify(name)
}

/// Keep `[A-Za-z0-9_ -]` and whitespace, trim, lowercase, spaces → underscores.
pub fn slugify(text: &str) -> String {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();
    kept.trim().to_lowercase().replace(' ', "_")
}

/// Accept a decimal as a JSON number, a numeric string, or null.
fn deserialize_decimal<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| D::Error::custom("number out of range")),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|e| D::Error::custom(format!("invalid decimal {:?}: {}", s, e))),
        Some(other) => Err(D::Error::custom(format!(
            "expected decimal, got {}",
            other
        ))),
    }
}
