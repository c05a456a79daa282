// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! InfluxDB v2 HTTP client.
//!
//! Provides the three operations the sync needs:
//! - Stored workout IDs (Flux query over `workout_summary`)
//! - Point writes (line protocol, nanosecond precision)
//! - Delete-all for both measurements (reset mode)

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashSet;
use std::time::Duration;

use crate::db::{measurements, PointStore};
use crate::error::{Result, SyncError};
use crate::models::{Point, WorkoutId};
use crate::time_utils::format_utc_rfc3339;

/// InfluxDB client bound to one organization.
#[derive(Clone)]
pub struct InfluxDb {
    http: reqwest::Client,
    base_url: String,
    token: String,
    org: String,
}

impl InfluxDb {
    /// Create a new InfluxDB client.
    pub fn new(
        base_url: &str,
        token: String,
        org: String,
        timeout: Duration,
    ) -> std::result::Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            org,
        })
    }

    fn auth_header(&self) -> String {
        format!("Token {}", self.token)
    }

    /// Check response status and return the body text as the error detail.
    async fn check_response(response: reqwest::Response) -> std::result::Result<String, String> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status.is_success() {
            Ok(body)
        } else {
            Err(format!("HTTP {}: {}", status, body.trim()))
        }
    }
}

#[async_trait]
impl PointStore for InfluxDb {
    async fn list_stored_workout_ids(&self, bucket: &str) -> Result<HashSet<WorkoutId>> {
        let body = serde_json::json!({
            "query": stored_ids_query(bucket),
            "type": "flux",
        });

        let response = self
            .http
            .post(format!("{}/api/v2/query", self.base_url))
            .query(&[("org", self.org.as_str())])
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .header(reqwest::header::ACCEPT, "application/csv")
            .json(&body)
            .send()
            .await
            .map_err(|e| SyncError::StoreQuery(e.to_string()))?;

        let csv = Self::check_response(response)
            .await
            .map_err(SyncError::StoreQuery)?;

        let ids: HashSet<WorkoutId> = parse_csv_column(&csv, "_value")
            .into_iter()
            .filter(|id| !id.is_empty())
            .map(WorkoutId::from)
            .collect();

        tracing::debug!(bucket, count = ids.len(), "Queried stored workout IDs");
        Ok(ids)
    }

    async fn write_points(&self, bucket: &str, points: &[Point]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }

        let body = points
            .iter()
            .map(Point::to_line_protocol)
            .collect::<Vec<_>>()
            .join("\n");

        let response = self
            .http
            .post(format!("{}/api/v2/write", self.base_url))
            .query(&[
                ("org", self.org.as_str()),
                ("bucket", bucket),
                ("precision", "ns"),
            ])
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(body)
            .send()
            .await
            .map_err(|e| SyncError::StoreWrite(e.to_string()))?;

        Self::check_response(response)
            .await
            .map_err(SyncError::StoreWrite)?;

        tracing::debug!(bucket, points = points.len(), "Wrote points");
        Ok(())
    }

    async fn delete_all(&self, bucket: &str) -> Result<()> {
        let (start, stop) = delete_range();

        for measurement in measurements::ALL {
            tracing::info!(bucket, measurement, "Deleting all existing data");

            let body = serde_json::json!({
                "start": format_utc_rfc3339(start),
                "stop": format_utc_rfc3339(stop),
                "predicate": format!("_measurement=\"{}\"", measurement),
            });

            let response = self
                .http
                .post(format!("{}/api/v2/delete", self.base_url))
                .query(&[("org", self.org.as_str()), ("bucket", bucket)])
                .header(reqwest::header::AUTHORIZATION, self.auth_header())
                .json(&body)
                .send()
                .await
                .map_err(|e| SyncError::StoreWrite(e.to_string()))?;

            Self::check_response(response)
                .await
                .map_err(|e| SyncError::StoreWrite(format!("delete {}: {}", measurement, e)))?;
        }

        tracing::info!(bucket, "All existing workout data deleted");
        Ok(())
    }
}

/// Time span covered by a reset: the epoch up to 2100-01-01.
fn delete_range() -> (DateTime<Utc>, DateTime<Utc>) {
    let stop = Utc
        .with_ymd_and_hms(2100, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    (DateTime::<Utc>::UNIX_EPOCH, stop)
}

/// Flux query returning one row per distinct stored workout ID.
pub fn stored_ids_query(bucket: &str) -> String {
    format!(
        "from(bucket: \"{}\")\n  \
         |> range(start: 0)\n  \
         |> filter(fn: (r) => r._measurement == \"{}\")\n  \
         |> keep(columns: [\"workout_id\"])\n  \
         |> group()\n  \
         |> distinct(column: \"workout_id\")",
        flux_escape(bucket),
        measurements::WORKOUT_SUMMARY
    )
}

fn flux_escape(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Extract one column from a Flux CSV response.
///
/// Handles annotation rows (`#...`), multiple tables separated by blank
/// lines (each with its own header), CRLF line endings and quoted cells.
pub fn parse_csv_column(csv: &str, column: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut index: Option<usize> = None;
    let mut expect_header = true;

    for line in csv.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            expect_header = true;
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        let cells = split_csv_line(line);
        if expect_header {
            index = cells.iter().position(|c| c == column);
            expect_header = false;
            continue;
        }

        if let Some(value) = index.and_then(|i| cells.get(i)) {
            values.push(value.clone());
        }
    }

    values
}

fn split_csv_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => cells.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    cells.push(current);
    cells
}
