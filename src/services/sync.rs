// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sync orchestration.
//!
//! Handles the core workflow:
//! 1. Reset the bucket (reset mode only)
//! 2. List every remote workout ID
//! 3. Diff against the IDs already stored
//! 4. For each pending workout, in order: fetch, transform, write
//!
//! Each workout's points are written in one request before the next
//! workout is fetched, so a failure loses at most one workout. Any failure
//! aborts the run; the failed workout stays unstored and is picked up by
//! the next incremental run.
//!
//! Reset is delete-then-reimport with no atomicity: if the run stops after
//! the delete, the bucket is left empty or partially re-imported until the
//! next run completes.
//!
//! Every set of one exercise has the same measurement, tag set and
//! timestamp (the workout end time), so InfluxDB keeps only the last set
//! of each exercise in a workout. `set_number` is a field, not a tag, and
//! does not separate the series.

use std::collections::HashSet;

use crate::config::Config;
use crate::db::PointStore;
use crate::error::{Result, SyncError, SyncStage};
use crate::models::{Point, WorkoutId};
use crate::services::{diff::pending_ids, transform::transform, WorkoutSource};
use crate::shutdown::ShutdownSignal;

/// How a run behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Delete everything first and re-import all workouts.
    pub reset: bool,
    /// Compute points but never touch the store.
    pub dry_run: bool,
    /// Upper bound on points kept for display in a dry run.
    pub sample_size: usize,
}

impl SyncOptions {
    /// Combine config with CLI flags. `--dry-run` can only turn dry-run on.
    pub fn new(config: &Config, reset: bool, force_dry_run: bool) -> Self {
        Self {
            reset,
            dry_run: config.dry_run || force_dry_run,
            sample_size: config.dry_run_sample_size,
        }
    }

    pub fn incremental() -> Self {
        Self {
            reset: false,
            dry_run: false,
            sample_size: 0,
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// IDs listed by the source
    pub remote_total: usize,
    /// IDs already in the store (0 in reset mode)
    pub stored_total: usize,
    /// IDs that needed importing
    pub pending: usize,
    /// Workouts fetched and transformed (and written, unless dry run)
    pub processed: usize,
    /// Points written (or computed, in a dry run)
    pub points: usize,
    /// Dry run only: first computed points, in write order
    pub sample: Vec<Point>,
    pub dry_run: bool,
}

/// Drives one sync run against a source and a store.
pub struct SyncOrchestrator<'a, S: ?Sized, P: ?Sized> {
    config: &'a Config,
    source: &'a S,
    store: &'a P,
    shutdown: ShutdownSignal,
    stage: SyncStage,
}

impl<'a, S, P> SyncOrchestrator<'a, S, P>
where
    S: WorkoutSource + ?Sized,
    P: PointStore + ?Sized,
{
    pub fn new(config: &'a Config, source: &'a S, store: &'a P, shutdown: ShutdownSignal) -> Self {
        Self {
            config,
            source,
            store,
            shutdown,
            stage: SyncStage::Idle,
        }
    }

    /// Current (or, after `run` returns, last reached) stage.
    pub fn stage(&self) -> SyncStage {
        self.stage
    }

    fn enter(&mut self, stage: SyncStage) {
        tracing::debug!(from = %self.stage, to = %stage, "Sync stage");
        self.stage = stage;
    }

    /// Run a full sync. Returns once `Done` is reached or on the first failure.
    pub async fn run(&mut self, options: SyncOptions) -> Result<SyncReport> {
        let config = self.config;
        let bucket = config.influxdb_bucket.as_str();
        let mut report = SyncReport {
            dry_run: options.dry_run,
            ..SyncReport::default()
        };

        self.enter(SyncStage::Idle);
        tracing::info!(
            bucket,
            reset = options.reset,
            dry_run = options.dry_run,
            "Starting workout sync"
        );

        if options.reset {
            if options.dry_run {
                tracing::info!("DRY RUN: skipping delete of existing data");
            } else {
                self.enter(SyncStage::Resetting);
                tracing::info!(bucket, "Reset requested, clearing all existing data");
                self.store
                    .delete_all(bucket)
                    .await
                    .map_err(|e| e.at(SyncStage::Resetting))?;
            }
        }

        self.enter(SyncStage::Listing);
        let remote_ids = self
            .source
            .list_workout_ids()
            .await
            .map_err(|e| e.at(SyncStage::Listing))?;
        report.remote_total = remote_ids.len();
        tracing::info!(count = remote_ids.len(), "Found workout IDs from source");

        self.enter(SyncStage::Diffing);
        let stored_ids = if options.reset {
            HashSet::new()
        } else {
            self.store
                .list_stored_workout_ids(bucket)
                .await
                .map_err(|e| e.at(SyncStage::Diffing))?
        };
        report.stored_total = stored_ids.len();

        let pending = pending_ids(&remote_ids, &stored_ids);
        report.pending = pending.len();
        tracing::info!(
            stored = stored_ids.len(),
            pending = pending.len(),
            "Computed pending workouts"
        );

        if pending.is_empty() {
            tracing::info!("No new workouts to import");
            self.enter(SyncStage::Done);
            return Ok(report);
        }

        for (index, workout_id) in pending.iter().enumerate() {
            if self.shutdown.is_triggered() {
                tracing::warn!(
                    workout_id = %workout_id,
                    processed = report.processed,
                    remaining = pending.len() - index,
                    "Stopping before next workout"
                );
                return Err(SyncError::Interrupted(workout_id.clone()));
            }

            let points = self.sync_workout(workout_id, options, &mut report).await?;

            tracing::info!(
                workout_id = %workout_id,
                progress = format!("{}/{}", index + 1, pending.len()),
                points,
                dry_run = options.dry_run,
                "Workout synced"
            );
        }

        self.enter(SyncStage::Done);
        tracing::info!(
            processed = report.processed,
            points = report.points,
            dry_run = options.dry_run,
            "Workout sync complete"
        );
        Ok(report)
    }

    /// Fetch, transform and write one workout as a unit. Returns the point count.
    async fn sync_workout(
        &mut self,
        workout_id: &WorkoutId,
        options: SyncOptions,
        report: &mut SyncReport,
    ) -> Result<usize> {
        self.enter(SyncStage::Fetching);
        let record = self
            .source
            .get_workout_detail(workout_id)
            .await
            .map_err(|e| e.for_workout(workout_id, SyncStage::Fetching))?;

        self.enter(SyncStage::Transforming);
        let transformed =
            transform(&record).map_err(|e| e.for_workout(workout_id, SyncStage::Transforming))?;
        let points = transformed.points();

        self.enter(SyncStage::Writing);
        if options.dry_run {
            let room = options.sample_size.saturating_sub(report.sample.len());
            for point in points.iter().take(room) {
                tracing::info!(
                    workout_id = %workout_id,
                    line = %point.to_line_protocol(),
                    "DRY RUN: sample point"
                );
                report.sample.push(point.clone());
            }
        } else {
            self.store
                .write_points(&self.config.influxdb_bucket, &points)
                .await
                .map_err(|e| e.for_workout(workout_id, SyncStage::Writing))?;
        }

        report.processed += 1;
        report.points += points.len();
        Ok(points.len())
    }
}
