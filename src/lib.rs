// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! workout-sync: incremental Ryot → InfluxDB workout import
//!
//! Lists the workouts a Ryot instance knows about, skips the ones already
//! stored in InfluxDB, and writes a summary point plus one point per set
//! for each new workout.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod shutdown;
pub mod time_utils;
