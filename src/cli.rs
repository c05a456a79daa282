// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "workout-sync",
    about = "Import new Ryot workouts into InfluxDB"
)]
pub struct Cli {
    /// Clear all existing workout data from InfluxDB before importing.
    #[arg(long)]
    pub reset: bool,

    /// Compute points without touching InfluxDB. Also enabled by DRY_RUN=true.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit structured JSON logs instead of human-readable lines.
    #[arg(long)]
    pub json_logs: bool,
}
