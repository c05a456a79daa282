// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! workout-sync CLI
//!
//! Imports new Ryot workouts into InfluxDB. Exits non-zero on any failure
//! so a scheduler can retry the whole run.

use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use workout_sync::{
    cli::Cli,
    config::Config,
    db::InfluxDb,
    error::SyncError,
    services::{RyotClient, SyncOptions, SyncOrchestrator, SyncReport},
    shutdown::ShutdownSignal,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    match run(&cli).await {
        Ok(report) => {
            tracing::info!(
                remote = report.remote_total,
                stored = report.stored_total,
                pending = report.pending,
                processed = report.processed,
                points = report.points,
                dry_run = report.dry_run,
                "Workout processing complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            if e
                .downcast_ref::<SyncError>()
                .is_some_and(SyncError::is_remote_auth_error)
            {
                tracing::error!("Ryot rejected AUTH_TOKEN; generate a new token and retry");
            }
            tracing::error!(error = format!("{:#}", e), "Workout sync failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<SyncReport> {
    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    let options = SyncOptions::new(&config, cli.reset, cli.dry_run);

    let source = RyotClient::new(
        &config.graphql_api_url,
        config.auth_token.clone(),
        config.http_timeout,
    )
    .context("Failed to build Ryot client")?;

    let store = InfluxDb::new(
        &config.influxdb_url,
        config.influxdb_token.clone(),
        config.influxdb_org.clone(),
        config.http_timeout,
    )
    .context("Failed to build InfluxDB client")?;

    let shutdown = ShutdownSignal::new();
    let listener = shutdown.listen();

    let mut orchestrator = SyncOrchestrator::new(&config, &source, &store, shutdown);
    let result = orchestrator.run(options).await;
    listener.abort();

    Ok(result?)
}

/// Initialize logging; JSON when requested, human-readable otherwise.
fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,workout_sync=debug"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .with_current_span(true)
                    .flatten_event(true),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    }
}
