//! CLI entry point for the Teams inventory tool.

use anyhow::{Context, Result};
use clap::Parser;
use teams_inventory_core::graph::GraphClient;
use teams_inventory_core::output::{load_teams_file, write_document};
use teams_inventory_core::pacing::Pacer;
use teams_inventory_core::walker::Walker;
use tracing::{debug, info};

mod app_config;
mod cli;

use app_config::{RunSettings, load_default_file_config, read_access_token, resolve_settings};
use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    let file_config = load_default_file_config()?;
    let settings = resolve_settings(&args, file_config.as_ref());

    init_tracing(settings.default_log_level);
    debug!(?args, "CLI arguments parsed");

    let token = read_access_token()?;
    run(settings, token).await
}

/// Priority: RUST_LOG env var > quiet flag > verbose flag > config > info.
fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

async fn run(settings: RunSettings, token: String) -> Result<()> {
    info!(
        mode = %settings.mode,
        base_url = %settings.base_url,
        output = %settings.output.display(),
        "teams-inventory starting"
    );

    let client = GraphClient::with_timeouts(
        token,
        &settings.base_url,
        settings.connect_timeout_secs,
        settings.read_timeout_secs,
    )
    .context("Failed to create Graph client")?;

    let pacer = if settings.team_delay.is_zero() {
        debug!("team pacing disabled");
        Pacer::disabled()
    } else {
        Pacer::new(settings.team_delay)
    };

    // Configured plans skip the team walk, so the teams file is not needed.
    let preloaded = match &settings.teams_file {
        Some(path) if settings.walk.plan_ids.is_empty() => Some(load_teams_file(path).await?),
        _ => None,
    };

    let walker = Walker::new(&client, &pacer, settings.walk.clone());
    let report = walker.walk(settings.mode, preloaded).await?;

    write_document(&settings.output, &report.records)
        .await
        .with_context(|| format!("Failed to write '{}'", settings.output.display()))?;

    info!(
        records = report.records.len(),
        teams_visited = report.summary.teams_visited,
        teams_skipped = report.summary.teams_skipped,
        channels_visited = report.summary.channels_visited,
        plans_visited = report.summary.plans_visited,
        plans_skipped = report.summary.plans_skipped,
        requests_failed = report.summary.requests_failed,
        sections_failed = report.summary.sections_failed,
        task_details_failed = report.summary.task_details_failed,
        pauses = report.summary.pauses,
        pacing_disabled = pacer.is_disabled(),
        cumulative_pause_ms = pacer.cumulative_delay().as_millis(),
        output = %settings.output.display(),
        "export complete"
    );
    Ok(())
}
