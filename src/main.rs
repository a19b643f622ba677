use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

mod config;
mod db;
mod error;
mod feed;
mod replay;

use config::Config;
use db::{Database, MemorySink};
use feed::{ingest_all, ContestSource, StatsApiSource};
use replay::TeamDirectory;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let teams = config.team_filter(&TeamDirectory::for_sport(config.sport))?;
    let source: Arc<dyn ContestSource> = Arc::new(StatsApiSource::new(
        config.sport,
        config.feed_url(),
        &config.shift_api_url,
    )?);

    info!(
        "Ingesting {} {} contest(s) from {} ({} team filter(s), concurrency={})",
        config.contest_ids.len(),
        config.sport,
        source.name(),
        teams.len(),
        config.concurrency
    );

    if config.dry_run {
        info!("🟡 DRY RUN mode – nothing is written to the database");
        let sink = MemorySink::new();
        let summary = ingest_all(source, &sink, &config.contest_ids, &teams, config.concurrency).await;
        let batch = sink.into_batch()?;
        info!(
            "Dry run done: {} contests, {} events, {} pitches ({} skipped, {} failed)",
            batch.contests.len(),
            batch.events.len(),
            batch.pitches.len(),
            summary.skipped,
            summary.failed
        );
    } else {
        let db = Database::open(&config.database_path)?;
        info!("Database opened: {}", config.database_path);
        let summary = ingest_all(source, &db, &config.contest_ids, &teams, config.concurrency).await;
        let stats = db.get_stats()?;
        info!(
            "Done: {} written, {} skipped, {} failed (db totals: {} contests, {} at-bats, {} plays, {} pitches)",
            summary.written,
            summary.skipped,
            summary.failed,
            stats.contests,
            stats.at_bats,
            stats.plays,
            stats.pitches
        );
    }

    Ok(())
}
