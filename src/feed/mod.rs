pub mod provider;
pub mod statsapi;

pub use provider::ContestSource;
pub use statsapi::StatsApiSource;

use futures_util::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::db::models::ContestOutput;
use crate::db::TabularSink;
use crate::replay::process_contest;

/// Fetch and reconstruct a single contest.
///
/// `Ok(None)` covers both a contest the source does not know and one that is
/// excluded (not final, no events).
pub async fn ingest_contest(
    source: &dyn ContestSource,
    contest_id: i64,
) -> anyhow::Result<Option<ContestOutput>> {
    let Some(record) = source.fetch_contest(contest_id).await? else {
        warn!("{}: contest {} not found", source.name(), contest_id);
        return Ok(None);
    };
    Ok(process_contest(&record)?)
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Ingest many contests with at most `concurrency` fetches in flight.
///
/// Results reach the sink in the order of `contest_ids`. A failing contest is
/// logged and counted; it never stops the others. When `teams` is non-empty,
/// only contests involving one of those team ids are written.
pub async fn ingest_all(
    source: Arc<dyn ContestSource>,
    sink: &dyn TabularSink,
    contest_ids: &[i64],
    teams: &HashSet<i64>,
    concurrency: usize,
) -> IngestSummary {
    let mut summary = IngestSummary::default();

    let mut results = stream::iter(contest_ids.iter().copied())
        .map(|id| {
            let source = Arc::clone(&source);
            async move { (id, ingest_contest(source.as_ref(), id).await) }
        })
        .buffered(concurrency.max(1));

    while let Some((id, result)) = results.next().await {
        match result {
            Ok(Some(output)) if teams.is_empty() || output.involves_any(teams) => {
                match sink.write_contest(&output) {
                    Ok(()) => {
                        info!(
                            "Contest {} written ({} events, {} pitches)",
                            id,
                            output.events.len(),
                            output.pitches.len()
                        );
                        summary.written += 1;
                    }
                    Err(e) => {
                        error!("Failed to write contest {}: {:#}", id, e);
                        summary.failed += 1;
                    }
                }
            }
            Ok(_) => summary.skipped += 1,
            Err(e) => {
                warn!("Contest {} failed: {:#}", id, e);
                summary.failed += 1;
            }
        }
    }

    summary
}
