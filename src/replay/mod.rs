pub mod assembler;
pub mod interval_index;
pub mod normalizer;
pub mod raw;
pub mod reconstruct;
pub mod roster;
pub mod runners;
pub mod teams;

pub use interval_index::IntervalIndex;
pub use normalizer::{normalize, Normalized};
pub use raw::{RawContestRecord, Sport};
pub use reconstruct::reconstruct;
pub use teams::TeamDirectory;

use tracing::debug;

use crate::db::models::ContestOutput;
use crate::error::Result;

/// Reconstruct one contest end to end.
///
/// Returns `Ok(None)` when the contest is excluded (not final, no events).
/// Any error aborts this contest only.
pub fn process_contest(record: &RawContestRecord) -> Result<Option<ContestOutput>> {
    let periods = match normalize(record)? {
        Normalized::Included(periods) => periods,
        Normalized::Excluded(reason) => {
            debug!("Contest {} excluded: {:?}", record.contest_id, reason);
            return Ok(None);
        }
    };

    let events = reconstruct(&periods);

    let output = match record.sport {
        Sport::Baseball => assembler::assemble_baseball(record, &events)?,
        Sport::Hockey => {
            let index = IntervalIndex::build(&record.shifts)?;
            debug!(
                "Contest {}: {} shifts indexed for sides {:?}, last ends at {}s",
                record.contest_id,
                record.shifts.len(),
                index.sides(),
                index.max_time()
            );
            let on_ice = events
                .iter()
                .map(|ev| {
                    roster::resolve_on_ice(
                        record.contest_id,
                        ev.play,
                        &index,
                        record.home_id,
                        record.away_id,
                    )
                })
                .collect::<Result<Vec<_>>>()?;
            assembler::assemble_hockey(record, &events, &on_ice)?
        }
    };

    debug!(
        "Contest {} reconstructed: {} events, {} pitches",
        record.contest_id,
        output.events.len(),
        output.pitches.len()
    );
    Ok(Some(output))
}
