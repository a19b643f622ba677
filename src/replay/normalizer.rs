//! Flattens a contest's nested play lists into one ordered event sequence.

use crate::error::{CoreError, Result};

use super::raw::{RawContestRecord, RawPlay, Sport};

/// Hockey event types that only mark period or game boundaries.
pub const HOCKEY_MARKERS: &[&str] = &[
    "GAME_SCHEDULED",
    "PERIOD_READY",
    "PERIOD_START",
    "PERIOD_END",
    "PERIOD_OFFICIAL",
    "GAME_END",
    "GAME_OFFICIAL",
];

/// Baseball event types that carry no at-bat.
pub const BASEBALL_MARKERS: &[&str] = &["game_advisory"];

/// Why a contest produced no events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    /// Status other than final (carries the status seen)
    NotFinal(String),
    NoEvents,
    /// Every event was a boundary marker
    OnlyMarkers,
}

/// Included contests keep their period (half-inning) grouping: one list per
/// period in feed order, markers removed, periods left empty dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized<'a> {
    Included(Vec<Vec<&'a RawPlay>>),
    Excluded(Exclusion),
}

pub fn is_marker(sport: Sport, event_type: Option<&str>) -> bool {
    let Some(kind) = event_type else {
        return false;
    };
    let markers = match sport {
        Sport::Hockey => HOCKEY_MARKERS,
        Sport::Baseball => BASEBALL_MARKERS,
    };
    markers.contains(&kind)
}

/// Produce the ordered, marker-free event sequence for one contest.
///
/// Periods are walked in order and each period's indices in order. When the
/// record carries no per-period lists the play list is treated as a single
/// period. Event indices must be present and strictly increasing across the
/// whole contest.
pub fn normalize(record: &RawContestRecord) -> Result<Normalized<'_>> {
    if !record.status.trim().eq_ignore_ascii_case("final") {
        return Ok(Normalized::Excluded(Exclusion::NotFinal(
            record.status.clone(),
        )));
    }
    if record.plays.is_empty() {
        return Ok(Normalized::Excluded(Exclusion::NoEvents));
    }

    let grouped: Vec<Vec<&RawPlay>> = if record.periods.is_empty() {
        vec![record.plays.iter().collect()]
    } else {
        record
            .periods
            .iter()
            .enumerate()
            .map(|(period_no, indices)| {
                indices
                    .iter()
                    .map(|&idx| {
                        record.plays.get(idx).ok_or_else(|| {
                            CoreError::malformed(
                                record.contest_id,
                                format!(
                                    "period {} references play {} of {}",
                                    period_no + 1,
                                    idx,
                                    record.plays.len()
                                ),
                            )
                        })
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?
    };

    let mut periods = Vec::with_capacity(grouped.len());
    let mut last_index: Option<i64> = None;
    for group in grouped {
        let mut events = Vec::with_capacity(group.len());
        for play in group {
            if is_marker(record.sport, play.event_type.as_deref()) {
                continue;
            }
            let event_index = play.event_index.ok_or_else(|| {
                CoreError::malformed(
                    record.contest_id,
                    format!(
                        "event without index (type {:?})",
                        play.event_type.as_deref().unwrap_or("unknown")
                    ),
                )
            })?;
            if let Some(prev) = last_index {
                if event_index <= prev {
                    return Err(CoreError::malformed(
                        record.contest_id,
                        format!("event index {} follows {}", event_index, prev),
                    ));
                }
            }
            last_index = Some(event_index);
            events.push(play);
        }
        if !events.is_empty() {
            periods.push(events);
        }
    }

    if periods.is_empty() {
        return Ok(Normalized::Excluded(Exclusion::OnlyMarkers));
    }
    Ok(Normalized::Included(periods))
}
