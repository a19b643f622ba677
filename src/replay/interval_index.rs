//! Point-in-time roster lookup over shift intervals.
//!
//! Intervals are converted to absolute contest seconds and swept once in
//! breakpoint order. Between two consecutive breakpoints the set of active
//! intervals is constant, so each such segment stores its active set and a
//! query is a binary search over breakpoints.
//!
//! ```text
//!  P1  [0 ────────── 30)
//!  P2        [10 ──────────── 40)
//!  P3                      [35 ───── 60)
//!  bp  0     10      30    35   40   60
//!  seg {P1} {P1,P2} {P2}  {P2,P3} {P3}
//! ```

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{CoreError, Result};

use super::raw::PresenceInterval;

/// On-ice slots surfaced per side.
pub const ROSTER_SLOTS: usize = 6;

/// Regulation period length in seconds.
pub const PERIOD_SECONDS: u32 = 20 * 60;

/// Parse a period clock "MM:SS" into seconds.
pub fn parse_clock(clock: &str) -> Option<u32> {
    let (minutes, seconds) = clock.trim().split_once(':')?;
    let minutes: u32 = minutes.trim().parse().ok()?;
    let seconds: u32 = seconds.trim().parse().ok()?;
    if seconds >= 60 {
        return None;
    }
    minutes.checked_mul(60)?.checked_add(seconds)
}

/// Absolute elapsed contest seconds for a 1-based period and its clock.
pub fn absolute_time(period: u32, clock: &str) -> Option<u32> {
    if period == 0 {
        return None;
    }
    PERIOD_SECONDS
        .checked_mul(period - 1)?
        .checked_add(parse_clock(clock)?)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Span {
    participant_id: i64,
    side_id: i64,
    start: u32,
    end: u32,
}

/// Participants of one side present at a point in time, in supply order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideRoster {
    pub side_id: i64,
    pub participants: Vec<i64>,
}

impl SideRoster {
    /// Fixed-width view; unused slots are `None`.
    pub fn slots(&self) -> [Option<i64>; ROSTER_SLOTS] {
        let mut slots = [None; ROSTER_SLOTS];
        for (slot, id) in slots.iter_mut().zip(&self.participants) {
            *slot = Some(*id);
        }
        slots
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRoster {
    pub side_a: SideRoster,
    pub side_b: SideRoster,
}

#[derive(Debug, Clone)]
pub struct IntervalIndex {
    spans: Vec<Span>,
    sides: [i64; 2],
    /// Sorted distinct interval starts and ends
    breakpoints: Vec<u32>,
    /// Active span indices for `[breakpoints[k], breakpoints[k + 1])`,
    /// ascending so that supply order is kept
    segments: Vec<Vec<usize>>,
    max_end: u32,
}

impl IntervalIndex {
    /// Build the index for one contest's presence intervals.
    pub fn build(intervals: &[PresenceInterval]) -> Result<Self> {
        let mut spans = Vec::with_capacity(intervals.len());
        for iv in intervals {
            let start = absolute_time(iv.period, &iv.start).ok_or_else(|| {
                CoreError::MalformedInterval {
                    participant_id: iv.participant_id,
                    reason: format!("bad start {:?} in period {}", iv.start, iv.period),
                }
            })?;
            let end = absolute_time(iv.period, &iv.end).ok_or_else(|| {
                CoreError::MalformedInterval {
                    participant_id: iv.participant_id,
                    reason: format!("bad end {:?} in period {}", iv.end, iv.period),
                }
            })?;
            if start >= end {
                return Err(CoreError::MalformedInterval {
                    participant_id: iv.participant_id,
                    reason: format!("start {} not before end {}", iv.start, iv.end),
                });
            }
            spans.push(Span {
                participant_id: iv.participant_id,
                side_id: iv.side_id,
                start,
                end,
            });
        }

        let mut observed: Vec<i64> = Vec::new();
        for span in &spans {
            if !observed.contains(&span.side_id) {
                observed.push(span.side_id);
            }
        }
        if observed.len() != 2 {
            return Err(CoreError::IntervalIndexShape(format!(
                "expected 2 sides, observed {}: {:?}",
                observed.len(),
                observed
            )));
        }
        let sides = [observed[0], observed[1]];

        let mut starts_at: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        let mut ends_at: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for (i, span) in spans.iter().enumerate() {
            starts_at.entry(span.start).or_default().push(i);
            ends_at.entry(span.end).or_default().push(i);
        }
        let mut breakpoints: Vec<u32> = starts_at.keys().chain(ends_at.keys()).copied().collect();
        breakpoints.sort_unstable();
        breakpoints.dedup();

        let mut active: BTreeSet<usize> = BTreeSet::new();
        let mut segments = Vec::with_capacity(breakpoints.len().saturating_sub(1));
        for &bp in &breakpoints[..breakpoints.len().saturating_sub(1)] {
            if let Some(ending) = ends_at.get(&bp) {
                for i in ending {
                    active.remove(i);
                }
            }
            if let Some(starting) = starts_at.get(&bp) {
                active.extend(starting.iter().copied());
            }
            segments.push(active.iter().copied().collect());
        }

        let max_end = spans.iter().map(|s| s.end).max().unwrap_or(0);

        Ok(IntervalIndex {
            spans,
            sides,
            breakpoints,
            segments,
            max_end,
        })
    }

    /// The two side ids, in order of first appearance.
    pub fn sides(&self) -> [i64; 2] {
        self.sides
    }

    /// Largest queryable absolute time.
    pub fn max_time(&self) -> u32 {
        self.max_end
    }

    fn active_at(&self, t: u32) -> &[usize] {
        let k = self.breakpoints.partition_point(|&b| b <= t);
        if k == 0 {
            return &[];
        }
        self.segments.get(k - 1).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Participants present at absolute time `t`, split into `side_a` and
    /// `side_b`. Containment is half-open: `start <= t < end`.
    pub fn resolve(&self, t: u32, side_a: i64, side_b: i64) -> Result<ActiveRoster> {
        if t > self.max_end {
            return Err(CoreError::IntervalIndexRange {
                t,
                max: self.max_end,
            });
        }
        for side in [side_a, side_b] {
            if !self.sides.contains(&side) {
                return Err(CoreError::IntervalIndexShape(format!(
                    "side {} not in index sides {:?}",
                    side, self.sides
                )));
            }
        }
        if side_a == side_b {
            return Err(CoreError::IntervalIndexShape(format!(
                "side {} requested twice",
                side_a
            )));
        }

        let mut a = Vec::new();
        let mut b = Vec::new();
        for &i in self.active_at(t) {
            let span = &self.spans[i];
            if span.side_id == side_a {
                a.push(span.participant_id);
            } else {
                b.push(span.participant_id);
            }
        }
        for (side, present) in [(side_a, &a), (side_b, &b)] {
            if present.len() > ROSTER_SLOTS {
                return Err(CoreError::IntervalIndexShape(format!(
                    "{} participants of side {} present at {}s (max {})",
                    present.len(),
                    side,
                    t,
                    ROSTER_SLOTS
                )));
            }
        }

        Ok(ActiveRoster {
            side_a: SideRoster {
                side_id: side_a,
                participants: a,
            },
            side_b: SideRoster {
                side_id: side_b,
                participants: b,
            },
        })
    }
}
