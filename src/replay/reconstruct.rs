//! Forward scan that turns per-play deltas into fully-stated events.
//!
//! The scan is an explicit fold over [`ScanState`]: every step takes the
//! state left by the previous play and returns the state for the next one,
//! so nothing is shared between contests.
//!
//! Displayed state on a play is the state *before* it resolves, which the
//! feed only reports as the previous play's result. Baserunners lag one level
//! further: they are the previous play's movements applied to the occupancy
//! that play itself displayed. Runners restart at every period (half-inning):
//! its first play shows empty bases and its second applies the first play's
//! movements to empty bases. Score and outs carry across periods unchanged.

use serde::{Deserialize, Serialize};

use super::raw::{RawPlay, RunnerMovement};
use super::runners::BaseOccupancy;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

/// Pre-play state shown on one event row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub score: Score,
    pub outs: u32,
    pub bases: BaseOccupancy,
}

/// A normalized play paired with its reconstructed pre-play state.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedEvent<'a> {
    pub event_index: i64,
    pub play: &'a RawPlay,
    pub state: Snapshot,
}

#[derive(Debug, Clone, Default)]
pub struct ScanState<'a> {
    /// Plays folded since the current period started
    in_period: usize,
    previous: Option<Resolved<'a>>,
}

/// What the previous play left behind.
#[derive(Debug, Clone)]
struct Resolved<'a> {
    score: Score,
    outs: u32,
    movements: &'a [RunnerMovement],
    shown_bases: BaseOccupancy,
}

impl<'a> ScanState<'a> {
    pub fn new() -> Self {
        ScanState::default()
    }

    /// Start a new period: runner history is dropped, score and outs are kept.
    pub fn next_period(self) -> Self {
        ScanState {
            in_period: 0,
            previous: self.previous,
        }
    }
}

/// One fold step: derive `play`'s displayed state and the state for the next play.
pub fn step<'a>(state: ScanState<'a>, play: &'a RawPlay) -> (ScanState<'a>, Snapshot) {
    let snapshot = match &state.previous {
        None => Snapshot::default(),
        Some(prev) => {
            let bases = match state.in_period {
                0 => BaseOccupancy::empty(),
                1 => BaseOccupancy::empty().advance(prev.movements),
                _ => prev.shown_bases.advance(prev.movements),
            };
            Snapshot {
                score: prev.score,
                outs: prev.outs,
                bases,
            }
        }
    };

    let next = ScanState {
        in_period: state.in_period + 1,
        previous: Some(Resolved {
            score: Score {
                home: play.home_score,
                away: play.away_score,
            },
            outs: play.outs.unwrap_or(0),
            movements: &play.runners,
            shown_bases: snapshot.bases,
        }),
    };
    (next, snapshot)
}

/// Run the scan over a contest's periods, in order.
///
/// Plays must already carry an index (the normalizer guarantees it); a play
/// without one is reported with index -1 rather than dropped.
pub fn reconstruct<'a>(periods: &[Vec<&'a RawPlay>]) -> Vec<EnrichedEvent<'a>> {
    let mut events = Vec::with_capacity(periods.iter().map(Vec::len).sum());
    let mut state = ScanState::new();
    for period in periods {
        state = state.next_period();
        for &play in period {
            let (next, snapshot) = step(state, play);
            state = next;
            events.push(EnrichedEvent {
                event_index: play.event_index.unwrap_or(-1),
                play,
                state: snapshot,
            });
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::runners::Base;

    fn play(idx: i64, away: u32, home: u32, outs: u32) -> RawPlay {
        RawPlay {
            event_index: Some(idx),
            event_type: Some("field_out".into()),
            away_score: away,
            home_score: home,
            outs: Some(outs),
            ..Default::default()
        }
    }

    fn scan(plays: &[RawPlay]) -> Vec<EnrichedEvent<'_>> {
        let period: Vec<&RawPlay> = plays.iter().collect();
        reconstruct(&[period])
    }

    fn single(idx: i64, batter: i64) -> RawPlay {
        RawPlay {
            event_index: Some(idx),
            event_type: Some("single".into()),
            runners: vec![RunnerMovement {
                runner_id: batter,
                start: None,
                end: Some(Base::First),
                is_out: false,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_first_event_starts_from_zero() {
        let plays = vec![play(0, 2, 3, 1), play(1, 2, 3, 2)];
        let events = scan(&plays);
        assert_eq!(events[0].state, Snapshot::default());
        assert_eq!(events[0].state.bases, BaseOccupancy::empty());
    }

    #[test]
    fn test_pre_state_equals_previous_post_state() {
        let plays = vec![
            play(0, 0, 0, 1),
            play(1, 0, 1, 2),
            play(2, 1, 1, 3),
            play(3, 1, 1, 0),
        ];
        let events = scan(&plays);
        for i in 1..events.len() {
            let prev = &plays[i - 1];
            assert_eq!(events[i].state.score.away, prev.away_score);
            assert_eq!(events[i].state.score.home, prev.home_score);
            assert_eq!(events[i].state.outs, prev.outs.unwrap());
        }
    }

    #[test]
    fn test_away_run_shows_on_following_event_only() {
        // E1's result: away side scores once.
        let plays = vec![play(0, 0, 0, 0), play(1, 1, 0, 0), play(2, 1, 0, 1)];
        let events = scan(&plays);
        assert_eq!(events[1].state.score, Score { home: 0, away: 0 });
        assert_eq!(events[2].state.score, Score { home: 0, away: 1 });
    }

    #[test]
    fn test_outs_not_reset_at_inning_boundary() {
        let mut last_of_top = play(5, 0, 0, 3);
        last_of_top.half = Some("top".into());
        let mut first_of_bottom = play(6, 0, 0, 1);
        first_of_bottom.half = Some("bottom".into());
        let plays = vec![last_of_top, first_of_bottom];
        let events = scan(&plays);
        assert_eq!(events[1].state.outs, 3);
    }

    #[test]
    fn test_runners_lag_one_event() {
        let plays = vec![single(0, 100), single(1, 101), single(2, 102), play(3, 0, 0, 0)];
        let events = scan(&plays);

        assert_eq!(events[0].state.bases, BaseOccupancy::empty());
        // E1 shows E0's single applied to empty bases
        assert_eq!(events[1].state.bases.first, Some(100));
        // E2 applies E1's movement on top of what E1 displayed
        assert_eq!(events[2].state.bases.first, Some(101));
        // Batter-only movements overwrite first base each time
        assert_eq!(events[3].state.bases.first, Some(102));
    }

    #[test]
    fn test_second_event_ignores_unresolved_history() {
        let mut leadoff = single(0, 100);
        leadoff.runners.push(RunnerMovement {
            runner_id: 99,
            start: Some(Base::Second),
            end: Some(Base::Third),
            is_out: false,
        });
        let plays = vec![leadoff, single(1, 101)];
        let events = scan(&plays);
        assert_eq!(events[1].state.bases.first, Some(100));
        assert_eq!(events[1].state.bases.third, Some(99));
        assert!(events[1].state.bases.second.is_none());
    }

    #[test]
    fn test_scan_is_deterministic() {
        let plays = vec![single(0, 1), play(1, 0, 1, 1), single(2, 2), play(3, 2, 1, 2)];
        let a = serde_json::to_string(&scan(&plays).iter().map(|e| e.state).collect::<Vec<_>>())
            .unwrap();
        let b = serde_json::to_string(&scan(&plays).iter().map(|e| e.state).collect::<Vec<_>>())
            .unwrap();
        assert_eq!(a, b);
    }

    fn double(idx: i64, batter: i64) -> RawPlay {
        RawPlay {
            event_index: Some(idx),
            event_type: Some("double".into()),
            half: Some("top".into()),
            runners: vec![RunnerMovement {
                runner_id: batter,
                start: None,
                end: Some(Base::Second),
                is_out: false,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_runners_restart_each_half_inning() {
        let mut strikeout = play(1, 0, 0, 3);
        strikeout.half = Some("top".into());
        let mut bottom_first = play(2, 0, 0, 1);
        bottom_first.half = Some("bottom".into());
        let mut bottom_second = play(3, 0, 0, 2);
        bottom_second.half = Some("bottom".into());
        let plays = vec![double(0, 555), strikeout, bottom_first, bottom_second];

        let periods: Vec<Vec<&RawPlay>> = vec![
            vec![&plays[0], &plays[1]],
            vec![&plays[2], &plays[3]],
        ];
        let events = reconstruct(&periods);

        assert_eq!(events[1].state.bases.second, Some(555));
        assert_eq!(events[2].state.bases, BaseOccupancy::empty());
        assert_eq!(events[3].state.bases, BaseOccupancy::empty());
        // score and outs still carry over the boundary
        assert_eq!(events[2].state.outs, 3);
        assert_eq!(events[3].state.outs, 1);
    }

    #[test]
    fn test_second_play_of_period_applies_first_to_empty_bases() {
        let carried = single(0, 100);
        let opener = double(1, 200);
        let follow = play(2, 0, 0, 0);
        let periods: Vec<Vec<&RawPlay>> = vec![vec![&carried], vec![&opener, &follow]];
        let events = reconstruct(&periods);

        assert_eq!(events[1].state.bases, BaseOccupancy::empty());
        assert_eq!(events[2].state.bases.second, Some(200));
        assert!(events[2].state.bases.first.is_none());
    }
}
