use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

use super::interval_index::{absolute_time, IntervalIndex, ROSTER_SLOTS};
use super::raw::RawPlay;

/// Skaters on the ice for each side when a play happened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnIce {
    pub home: [Option<i64>; ROSTER_SLOTS],
    pub away: [Option<i64>; ROSTER_SLOTS],
}

/// Attach on-ice participants to a hockey play using its period and clock.
pub fn resolve_on_ice(
    contest_id: i64,
    play: &RawPlay,
    index: &IntervalIndex,
    home_id: i64,
    away_id: i64,
) -> Result<OnIce> {
    let period = play
        .period
        .ok_or_else(|| CoreError::malformed(contest_id, format!("play {:?} has no period", play.event_index)))?;
    let clock = play
        .clock
        .as_deref()
        .ok_or_else(|| CoreError::malformed(contest_id, format!("play {:?} has no clock", play.event_index)))?;
    let t = absolute_time(period, clock).ok_or_else(|| {
        CoreError::malformed(
            contest_id,
            format!("play {:?} has bad clock {:?} in period {}", play.event_index, clock, period),
        )
    })?;

    let roster = index.resolve(t, home_id, away_id)?;
    Ok(OnIce {
        home: roster.side_a.slots(),
        away: roster.side_b.slots(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::raw::PresenceInterval;

    const HOME: i64 = 6;
    const AWAY: i64 = 3;

    fn index() -> IntervalIndex {
        IntervalIndex::build(&[
            PresenceInterval::new(8471214, HOME, 1, "00:00", "00:45"),
            PresenceInterval::new(8475166, AWAY, 1, "00:00", "00:50"),
            PresenceInterval::new(8474141, HOME, 2, "00:00", "01:00"),
            PresenceInterval::new(8476459, AWAY, 2, "00:00", "01:00"),
        ])
        .unwrap()
    }

    fn play(period: Option<u32>, clock: Option<&str>) -> RawPlay {
        RawPlay {
            event_index: Some(12),
            event_type: Some("SHOT".into()),
            period,
            clock: clock.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_resolves_home_and_away() {
        let on_ice = resolve_on_ice(1, &play(Some(2), Some("00:30")), &index(), HOME, AWAY).unwrap();
        assert_eq!(on_ice.home[0], Some(8474141));
        assert_eq!(on_ice.away[0], Some(8476459));
        assert!(on_ice.home[1..].iter().all(Option::is_none));
    }

    #[test]
    fn test_first_period_play() {
        let on_ice = resolve_on_ice(1, &play(Some(1), Some("00:46")), &index(), HOME, AWAY).unwrap();
        assert_eq!(on_ice.home, [None; ROSTER_SLOTS]);
        assert_eq!(on_ice.away[0], Some(8475166));
    }

    #[test]
    fn test_missing_clock_is_malformed() {
        let err = resolve_on_ice(1, &play(Some(1), None), &index(), HOME, AWAY).unwrap_err();
        assert!(matches!(err, CoreError::MalformedEvent { contest_id: 1, .. }));
    }

    #[test]
    fn test_overflowing_clock_is_malformed() {
        let err = resolve_on_ice(1, &play(Some(1), Some("99999999:00")), &index(), HOME, AWAY).unwrap_err();
        assert!(matches!(err, CoreError::MalformedEvent { contest_id: 1, .. }));
    }

    #[test]
    fn test_play_after_last_shift_is_range_error() {
        let err = resolve_on_ice(1, &play(Some(3), Some("05:00")), &index(), HOME, AWAY).unwrap_err();
        assert!(matches!(err, CoreError::IntervalIndexRange { .. }));
    }
}
