use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::runners::Base;

/// Sport a contest feed belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Baseball,
    Hockey,
}

impl Sport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Baseball => "baseball",
            Sport::Hockey => "hockey",
        }
    }
}

impl std::fmt::Display for Sport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One contest as delivered by a contest source, before any reconstruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawContestRecord {
    pub contest_id: i64,
    pub sport: Sport,
    /// Detailed status string, e.g. "Final" or "In Progress"
    pub status: String,
    pub home_id: i64,
    pub away_id: i64,
    pub venue_id: Option<i64>,
    /// Outcome ids keyed by feed name: "winner", "loser", "firstStar", ...
    pub decisions: BTreeMap<String, i64>,
    pub weather: Option<RawWeather>,
    /// Every play in feed order
    pub plays: Vec<RawPlay>,
    /// Per-period (or per half-inning) lists of indices into `plays`.
    /// Empty means `plays` is already the flat ordered sequence.
    pub periods: Vec<Vec<usize>>,
    /// Hockey shift records; empty for baseball
    pub shifts: Vec<PresenceInterval>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawWeather {
    pub condition: Option<String>,
    pub temperature: Option<String>,
}

/// A single at-bat or play, carrying only what the feed reports for it.
///
/// `away_score`, `home_score` and `outs` are the feed's totals *after* the
/// play resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPlay {
    pub event_index: Option<i64>,
    pub event_type: Option<String>,
    pub description: Option<String>,
    pub period: Option<u32>,
    /// "top" / "bottom" for baseball
    pub half: Option<String>,
    /// Period-relative clock "MM:SS" (hockey)
    pub clock: Option<String>,
    /// ISO-8601 timestamps as sent by the feed
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub away_score: u32,
    pub home_score: u32,
    pub outs: Option<u32>,
    /// Team credited with the play (hockey)
    pub team_id: Option<i64>,
    pub coordinates: Option<(f64, f64)>,
    pub matchup: Option<RawMatchup>,
    pub participants: Vec<RawParticipant>,
    pub runners: Vec<RunnerMovement>,
    pub sub_events: Vec<RawSubEvent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMatchup {
    pub batter_id: Option<i64>,
    pub bat_side: Option<String>,
    pub pitcher_id: Option<i64>,
    pub pitch_hand: Option<String>,
}

/// A participant tagged on a hockey play ("Scorer", "Assist", "Goalie", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawParticipant {
    pub id: i64,
    pub role: String,
}

/// One runner's movement during an at-bat. `None` bases mean home plate
/// (batter start) or no further base (scored / retired).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerMovement {
    pub runner_id: i64,
    pub start: Option<Base>,
    pub end: Option<Base>,
    pub is_out: bool,
}

/// A sub-event inside an at-bat (pitch, pickoff, substitution, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSubEvent {
    pub index: Option<u32>,
    /// Present only for pitches
    pub call: Option<RawCall>,
    pub pitch_type: Option<String>,
    pub start_speed: Option<f64>,
    pub end_speed: Option<f64>,
    pub zone: Option<i32>,
    pub balls: Option<u32>,
    pub strikes: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCall {
    pub code: Option<String>,
    pub description: Option<String>,
}

/// One uninterrupted span a participant was on the ice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceInterval {
    pub participant_id: i64,
    pub side_id: i64,
    pub period: u32,
    /// Period clock "MM:SS"
    pub start: String,
    pub end: String,
}

impl PresenceInterval {
    pub fn new(
        participant_id: i64,
        side_id: i64,
        period: u32,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        PresenceInterval {
            participant_id,
            side_id,
            period,
            start: start.into(),
            end: end.into(),
        }
    }
}
