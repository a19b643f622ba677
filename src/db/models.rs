use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::replay::interval_index::ROSTER_SLOTS;
use crate::replay::raw::Sport;

/// Tagged participant slots carried on a hockey play row.
pub const PARTICIPANT_SLOTS: usize = 4;

/// One finished contest (the `contests` table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContestRow {
    pub contest_id: i64,
    pub sport: Sport,
    pub home_id: i64,
    pub away_id: i64,
    pub venue_id: Option<i64>,
    /// Winning pitcher (baseball) or goalie (hockey)
    pub winner_id: Option<i64>,
    pub loser_id: Option<i64>,
    pub first_star_id: Option<i64>,
    pub second_star_id: Option<i64>,
    pub third_star_id: Option<i64>,
    pub weather_condition: Option<String>,
    pub temperature: Option<String>,
}

/// One at-bat with its pre-at-bat state (the `at_bats` table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtBatRow {
    pub contest_id: i64,
    pub event_index: i64,
    /// e.g. "single", "strikeout", "home_run"
    pub event_type: Option<String>,
    pub description: Option<String>,
    pub inning: Option<u32>,
    /// "top" | "bottom"
    pub half_inning: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub home_score: u32,
    pub away_score: u32,
    pub outs: u32,
    pub on_1b: Option<i64>,
    pub on_2b: Option<i64>,
    pub on_3b: Option<i64>,
    pub batter_id: Option<i64>,
    /// "L" | "R"
    pub batter_stance: Option<String>,
    pub pitcher_id: Option<i64>,
    pub pitcher_hand: Option<String>,
}

/// One called pitch inside an at-bat (the `pitches` table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchRow {
    pub contest_id: i64,
    pub event_index: i64,
    pub pitch_index: u32,
    /// e.g. "B", "C", "S", "X"
    pub call_code: Option<String>,
    pub call_description: Option<String>,
    /// e.g. "FF", "SL", "CH"
    pub pitch_type: Option<String>,
    pub start_speed: Option<f64>,
    pub end_speed: Option<f64>,
    pub zone: Option<i32>,
    /// Count after the pitch
    pub balls: Option<u32>,
    pub strikes: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedParticipant {
    pub id: i64,
    /// e.g. "Scorer", "Assist", "Goalie", "Shooter"
    pub role: String,
}

/// One hockey play with its pre-play score and on-ice skaters (the `plays` table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayRow {
    pub contest_id: i64,
    pub event_index: i64,
    /// e.g. "FACEOFF", "SHOT", "GOAL"
    pub event_type: Option<String>,
    pub description: Option<String>,
    pub period: Option<u32>,
    /// Period clock "MM:SS"
    pub period_time: Option<String>,
    pub date_time: Option<DateTime<Utc>>,
    pub team_id: Option<i64>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub home_score: u32,
    pub away_score: u32,
    pub participants: [Option<TaggedParticipant>; PARTICIPANT_SLOTS],
    pub home_on_ice: [Option<i64>; ROSTER_SLOTS],
    pub away_on_ice: [Option<i64>; ROSTER_SLOTS],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventRow {
    AtBat(AtBatRow),
    Play(PlayRow),
}

impl EventRow {
    pub fn contest_id(&self) -> i64 {
        match self {
            EventRow::AtBat(r) => r.contest_id,
            EventRow::Play(r) => r.contest_id,
        }
    }

    pub fn event_index(&self) -> i64 {
        match self {
            EventRow::AtBat(r) => r.event_index,
            EventRow::Play(r) => r.event_index,
        }
    }
}

/// Everything one contest contributes to the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContestOutput {
    pub contest: ContestRow,
    pub events: Vec<EventRow>,
    pub pitches: Vec<PitchRow>,
}

impl ContestOutput {
    pub fn involves_any(&self, team_ids: &std::collections::HashSet<i64>) -> bool {
        team_ids.contains(&self.contest.home_id) || team_ids.contains(&self.contest.away_id)
    }
}

/// Outputs of many contests concatenated in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContestBatch {
    pub contests: Vec<ContestRow>,
    pub events: Vec<EventRow>,
    pub pitches: Vec<PitchRow>,
}

impl ContestBatch {
    pub fn push(&mut self, output: ContestOutput) {
        self.contests.push(output.contest);
        self.events.extend(output.events);
        self.pitches.extend(output.pitches);
    }
}
