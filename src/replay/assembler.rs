//! Turns reconstructed events into the rows a tabular sink stores.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

use crate::db::models::{
    AtBatRow, ContestOutput, ContestRow, EventRow, PitchRow, PlayRow, TaggedParticipant,
    PARTICIPANT_SLOTS,
};
use crate::error::{CoreError, Result};

use super::raw::{RawContestRecord, RawPlay};
use super::reconstruct::EnrichedEvent;
use super::roster::OnIce;

/// Look up an optional outcome id; a missing key is simply absent.
fn outcome(decisions: &BTreeMap<String, i64>, key: &str) -> Option<i64> {
    decisions.get(key).copied()
}

pub fn contest_row(record: &RawContestRecord) -> ContestRow {
    let weather = record.weather.clone().unwrap_or_default();
    ContestRow {
        contest_id: record.contest_id,
        sport: record.sport,
        home_id: record.home_id,
        away_id: record.away_id,
        venue_id: record.venue_id,
        winner_id: outcome(&record.decisions, "winner"),
        loser_id: outcome(&record.decisions, "loser"),
        first_star_id: outcome(&record.decisions, "firstStar"),
        second_star_id: outcome(&record.decisions, "secondStar"),
        third_star_id: outcome(&record.decisions, "thirdStar"),
        weather_condition: weather.condition,
        temperature: weather.temperature,
    }
}

/// Parse a feed timestamp such as "2019-04-14T17:05:23.000Z".
fn parse_timestamp(contest_id: i64, raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(raw.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(|e| CoreError::malformed(contest_id, format!("bad timestamp {:?}: {}", raw, e)))
}

pub fn at_bat_row(contest_id: i64, event: &EnrichedEvent<'_>) -> Result<AtBatRow> {
    let play = event.play;
    let matchup = play.matchup.clone().unwrap_or_default();
    Ok(AtBatRow {
        contest_id,
        event_index: event.event_index,
        event_type: play.event_type.clone(),
        description: play.description.clone(),
        inning: play.period,
        half_inning: play.half.clone(),
        start_time: parse_timestamp(contest_id, play.start_time.as_deref())?,
        end_time: parse_timestamp(contest_id, play.end_time.as_deref())?,
        home_score: event.state.score.home,
        away_score: event.state.score.away,
        outs: event.state.outs,
        on_1b: event.state.bases.first,
        on_2b: event.state.bases.second,
        on_3b: event.state.bases.third,
        batter_id: matchup.batter_id,
        batter_stance: matchup.bat_side,
        pitcher_id: matchup.pitcher_id,
        pitcher_hand: matchup.pitch_hand,
    })
}

/// Rows for the sub-events of an at-bat that carry a call.
///
/// A sub-event without its own index is numbered by its position in the
/// at-bat. Two pitches landing on the same index is `MalformedEvent`.
pub fn pitch_rows(contest_id: i64, event_index: i64, play: &RawPlay) -> Result<Vec<PitchRow>> {
    let mut seen = BTreeSet::new();
    let mut rows = Vec::new();
    for (pos, ev) in play.sub_events.iter().enumerate() {
        let Some(call) = ev.call.as_ref() else {
            continue;
        };
        let pitch_index = ev.index.unwrap_or(pos as u32);
        if !seen.insert(pitch_index) {
            return Err(CoreError::malformed(
                contest_id,
                format!("at-bat {} repeats pitch index {}", event_index, pitch_index),
            ));
        }
        rows.push(PitchRow {
            contest_id,
            event_index,
            pitch_index,
            call_code: call.code.clone(),
            call_description: call.description.clone(),
            pitch_type: ev.pitch_type.clone(),
            start_speed: ev.start_speed,
            end_speed: ev.end_speed,
            zone: ev.zone,
            balls: ev.balls,
            strikes: ev.strikes,
        });
    }
    Ok(rows)
}

pub fn play_row(contest_id: i64, event: &EnrichedEvent<'_>, on_ice: OnIce) -> Result<PlayRow> {
    let play = event.play;
    if play.participants.len() > PARTICIPANT_SLOTS {
        return Err(CoreError::malformed(
            contest_id,
            format!(
                "play {} tags {} participants (max {})",
                event.event_index,
                play.participants.len(),
                PARTICIPANT_SLOTS
            ),
        ));
    }
    let mut participants: [Option<TaggedParticipant>; PARTICIPANT_SLOTS] = Default::default();
    for (slot, p) in participants.iter_mut().zip(&play.participants) {
        *slot = Some(TaggedParticipant {
            id: p.id,
            role: p.role.clone(),
        });
    }

    Ok(PlayRow {
        contest_id,
        event_index: event.event_index,
        event_type: play.event_type.clone(),
        description: play.description.clone(),
        period: play.period,
        period_time: play.clock.clone(),
        date_time: parse_timestamp(contest_id, play.start_time.as_deref())?,
        team_id: play.team_id,
        x: play.coordinates.map(|(x, _)| x),
        y: play.coordinates.map(|(_, y)| y),
        home_score: event.state.score.home,
        away_score: event.state.score.away,
        participants,
        home_on_ice: on_ice.home,
        away_on_ice: on_ice.away,
    })
}

pub fn assemble_baseball(record: &RawContestRecord, events: &[EnrichedEvent<'_>]) -> Result<ContestOutput> {
    let mut rows = Vec::with_capacity(events.len());
    let mut pitches = Vec::new();
    for event in events {
        rows.push(EventRow::AtBat(at_bat_row(record.contest_id, event)?));
        pitches.extend(pitch_rows(record.contest_id, event.event_index, event.play)?);
    }
    Ok(ContestOutput {
        contest: contest_row(record),
        events: rows,
        pitches,
    })
}

/// `on_ice` must hold one entry per event, in event order.
pub fn assemble_hockey(
    record: &RawContestRecord,
    events: &[EnrichedEvent<'_>],
    on_ice: &[OnIce],
) -> Result<ContestOutput> {
    if events.len() != on_ice.len() {
        return Err(CoreError::malformed(
            record.contest_id,
            format!("{} events but {} roster lookups", events.len(), on_ice.len()),
        ));
    }
    let rows = events
        .iter()
        .zip(on_ice)
        .map(|(event, ice)| play_row(record.contest_id, event, *ice).map(EventRow::Play))
        .collect::<Result<Vec<_>>>()?;
    Ok(ContestOutput {
        contest: contest_row(record),
        events: rows,
        pitches: vec![],
    })
}
