use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;
use url::Url;

use super::provider::ContestSource;
use crate::replay::raw::{
    PresenceInterval, RawCall, RawContestRecord, RawMatchup, RawParticipant, RawPlay,
    RawSubEvent, RawWeather, RunnerMovement, Sport,
};
use crate::replay::runners::Base;

/// Shift chart entries with this type code are real shifts; others
/// (e.g. 505, goal markers) are dropped.
const SHIFT_TYPE_CODE: i64 = 517;

/// Contest source backed by the public MLB / NHL stats APIs.
///
/// Baseball: `https://statsapi.mlb.com/api/v1.1/game/{id}/feed/live`
/// Hockey:   `https://statsapi.web.nhl.com/api/v1/game/{id}/feed/live` plus
///           `https://api.nhle.com/stats/rest/en/shiftcharts?cayenneExp=gameId={id}`
pub struct StatsApiSource {
    http: Client,
    sport: Sport,
    feed_base: String,
    shift_base: String,
}

impl StatsApiSource {
    pub fn new(sport: Sport, feed_base: &str, shift_base: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(StatsApiSource {
            http,
            sport,
            feed_base: feed_base.trim_end_matches('/').to_string(),
            shift_base: shift_base.trim_end_matches('/').to_string(),
        })
    }

    /// GET a JSON document; 404 maps to `None`.
    async fn get_json(&self, url: &str) -> Result<Option<Value>> {
        debug!("Fetching {}", url);
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("Stats API request failed: {}", url))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            anyhow::bail!("Stats API error {} for {}", resp.status(), url);
        }

        let raw: Value = resp
            .json()
            .await
            .context("Failed to parse Stats API response")?;
        Ok(Some(raw))
    }
}

#[async_trait]
impl ContestSource for StatsApiSource {
    fn name(&self) -> &str {
        "StatsAPI"
    }

    async fn fetch_contest(&self, contest_id: i64) -> Result<Option<RawContestRecord>> {
        let url = format!("{}/game/{}/feed/live", self.feed_base, contest_id);
        let Some(feed) = self.get_json(&url).await? else {
            return Ok(None);
        };

        let mut record = match self.sport {
            Sport::Baseball => parse_baseball_feed(&feed)?,
            Sport::Hockey => parse_hockey_feed(&feed)?,
        };

        if self.sport == Sport::Hockey {
            let shift_url = shift_chart_url(&self.shift_base, contest_id)?;
            if let Some(chart) = self.get_json(shift_url.as_str()).await? {
                record.shifts = parse_shift_chart(&chart);
            }
            debug!("Contest {}: {} shifts", contest_id, record.shifts.len());
        }

        Ok(Some(record))
    }
}

pub fn shift_chart_url(base: &str, contest_id: i64) -> Result<Url> {
    let mut url = Url::parse(&format!("{}/shiftcharts", base.trim_end_matches('/')))
        .context("Invalid shift chart base URL")?;
    url.query_pairs_mut()
        .append_pair("cayenneExp", &format!("gameId={}", contest_id));
    Ok(url)
}

// ── Field helpers ────────────────────────────────────────────────────────────

/// Integers arrive either as numbers or as numeric strings.
fn int(v: &Value) -> Option<i64> {
    v.as_i64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

fn uint(v: &Value) -> Option<u32> {
    int(v).and_then(|n| u32::try_from(n).ok())
}

fn float(v: &Value) -> Option<f64> {
    v.as_f64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

fn text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn index_lists<'a>(groups: impl Iterator<Item = &'a Value>) -> Vec<usize> {
    groups
        .filter_map(|v| v.as_u64())
        .map(|i| i as usize)
        .collect()
}

/// Metadata shared by both feeds; plays and periods are filled by the caller.
fn parse_contest_meta(feed: &Value, sport: Sport) -> Result<RawContestRecord> {
    let game_data = &feed["gameData"];
    let contest_id = int(&feed["gamePk"])
        .or_else(|| int(&game_data["game"]["pk"]))
        .context("Feed has no game id")?;
    let home_id = int(&game_data["teams"]["home"]["id"]).context("Feed has no home team id")?;
    let away_id = int(&game_data["teams"]["away"]["id"]).context("Feed has no away team id")?;

    let status = game_data["status"]["detailedState"]
        .as_str()
        .or_else(|| game_data["status"]["abstractGameState"].as_str())
        .unwrap_or("")
        .to_string();

    let mut decisions = BTreeMap::new();
    if let Some(obj) = feed["liveData"]["decisions"].as_object() {
        for (key, person) in obj {
            if let Some(id) = int(&person["id"]) {
                decisions.insert(key.clone(), id);
            }
        }
    }

    let weather = game_data["weather"].as_object().map(|w| RawWeather {
        condition: w.get("condition").and_then(text),
        temperature: w.get("temp").and_then(text),
    });

    Ok(RawContestRecord {
        contest_id,
        sport,
        status,
        home_id,
        away_id,
        venue_id: int(&game_data["venue"]["id"]),
        decisions,
        weather,
        plays: vec![],
        periods: vec![],
        shifts: vec![],
    })
}

// ── Baseball ─────────────────────────────────────────────────────────────────

pub fn parse_baseball_feed(feed: &Value) -> Result<RawContestRecord> {
    let mut record = parse_contest_meta(feed, Sport::Baseball)?;
    let plays = &feed["liveData"]["plays"];

    record.plays = plays["allPlays"]
        .as_array()
        .map(|a| a.iter().map(parse_at_bat).collect())
        .unwrap_or_default();

    if let Some(innings) = plays["playsByInning"].as_array() {
        for inning in innings {
            for half in ["top", "bottom"] {
                if let Some(list) = inning[half].as_array() {
                    record.periods.push(index_lists(list.iter()));
                }
            }
        }
    }

    Ok(record)
}

fn parse_at_bat(play: &Value) -> RawPlay {
    let result = &play["result"];
    let about = &play["about"];
    let matchup = &play["matchup"];

    RawPlay {
        event_index: int(&play["atBatIndex"]).or_else(|| int(&about["atBatIndex"])),
        event_type: text(&result["eventType"]),
        description: text(&result["description"]),
        period: uint(&about["inning"]),
        half: text(&about["halfInning"]),
        clock: None,
        start_time: text(&about["startTime"]),
        end_time: text(&about["endTime"]),
        away_score: uint(&result["awayScore"]).unwrap_or(0),
        home_score: uint(&result["homeScore"]).unwrap_or(0),
        outs: uint(&play["count"]["outs"]),
        team_id: None,
        coordinates: None,
        matchup: Some(RawMatchup {
            batter_id: int(&matchup["batter"]["id"]),
            bat_side: text(&matchup["batSide"]["code"]),
            pitcher_id: int(&matchup["pitcher"]["id"]),
            pitch_hand: text(&matchup["pitchHand"]["code"]),
        }),
        participants: vec![],
        runners: play["runners"]
            .as_array()
            .map(|a| a.iter().filter_map(parse_runner).collect())
            .unwrap_or_default(),
        sub_events: play["playEvents"]
            .as_array()
            .map(|a| a.iter().map(parse_play_event).collect())
            .unwrap_or_default(),
    }
}

fn parse_runner(runner: &Value) -> Option<RunnerMovement> {
    let movement = &runner["movement"];
    Some(RunnerMovement {
        runner_id: int(&runner["details"]["runner"]["id"])?,
        start: movement["start"].as_str().and_then(Base::from_code),
        end: movement["end"].as_str().and_then(Base::from_code),
        is_out: movement["isOut"].as_bool().unwrap_or(false),
    })
}

fn parse_play_event(ev: &Value) -> RawSubEvent {
    let details = &ev["details"];
    let pitch = &ev["pitchData"];
    RawSubEvent {
        index: uint(&ev["index"]),
        call: details.get("call").filter(|c| !c.is_null()).map(|call| RawCall {
            code: text(&call["code"]),
            description: text(&call["description"]),
        }),
        pitch_type: text(&details["type"]["code"]),
        start_speed: float(&pitch["startSpeed"]),
        end_speed: float(&pitch["endSpeed"]),
        zone: int(&pitch["zone"]).and_then(|z| i32::try_from(z).ok()),
        balls: uint(&ev["count"]["balls"]),
        strikes: uint(&ev["count"]["strikes"]),
    }
}

// ── Hockey ───────────────────────────────────────────────────────────────────

pub fn parse_hockey_feed(feed: &Value) -> Result<RawContestRecord> {
    let mut record = parse_contest_meta(feed, Sport::Hockey)?;
    let plays = &feed["liveData"]["plays"];

    record.plays = plays["allPlays"]
        .as_array()
        .map(|a| a.iter().map(parse_hockey_play).collect())
        .unwrap_or_default();

    if let Some(periods) = plays["playsByPeriod"].as_array() {
        for period in periods {
            if let Some(list) = period["plays"].as_array() {
                record.periods.push(index_lists(list.iter()));
            }
        }
    }

    Ok(record)
}

fn parse_hockey_play(play: &Value) -> RawPlay {
    let result = &play["result"];
    let about = &play["about"];
    let coords = &play["coordinates"];

    RawPlay {
        event_index: int(&about["eventIdx"]),
        event_type: text(&result["eventTypeId"]),
        description: text(&result["description"]),
        period: uint(&about["period"]),
        half: None,
        clock: text(&about["periodTime"]),
        start_time: text(&about["dateTime"]),
        end_time: None,
        away_score: uint(&about["goals"]["away"]).unwrap_or(0),
        home_score: uint(&about["goals"]["home"]).unwrap_or(0),
        outs: None,
        team_id: int(&play["team"]["id"]),
        coordinates: float(&coords["x"]).zip(float(&coords["y"])),
        matchup: None,
        participants: play["players"]
            .as_array()
            .map(|a| {
                a.iter()
                    .filter_map(|p| {
                        Some(RawParticipant {
                            id: int(&p["player"]["id"])?,
                            role: text(&p["playerType"]).unwrap_or_default(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default(),
        runners: vec![],
        sub_events: vec![],
    }
}

/// Convert a shift chart response into presence intervals.
///
/// Non-shift entries, incomplete entries and zero-length shifts are skipped.
pub fn parse_shift_chart(chart: &Value) -> Vec<PresenceInterval> {
    let Some(entries) = chart["data"].as_array() else {
        return vec![];
    };

    let mut skipped = 0usize;
    let shifts: Vec<PresenceInterval> = entries
        .iter()
        .filter_map(|entry| {
            let parsed = parse_shift(entry);
            if parsed.is_none() {
                skipped += 1;
            }
            parsed
        })
        .collect();

    if skipped > 0 {
        debug!("Skipped {} shift chart entries", skipped);
    }
    shifts
}

fn parse_shift(entry: &Value) -> Option<PresenceInterval> {
    if let Some(code) = int(&entry["typeCode"]) {
        if code != SHIFT_TYPE_CODE {
            return None;
        }
    }
    let start = text(&entry["startTime"])?;
    let end = text(&entry["endTime"])?;
    if start == end {
        return None;
    }
    Some(PresenceInterval::new(
        int(&entry["playerId"])?,
        int(&entry["teamId"])?,
        uint(&entry["period"])?,
        start,
        end,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const BASEBALL_FEED: &str = r#"{
        "gamePk": 565932,
        "gameData": {
            "status": {"abstractGameState": "Final", "detailedState": "Final"},
            "teams": {"home": {"id": 112}, "away": {"id": 134}},
            "venue": {"id": 17},
            "weather": {"condition": "Partly Cloudy", "temp": "58", "wind": "9 mph"}
        },
        "liveData": {
            "decisions": {"winner": {"id": 543037}, "loser": {"id": 605400}},
            "plays": {
                "allPlays": [
                    {
                        "result": {"eventType": "single", "description": "Adam Frazier singles.", "awayScore": 0, "homeScore": 0},
                        "about": {"atBatIndex": 0, "halfInning": "top", "inning": 1,
                                  "startTime": "2019-04-14T18:20:41.000Z", "endTime": "2019-04-14T18:22:10.000Z"},
                        "count": {"balls": 1, "strikes": 1, "outs": 0},
                        "matchup": {"batter": {"id": 624428}, "batSide": {"code": "L"},
                                    "pitcher": {"id": 543037}, "pitchHand": {"code": "R"}},
                        "runners": [
                            {"movement": {"start": null, "end": "1B", "isOut": false},
                             "details": {"runner": {"id": 624428}}}
                        ],
                        "playEvents": [
                            {"index": 0, "details": {"call": {"code": "B", "description": "Ball"}, "type": {"code": "FF"}},
                             "count": {"balls": 1, "strikes": 0}, "pitchData": {"startSpeed": 93.4, "endSpeed": 85.1, "zone": 11}},
                            {"index": 1, "details": {"description": "Mound visit."}},
                            {"index": 2, "details": {"call": {"code": "X", "description": "In play, no out"}, "type": {"code": "SL"}},
                             "count": {"balls": 1, "strikes": 1}, "pitchData": {"startSpeed": 85.0}}
                        ]
                    },
                    {
                        "result": {"eventType": "strikeout", "description": "Starling Marte strikes out.", "awayScore": 0, "homeScore": 0},
                        "about": {"atBatIndex": 1, "halfInning": "top", "inning": 1},
                        "count": {"outs": 1},
                        "matchup": {"batter": {"id": 516782}, "batSide": {"code": "R"},
                                    "pitcher": {"id": 543037}, "pitchHand": {"code": "R"}},
                        "runners": [
                            {"movement": {"start": null, "end": null, "isOut": true},
                             "details": {"runner": {"id": 516782}}}
                        ],
                        "playEvents": []
                    }
                ],
                "playsByInning": [{"startIndex": 0, "endIndex": 1, "top": [0, 1], "bottom": []}]
            }
        }
    }"#;

    const HOCKEY_FEED: &str = r#"{
        "gamePk": 2019020001,
        "gameData": {
            "status": {"detailedState": "Final"},
            "teams": {"home": {"id": 10}, "away": {"id": 9}},
            "venue": {"id": 5064}
        },
        "liveData": {
            "decisions": {"winner": {"id": 8475883}, "firstStar": {"id": 8479318}},
            "plays": {
                "allPlays": [
                    {"result": {"eventTypeId": "PERIOD_START", "description": "Period Start"},
                     "about": {"eventIdx": 0, "period": 1, "periodTime": "00:00", "goals": {"away": 0, "home": 0}}},
                    {"result": {"eventTypeId": "GOAL", "description": "Auston Matthews (1) Wrist Shot"},
                     "about": {"eventIdx": 1, "period": 1, "periodTime": "03:14", "dateTime": "2019-10-02T23:11:12Z",
                               "goals": {"away": 0, "home": 1}},
                     "players": [
                        {"player": {"id": 8479318}, "playerType": "Scorer"},
                        {"player": {"id": 8476853}, "playerType": "Assist"},
                        {"player": {"id": 8475883}, "playerType": "Goalie"}
                     ],
                     "team": {"id": 10},
                     "coordinates": {"x": 81.0, "y": -4.0}}
                ],
                "playsByPeriod": [{"startIndex": 0, "plays": [0, 1], "endIndex": 1}]
            }
        }
    }"#;

    const SHIFT_CHART: &str = r#"{
        "data": [
            {"playerId": 8479318, "teamId": 10, "period": 1, "startTime": "00:00", "endTime": "00:48", "typeCode": 517},
            {"playerId": 8476853, "teamId": 9, "period": 1, "startTime": "00:00", "endTime": "00:52", "typeCode": 517},
            {"playerId": 8479318, "teamId": 10, "period": 1, "startTime": "03:14", "endTime": "03:14", "typeCode": 505},
            {"playerId": 8477939, "teamId": 10, "period": 1, "startTime": "01:10", "endTime": "01:10", "typeCode": 517},
            {"playerId": 8477940, "teamId": 9, "period": 1, "startTime": "01:10", "typeCode": 517}
        ],
        "total": 5
    }"#;

    #[test]
    fn test_parse_baseball_feed() {
        let feed: Value = serde_json::from_str(BASEBALL_FEED).unwrap();
        let rec = parse_baseball_feed(&feed).unwrap();
        assert_eq!(rec.contest_id, 565932);
        assert_eq!(rec.status, "Final");
        assert_eq!((rec.home_id, rec.away_id, rec.venue_id), (112, 134, Some(17)));
        assert_eq!(rec.decisions.get("winner"), Some(&543037));
        assert_eq!(rec.decisions.get("firstStar"), None);
        let weather = rec.weather.clone().unwrap();
        assert_eq!(weather.condition.as_deref(), Some("Partly Cloudy"));
        assert_eq!(weather.temperature.as_deref(), Some("58"));
        assert_eq!(rec.periods, vec![vec![0, 1], vec![]]);

        let first = &rec.plays[0];
        assert_eq!(first.event_index, Some(0));
        assert_eq!(first.half.as_deref(), Some("top"));
        assert_eq!(first.runners.len(), 1);
        assert_eq!(first.runners[0].end, Some(Base::First));
        assert_eq!(first.sub_events.len(), 3);
        assert!(first.sub_events[1].call.is_none());
        assert_relative_eq!(first.sub_events[0].start_speed.unwrap(), 93.4, epsilon = 1e-9);
        assert_eq!(first.sub_events[0].zone, Some(11));

        let second = &rec.plays[1];
        assert_eq!(second.outs, Some(1));
        assert!(second.runners[0].is_out);
        assert_eq!(second.runners[0].end, None);
    }

    #[test]
    fn test_parse_hockey_feed() {
        let feed: Value = serde_json::from_str(HOCKEY_FEED).unwrap();
        let rec = parse_hockey_feed(&feed).unwrap();
        assert_eq!(rec.contest_id, 2019020001);
        assert_eq!(rec.sport, Sport::Hockey);
        assert!(rec.weather.is_none());
        assert_eq!(rec.periods, vec![vec![0, 1]]);

        let goal = &rec.plays[1];
        assert_eq!(goal.event_type.as_deref(), Some("GOAL"));
        assert_eq!(goal.clock.as_deref(), Some("03:14"));
        assert_eq!((goal.away_score, goal.home_score), (0, 1));
        assert_eq!(goal.participants.len(), 3);
        assert_eq!(goal.participants[2].role, "Goalie");
        assert_eq!(goal.team_id, Some(10));
        assert_eq!(goal.coordinates, Some((81.0, -4.0)));
    }

    #[test]
    fn test_parse_shift_chart_skips_non_shifts() {
        let chart: Value = serde_json::from_str(SHIFT_CHART).unwrap();
        let shifts = parse_shift_chart(&chart);
        assert_eq!(shifts.len(), 2);
        assert_eq!(shifts[0], PresenceInterval::new(8479318, 10, 1, "00:00", "00:48"));
        assert_eq!(shifts[1].side_id, 9);
    }

    #[test]
    fn test_feed_without_home_team_is_error() {
        let feed: Value = serde_json::from_str(r#"{"gamePk": 1, "gameData": {"teams": {"away": {"id": 2}}}}"#).unwrap();
        assert!(parse_baseball_feed(&feed).is_err());
    }

    #[test]
    fn test_numeric_strings_accepted() {
        assert_eq!(int(&serde_json::json!("42")), Some(42));
        assert_eq!(uint(&serde_json::json!(-1)), None);
        assert_eq!(text(&serde_json::json!(72)), Some("72".to_string()));
    }

    #[test]
    fn test_shift_chart_url() {
        let url = shift_chart_url("https://api.nhle.com/stats/rest/en/", 2019020001).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.nhle.com/stats/rest/en/shiftcharts?cayenneExp=gameId%3D2019020001"
        );
    }

    #[test]
    fn test_parsed_feed_reconstructs() {
        let feed: Value = serde_json::from_str(BASEBALL_FEED).unwrap();
        let rec = parse_baseball_feed(&feed).unwrap();
        let out = crate::replay::process_contest(&rec).unwrap().unwrap();
        assert_eq!(out.events.len(), 2);
        assert_eq!(out.pitches.len(), 2);
        match &out.events[1] {
            crate::db::models::EventRow::AtBat(ab) => {
                assert_eq!(ab.on_1b, Some(624428));
                assert_eq!(ab.outs, 0);
            }
            other => panic!("Expected at-bat, got {:?}", other),
        }
    }
}
