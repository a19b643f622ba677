use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

pub mod models;
use models::*;

/// Anything that accepts finished contest rows.
pub trait TabularSink: Send + Sync {
    /// Store one contest's rows. Writing the same contest again replaces it.
    fn write_contest(&self, output: &ContestOutput) -> Result<()>;
}

/// Thread-safe SQLite sink (single connection with mutex)
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the SQLite database at the given path
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let db = Database {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database connection mutex poisoned"))
    }

    /// Run schema migrations (idempotent)
    fn run_migrations(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    // ── Reads ─────────────────────────────────────────────────────────────────

    /// At-bats of one contest in event order
    #[cfg(test)]
    pub fn list_at_bats(&self, contest_id: i64) -> Result<Vec<AtBatRow>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT contest_id, event_index, event_type, description, inning, half_inning,
                    start_time, end_time, home_score, away_score, outs,
                    on_1b, on_2b, on_3b, batter_id, batter_stance, pitcher_id, pitcher_hand
             FROM at_bats WHERE contest_id=?1 ORDER BY event_index",
        )?;
        let rows = stmt
            .query_map(params![contest_id], map_at_bat)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// On-ice skaters recorded for one play, home then away
    #[cfg(test)]
    pub fn on_ice(&self, contest_id: i64, event_index: i64) -> Result<(Vec<i64>, Vec<i64>)> {
        let conn = self.lock()?;
        let row: Vec<Option<i64>> = conn.query_row(
            "SELECT home_p1, home_p2, home_p3, home_p4, home_p5, home_p6,
                    away_p1, away_p2, away_p3, away_p4, away_p5, away_p6
             FROM plays WHERE contest_id=?1 AND event_index=?2",
            params![contest_id, event_index],
            |r| (0..12).map(|i| r.get(i)).collect(),
        )?;
        let home = row[..6].iter().flatten().copied().collect();
        let away = row[6..].iter().flatten().copied().collect();
        Ok((home, away))
    }

    /// Row counts per table
    pub fn get_stats(&self) -> Result<Stats> {
        let conn = self.lock()?;
        let count = |table: &str| -> Result<i64> {
            Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?)
        };
        Ok(Stats {
            contests: count("contests")?,
            at_bats: count("at_bats")?,
            plays: count("plays")?,
            pitches: count("pitches")?,
        })
    }
}

impl TabularSink for Database {
    fn write_contest(&self, output: &ContestOutput) -> Result<()> {
        let c = &output.contest;
        if let Some(stray) = output.events.iter().find(|e| e.contest_id() != c.contest_id) {
            anyhow::bail!(
                "contest {} output carries event {} of contest {}",
                c.contest_id,
                stray.event_index(),
                stray.contest_id()
            );
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        // Replace wholesale so a re-ingested contest never keeps stale children
        for table in ["pitches", "at_bats", "plays"] {
            tx.execute(
                &format!("DELETE FROM {} WHERE contest_id=?1", table),
                params![c.contest_id],
            )?;
        }

        tx.execute(
            "INSERT OR REPLACE INTO contests (
                contest_id, sport, home_id, away_id, venue_id, winner_id, loser_id,
                first_star_id, second_star_id, third_star_id, weather_condition, temperature
             ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12)",
            params![
                c.contest_id,
                c.sport.as_str(),
                c.home_id,
                c.away_id,
                c.venue_id,
                c.winner_id,
                c.loser_id,
                c.first_star_id,
                c.second_star_id,
                c.third_star_id,
                c.weather_condition,
                c.temperature,
            ],
        )?;

        for event in &output.events {
            match event {
                EventRow::AtBat(ab) => insert_at_bat(&tx, ab)?,
                EventRow::Play(play) => insert_play(&tx, play)?,
            }
        }
        for pitch in &output.pitches {
            insert_pitch(&tx, pitch)?;
        }

        tx.commit()?;
        Ok(())
    }
}

/// In-memory sink that concatenates contests in write order.
#[derive(Default)]
pub struct MemorySink {
    batch: Mutex<ContestBatch>,
}

impl MemorySink {
    pub fn new() -> Self {
        MemorySink::default()
    }

    pub fn into_batch(self) -> Result<ContestBatch> {
        self.batch
            .into_inner()
            .map_err(|_| anyhow!("memory sink mutex poisoned"))
    }
}

impl TabularSink for MemorySink {
    fn write_contest(&self, output: &ContestOutput) -> Result<()> {
        let mut batch = self
            .batch
            .lock()
            .map_err(|_| anyhow!("memory sink mutex poisoned"))?;
        batch.push(output.clone());
        Ok(())
    }
}

// ── SQL helpers ────────────────────────────────────────────────────────────────

fn insert_at_bat(tx: &rusqlite::Transaction<'_>, ab: &AtBatRow) -> Result<()> {
    tx.execute(
        "INSERT OR REPLACE INTO at_bats (
            contest_id, event_index, event_type, description, inning, half_inning,
            start_time, end_time, home_score, away_score, outs,
            on_1b, on_2b, on_3b, batter_id, batter_stance, pitcher_id, pitcher_hand
         ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18)",
        params![
            ab.contest_id,
            ab.event_index,
            ab.event_type,
            ab.description,
            ab.inning,
            ab.half_inning,
            ab.start_time,
            ab.end_time,
            ab.home_score,
            ab.away_score,
            ab.outs,
            ab.on_1b,
            ab.on_2b,
            ab.on_3b,
            ab.batter_id,
            ab.batter_stance,
            ab.pitcher_id,
            ab.pitcher_hand,
        ],
    )?;
    Ok(())
}

fn insert_play(tx: &rusqlite::Transaction<'_>, play: &PlayRow) -> Result<()> {
    let id = |i: usize| play.participants[i].as_ref().map(|p| p.id);
    let role = |i: usize| play.participants[i].as_ref().map(|p| p.role.clone());
    let home = &play.home_on_ice;
    let away = &play.away_on_ice;
    tx.execute(
        "INSERT OR REPLACE INTO plays (
            contest_id, event_index, event_type, description, period, period_time, date_time,
            team_id, x, y, home_score, away_score,
            p1_id, p1_role, p2_id, p2_role, p3_id, p3_role, p4_id, p4_role,
            home_p1, home_p2, home_p3, home_p4, home_p5, home_p6,
            away_p1, away_p2, away_p3, away_p4, away_p5, away_p6
         ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,?20,
                   ?21,?22,?23,?24,?25,?26,?27,?28,?29,?30,?31,?32)",
        params![
            play.contest_id,
            play.event_index,
            play.event_type,
            play.description,
            play.period,
            play.period_time,
            play.date_time,
            play.team_id,
            play.x,
            play.y,
            play.home_score,
            play.away_score,
            id(0),
            role(0),
            id(1),
            role(1),
            id(2),
            role(2),
            id(3),
            role(3),
            home[0],
            home[1],
            home[2],
            home[3],
            home[4],
            home[5],
            away[0],
            away[1],
            away[2],
            away[3],
            away[4],
            away[5],
        ],
    )?;
    Ok(())
}

fn insert_pitch(tx: &rusqlite::Transaction<'_>, p: &PitchRow) -> Result<()> {
    tx.execute(
        "INSERT OR REPLACE INTO pitches (
            contest_id, event_index, pitch_index, call_code, call_description, pitch_type,
            start_speed, end_speed, zone, balls, strikes
         ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11)",
        params![
            p.contest_id,
            p.event_index,
            p.pitch_index,
            p.call_code,
            p.call_description,
            p.pitch_type,
            p.start_speed,
            p.end_speed,
            p.zone,
            p.balls,
            p.strikes,
        ],
    )?;
    Ok(())
}

#[cfg(test)]
fn map_at_bat(row: &rusqlite::Row) -> rusqlite::Result<AtBatRow> {
    Ok(AtBatRow {
        contest_id: row.get(0)?,
        event_index: row.get(1)?,
        event_type: row.get(2)?,
        description: row.get(3)?,
        inning: row.get(4)?,
        half_inning: row.get(5)?,
        start_time: row.get(6)?,
        end_time: row.get(7)?,
        home_score: row.get(8)?,
        away_score: row.get(9)?,
        outs: row.get(10)?,
        on_1b: row.get(11)?,
        on_2b: row.get(12)?,
        on_3b: row.get(13)?,
        batter_id: row.get(14)?,
        batter_stance: row.get(15)?,
        pitcher_id: row.get(16)?,
        pitcher_hand: row.get(17)?,
    })
}

/// SQLite schema (idempotent CREATE IF NOT EXISTS)
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS contests (
    contest_id        INTEGER PRIMARY KEY,
    sport             TEXT    NOT NULL,
    home_id           INTEGER NOT NULL,
    away_id           INTEGER NOT NULL,
    venue_id          INTEGER,
    winner_id         INTEGER,
    loser_id          INTEGER,
    first_star_id     INTEGER,
    second_star_id    INTEGER,
    third_star_id     INTEGER,
    weather_condition TEXT,
    temperature       TEXT
);

CREATE TABLE IF NOT EXISTS at_bats (
    contest_id    INTEGER NOT NULL,
    event_index   INTEGER NOT NULL,
    event_type    TEXT,
    description   TEXT,
    inning        INTEGER,
    half_inning   TEXT,
    start_time    TEXT,
    end_time      TEXT,
    home_score    INTEGER NOT NULL,
    away_score    INTEGER NOT NULL,
    outs          INTEGER NOT NULL,
    on_1b         INTEGER,
    on_2b         INTEGER,
    on_3b         INTEGER,
    batter_id     INTEGER,
    batter_stance TEXT,
    pitcher_id    INTEGER,
    pitcher_hand  TEXT,
    PRIMARY KEY (contest_id, event_index),
    FOREIGN KEY (contest_id) REFERENCES contests(contest_id)
);

CREATE TABLE IF NOT EXISTS plays (
    contest_id   INTEGER NOT NULL,
    event_index  INTEGER NOT NULL,
    event_type   TEXT,
    description  TEXT,
    period       INTEGER,
    period_time  TEXT,
    date_time    TEXT,
    team_id      INTEGER,
    x            REAL,
    y            REAL,
    home_score   INTEGER NOT NULL,
    away_score   INTEGER NOT NULL,
    p1_id INTEGER, p1_role TEXT,
    p2_id INTEGER, p2_role TEXT,
    p3_id INTEGER, p3_role TEXT,
    p4_id INTEGER, p4_role TEXT,
    home_p1 INTEGER, home_p2 INTEGER, home_p3 INTEGER,
    home_p4 INTEGER, home_p5 INTEGER, home_p6 INTEGER,
    away_p1 INTEGER, away_p2 INTEGER, away_p3 INTEGER,
    away_p4 INTEGER, away_p5 INTEGER, away_p6 INTEGER,
    PRIMARY KEY (contest_id, event_index),
    FOREIGN KEY (contest_id) REFERENCES contests(contest_id)
);

CREATE TABLE IF NOT EXISTS pitches (
    contest_id       INTEGER NOT NULL,
    event_index      INTEGER NOT NULL,
    pitch_index      INTEGER NOT NULL,
    call_code        TEXT,
    call_description TEXT,
    pitch_type       TEXT,
    start_speed      REAL,
    end_speed        REAL,
    zone             INTEGER,
    balls            INTEGER,
    strikes          INTEGER,
    PRIMARY KEY (contest_id, event_index, pitch_index),
    FOREIGN KEY (contest_id) REFERENCES contests(contest_id)
);
"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub contests: i64,
    pub at_bats: i64,
    pub plays: i64,
    pub pitches: i64,
}
