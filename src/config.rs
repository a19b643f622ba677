use clap::Parser;
use std::collections::HashSet;

use crate::replay::{Sport, TeamDirectory};

/// Rebuild play-by-play game state from MLB / NHL feeds into SQLite
#[derive(Parser, Debug, Clone)]
#[command(name = "playstate", version, about)]
pub struct Config {
    /// Sport of the contests to ingest
    #[arg(long, env = "SPORT", value_enum, default_value = "baseball")]
    pub sport: Sport,

    /// Contest (game) ids to ingest, comma separated
    #[arg(long = "contests", env = "CONTEST_IDS", value_delimiter = ',', required = true)]
    pub contest_ids: Vec<i64>,

    /// Only keep contests involving these team codes (e.g. "nya,bos"), comma separated
    #[arg(long, env = "TEAMS", value_delimiter = ',')]
    pub teams: Vec<String>,

    /// SQLite database path
    #[arg(long, env = "DATABASE_PATH", default_value = "playstate.db")]
    pub database_path: String,

    /// Keep results in memory instead of writing to the database
    #[arg(long, env = "DRY_RUN", default_value = "false")]
    pub dry_run: bool,

    /// MLB stats API base URL
    #[arg(long, env = "MLB_API_URL", default_value = "https://statsapi.mlb.com/api/v1.1")]
    pub mlb_api_url: String,

    /// NHL stats API base URL
    #[arg(long, env = "NHL_API_URL", default_value = "https://statsapi.web.nhl.com/api/v1")]
    pub nhl_api_url: String,

    /// NHL shift chart API base URL
    #[arg(long, env = "SHIFT_API_URL", default_value = "https://api.nhle.com/stats/rest/en")]
    pub shift_api_url: String,

    /// Maximum contests fetched concurrently
    #[arg(long, env = "CONCURRENCY", default_value = "4")]
    pub concurrency: usize,
}

impl Config {
    /// Feed base URL for the configured sport
    pub fn feed_url(&self) -> &str {
        match self.sport {
            Sport::Baseball => &self.mlb_api_url,
            Sport::Hockey => &self.nhl_api_url,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.contest_ids.is_empty() {
            anyhow::bail!("at least one contest id is required");
        }
        if self.concurrency == 0 || self.concurrency > 64 {
            anyhow::bail!("concurrency must be between 1 and 64");
        }
        for url in [self.feed_url(), self.shift_api_url.as_str()] {
            url::Url::parse(url).map_err(|e| anyhow::anyhow!("invalid API URL {}: {}", url, e))?;
        }
        Ok(())
    }

    /// Resolve `--teams` codes to ids. Empty means no filter.
    pub fn team_filter(&self, directory: &TeamDirectory) -> anyhow::Result<HashSet<i64>> {
        self.teams
            .iter()
            .map(|code| {
                directory.id(code).ok_or_else(|| {
                    anyhow::anyhow!("unknown {} team code: {}", directory.sport(), code)
                })
            })
            .collect()
    }
}
