use anyhow::Result;
use async_trait::async_trait;

use crate::replay::RawContestRecord;

/// Trait that every raw contest source must implement.
#[async_trait]
pub trait ContestSource: Send + Sync {
    /// Fetch one contest's raw record. `Ok(None)` means the contest does not exist.
    async fn fetch_contest(&self, contest_id: i64) -> Result<Option<RawContestRecord>>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}
