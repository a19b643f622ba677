//! Error types for contest reconstruction.

use thiserror::Error;

/// Result type alias using the reconstruction error type.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that abort reconstruction of a single contest.
///
/// An excluded contest (not final, no events) is not an error; see
/// [`crate::replay::normalizer::Normalized::Excluded`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A required event field is missing or unusable.
    #[error("Malformed event in contest {contest_id}: {reason}")]
    MalformedEvent { contest_id: i64, reason: String },

    /// A presence interval cannot be converted to absolute time.
    #[error("Malformed presence interval for participant {participant_id}: {reason}")]
    MalformedInterval { participant_id: i64, reason: String },

    /// Query time outside the built range of an interval index.
    #[error("Time {t}s outside indexed range [0, {max}]")]
    IntervalIndexRange { t: u32, max: u32 },

    /// Wrong number of sides, unknown side, or too many participants present.
    #[error("Interval index shape error: {0}")]
    IntervalIndexShape(String),
}

impl CoreError {
    pub(crate) fn malformed(contest_id: i64, reason: impl Into<String>) -> Self {
        CoreError::MalformedEvent {
            contest_id,
            reason: reason.into(),
        }
    }
}
