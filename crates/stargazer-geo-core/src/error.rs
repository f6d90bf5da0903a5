//! Error types for the core crate.
//!
//! Only two things can go wrong in the core: a reference dataset cannot be
//! turned into lookup tables, or a cached stargazer record is unusable.
//! An unmatched location is *not* an error; see
//! [`MatchReason::NoMatch`](crate::models::MatchReason::NoMatch).

use thiserror::Error;

/// Error type for reference-data loading and record parsing.
#[derive(Debug, Error)]
pub enum GeoError {
    /// A reference dataset is missing or malformed. Fatal for the run.
    #[error("reference dataset '{dataset}' could not be loaded: {reason}")]
    DataLoad { dataset: String, reason: String },

    /// A star record is missing fields or carries an unparsable value.
    #[error("malformed star record #{index}: {reason}")]
    MalformedRecord { index: usize, reason: String },
}

impl GeoError {
    pub fn data_load(dataset: impl Into<String>, reason: impl ToString) -> Self {
        GeoError::DataLoad {
            dataset: dataset.into(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(index: usize, reason: impl ToString) -> Self {
        GeoError::MalformedRecord {
            index,
            reason: reason.to_string(),
        }
    }
}

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, GeoError>;
