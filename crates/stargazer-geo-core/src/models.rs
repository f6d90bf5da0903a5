//! Core data models shared by the matcher and the aggregators.
//!
//! These types represent the stargazer records, match outcomes, and
//! per-country tallies that flow through the analytics pipeline.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::error::{GeoError, Result};

/// Timestamp layout used by the GitHub star API and the CSV cache.
pub const STARRED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// One stargazer record: who starred the repository, and when.
///
/// Optional profile fields are `None` when the user left them blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StarEvent {
    pub login: String,
    pub user_id: u64,
    pub company: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub starred_at: DateTime<Utc>,
}

impl StarEvent {
    /// `starred_at` rendered back into the `YYYY-MM-DDTHH:MM:SSZ` layout.
    pub fn starred_at_str(&self) -> String {
        self.starred_at.format(STARRED_AT_FORMAT).to_string()
    }
}

/// Parse a `YYYY-MM-DDTHH:MM:SSZ` timestamp as UTC.
///
/// `index` is the record position, used only for the error message.
pub fn parse_starred_at(index: usize, raw: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim(), STARRED_AT_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| GeoError::malformed(index, format!("bad starred_at '{}': {}", raw, e)))
}

/// Why the matcher settled on (or gave up on) a country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchReason {
    NoMatch,
    SingleMatch,
    MultipleMatchOneCountry,
    DominantCount,
    CapitalTiebreak,
    PopulationTiebreak,
}

impl MatchReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchReason::NoMatch => "no-match",
            MatchReason::SingleMatch => "single-match",
            MatchReason::MultipleMatchOneCountry => "multiple-match-one-country",
            MatchReason::DominantCount => "dominant-count",
            MatchReason::CapitalTiebreak => "capital-tiebreak",
            MatchReason::PopulationTiebreak => "population-tiebreak",
        }
    }
}

impl fmt::Display for MatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of matching one cleaned location string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    /// Canonical country key, `None` for [`MatchReason::NoMatch`].
    pub country: Option<String>,
    /// The alias or country name that decided the match.
    pub token: Option<String>,
    pub reason: MatchReason,
}

impl MatchResult {
    pub fn no_match() -> Self {
        Self {
            country: None,
            token: None,
            reason: MatchReason::NoMatch,
        }
    }

    pub fn matched(country: &str, token: &str, reason: MatchReason) -> Self {
        Self {
            country: Some(country.to_string()),
            token: Some(token.to_string()),
            reason,
        }
    }
}

/// Per-country tally built during one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CountryStats {
    pub count: u64,
    /// Stream positions of the records that resolved to this country.
    pub records: Vec<usize>,
    /// Cleaned location strings of those records.
    pub locations: Vec<String>,
}

impl CountryStats {
    pub(crate) fn record(&mut self, index: usize, location: &str) {
        self.count += 1;
        self.records.push(index);
        self.locations.push(location.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_starred_at() {
        let ts = parse_starred_at(0, "2018-01-05T13:45:10Z").unwrap();
        assert_eq!(ts.year(), 2018);
        assert_eq!(ts.month(), 1);
        assert_eq!(ts.day(), 5);
        assert_eq!(ts.hour(), 13);
    }

    #[test]
    fn test_parse_starred_at_rejects_garbage() {
        let err = parse_starred_at(7, "yesterday").unwrap_err();
        match err {
            GeoError::MalformedRecord { index, .. } => assert_eq!(index, 7),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reason_display_matches_serde() {
        let json = serde_json::to_string(&MatchReason::CapitalTiebreak).unwrap();
        assert_eq!(json, "\"capital-tiebreak\"");
        assert_eq!(MatchReason::CapitalTiebreak.to_string(), "capital-tiebreak");
    }
}
