//! Per-country aggregation of star events.
//!
//! Every event's location is normalized and matched; matched events are
//! tallied per country. Unmatched events still count towards the record
//! total, which is why two percentages are reported:
//!
//! - **percent**: share of all records.
//! - **percent_extrapolated**: share of matched records only, i.e. what the
//!   distribution would look like if the unmatched users were spread the
//!   same way.

use serde::Serialize;
use std::collections::HashMap;

use crate::matcher::CountryMatcher;
use crate::models::{CountryStats, StarEvent};
use crate::normalize::normalize_location;
use crate::reference::ReferenceData;

/// Result of one aggregation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoSummary {
    /// Countries ranked by count, descending. Ties keep first-seen order.
    pub countries: Vec<(String, CountryStats)>,
    pub record_count: usize,
    pub total_matches: u64,
}

/// One row of the ranked country report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryShare {
    pub country: String,
    pub count: u64,
    pub percent: f64,
    pub percent_extrapolated: f64,
}

impl GeoSummary {
    pub fn unmatched(&self) -> u64 {
        (self.record_count as u64).saturating_sub(self.total_matches)
    }

    pub fn get(&self, country: &str) -> Option<&CountryStats> {
        self.countries
            .iter()
            .find(|(name, _)| name == country)
            .map(|(_, stats)| stats)
    }

    /// Ranked rows with both percentages filled in.
    pub fn shares(&self) -> Vec<CountryShare> {
        self.countries
            .iter()
            .map(|(country, stats)| CountryShare {
                country: country.clone(),
                count: stats.count,
                percent: percentage(stats.count, self.record_count as u64),
                percent_extrapolated: percentage(stats.count, self.total_matches),
            })
            .collect()
    }
}

/// `100 * part / whole`, or `0.0` when `whole` is zero.
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        100.0 * part as f64 / whole as f64
    }
}

/// Match every event and tally the results per country.
///
/// `trace_country`, when set, logs each classification that resolved to
/// that country (at `info`), for checking why records land where they do.
pub fn aggregate<'a, I>(
    events: I,
    reference: &ReferenceData,
    trace_country: Option<&str>,
) -> GeoSummary
where
    I: IntoIterator<Item = &'a StarEvent>,
{
    let matcher = CountryMatcher::new(reference);
    let mut order: Vec<(String, CountryStats)> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut record_count = 0usize;
    let mut total_matches = 0u64;

    for (index, event) in events.into_iter().enumerate() {
        record_count += 1;
        let cleaned = normalize_location(event.location.as_deref());
        let result = matcher.match_location(&cleaned);

        let Some(country) = result.country.as_deref() else {
            continue;
        };

        if trace_country == Some(country) {
            tracing::info!(
                country,
                location = %cleaned,
                token = result.token.as_deref().unwrap_or(""),
                reason = %result.reason,
                "traced classification"
            );
        }

        let slot = *slots.entry(country.to_string()).or_insert_with(|| {
            order.push((country.to_string(), CountryStats::default()));
            order.len() - 1
        });
        order[slot].1.record(index, &cleaned);
        total_matches += 1;
    }

    order.sort_by(|a, b| b.1.count.cmp(&a.1.count));

    tracing::debug!(record_count, total_matches, countries = order.len(), "aggregated");

    GeoSummary {
        countries: order,
        record_count,
        total_matches,
    }
}
