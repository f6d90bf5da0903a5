//! Stars-per-country report.
//!
//! Loads the reference data and the star cache, runs the aggregation, and
//! prints the ranked country table (or JSON with `--format json`).

use anyhow::Result;
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;

use stargazer_geo_core::aggregate::{aggregate, CountryShare, GeoSummary};

use crate::cache;
use crate::config::Config;
use crate::reference::load_reference;
use crate::OutputFormat;

#[derive(Serialize)]
struct GeoReport<'a> {
    records: usize,
    matched: u64,
    unmatched: u64,
    countries: &'a [CountryShare],
}

/// Aggregate the cached stars per country.
pub fn summarize(
    config: &Config,
    cache_path: &Path,
    trace_country: Option<&str>,
) -> Result<GeoSummary> {
    let reference = load_reference(&config.reference)?;
    let events = cache::read_events(cache_path)?;
    let trace = trace_country.or(config.report.trace_country.as_deref());
    Ok(aggregate(&events, &reference, trace))
}

pub fn run_geo_table(
    config: &Config,
    cache_path: &Path,
    trace_country: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let summary = summarize(config, cache_path, trace_country)?;
    match format {
        OutputFormat::Console => {
            print!("{}", render_table(&summary));
            let trace = trace_country.or(config.report.trace_country.as_deref());
            if let Some(country) = trace {
                print!("{}", render_trace(&summary, country));
            }
        }
        OutputFormat::Json => println!("{}", render_json(&summary)?),
    }
    Ok(())
}

/// The records that resolved to `country`, with their cleaned locations.
pub fn render_trace(summary: &GeoSummary, country: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out);
    let Some(stats) = summary.get(country) else {
        let _ = writeln!(out, "No records matched '{}'.", country);
        return out;
    };
    let _ = writeln!(out, "Records matched to '{}':", country);
    for (index, location) in stats.records.iter().zip(&stats.locations) {
        let _ = writeln!(out, "  #{:<6} {}", index, location);
    }
    out
}

pub fn render_table(summary: &GeoSummary) -> String {
    let mut out = String::new();
    let shares = summary.shares();

    let _ = writeln!(
        out,
        "{:<4} {:<28} {:>8} {:>12} {:>16}",
        "#", "COUNTRY", "STARS", "%", "% EXTRAPOLATED"
    );
    let _ = writeln!(out, "{}", "-".repeat(72));
    for (rank, share) in shares.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:<4} {:<28} {:>8} {:>12.5} {:>16.5}",
            rank + 1,
            share.country,
            share.count,
            share.percent,
            share.percent_extrapolated
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Summary:");
    let _ = writeln!(out, "  Total:         {}", summary.record_count);
    let _ = writeln!(out, "  total_matches: {}", summary.total_matches);
    let _ = writeln!(out, "  unmatched:     {}", summary.unmatched());
    out
}

pub fn render_json(summary: &GeoSummary) -> Result<String> {
    let shares = summary.shares();
    let report = GeoReport {
        records: summary.record_count,
        matched: summary.total_matches,
        unmatched: summary.unmatched(),
        countries: &shares,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stargazer_geo_core::CountryStats;

    fn summary() -> GeoSummary {
        GeoSummary {
            countries: vec![
                (
                    "israel".to_string(),
                    CountryStats {
                        count: 3,
                        records: vec![0, 1, 4],
                        locations: vec![String::new(); 3],
                    },
                ),
                (
                    "france".to_string(),
                    CountryStats {
                        count: 1,
                        records: vec![2],
                        locations: vec![String::new()],
                    },
                ),
            ],
            record_count: 8,
            total_matches: 4,
        }
    }

    #[test]
    fn test_table_rows() {
        let table = render_table(&summary());
        assert!(table.contains("israel"));
        assert!(table.contains("37.50000"));
        assert!(table.contains("75.00000"));
        assert!(table.contains("Total:         8"));
        assert!(table.contains("unmatched:     4"));
        let israel = table.find("israel").unwrap();
        let france = table.find("france").unwrap();
        assert!(israel < france);
    }

    #[test]
    fn test_trace_lists_records() {
        let mut summary = summary();
        summary.countries[1].1.locations = vec!["paris".to_string()];
        let out = render_trace(&summary, "france");
        assert!(out.contains("Records matched to 'france':"));
        assert!(out.contains("#2"));
        assert!(out.contains("paris"));
        assert!(render_trace(&summary, "peru").contains("No records matched 'peru'."));
    }

    #[test]
    fn test_json_shape() {
        let json: serde_json::Value =
            serde_json::from_str(&render_json(&summary()).unwrap()).unwrap();
        assert_eq!(json["records"], 8);
        assert_eq!(json["matched"], 4);
        assert_eq!(json["countries"][1]["country"], "france");
        assert_eq!(json["countries"][1]["percent_extrapolated"], 25.0);
    }
}
