//! Star-history reports: monthly, daily, one month in detail, and
//! day-of-week.

use anyhow::{bail, Result};
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;

use stargazer_geo_core::models::StarEvent;
use stargazer_geo_core::temporal::{
    group_by_date, month_detail, stars_per_weekday, Grouping, MonthDetail, TrendRow, WeekdayRow,
};

use crate::cache;
use crate::OutputFormat;

fn load(cache_path: &Path) -> Result<Vec<StarEvent>> {
    let events = cache::read_events(cache_path)?;
    tracing::debug!(events = events.len(), "loaded star cache");
    Ok(events)
}

fn emit<T: Serialize + ?Sized>(
    value: &T,
    format: OutputFormat,
    console: impl FnOnce() -> String,
) -> Result<()> {
    match format {
        OutputFormat::Console => print!("{}", console()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

pub fn run_grouped(cache_path: &Path, grouping: Grouping, format: OutputFormat) -> Result<()> {
    let events = load(cache_path)?;
    let rows = group_by_date(&events, grouping);
    let label = match grouping {
        Grouping::Monthly => "MONTH",
        Grouping::Daily => "DAY",
    };
    emit(rows.as_slice(), format, || render_trend(label, &rows))
}

pub fn run_month_detail(
    cache_path: &Path,
    month: u32,
    year: i32,
    format: OutputFormat,
) -> Result<()> {
    let events = load(cache_path)?;
    let Some(detail) = month_detail(&events, month, year) else {
        bail!("Invalid month: {}/{}", month, year);
    };
    emit(&detail, format, || render_month(&detail))
}

pub fn run_weekday(cache_path: &Path, exclude_peak_day: bool, format: OutputFormat) -> Result<()> {
    let events = load(cache_path)?;
    let rows = stars_per_weekday(&events, exclude_peak_day);
    emit(rows.as_slice(), format, || render_weekday(&rows))
}

pub fn render_trend(label: &str, rows: &[TrendRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<12} {:>10} {:>12}", label, "NEW", "CUMULATIVE");
    for row in rows {
        let _ = writeln!(out, "{:<12} {:>10} {:>12}", row.bucket, row.new_stars, row.cumulative);
    }
    out
}

pub fn render_month(detail: &MonthDetail) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}/{} (stars before: {})", detail.month, detail.year, detail.prior);
    out.push_str(&render_trend("DAY", &detail.rows));
    out
}

pub fn render_weekday(rows: &[WeekdayRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<6} {:>8}", "DAY", "STARS");
    for row in rows {
        let _ = writeln!(out, "{:<6} {:>8}", row.day, row.stars);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(bucket: &str, new_stars: u64, cumulative: u64) -> TrendRow {
        TrendRow {
            bucket: bucket.to_string(),
            new_stars,
            cumulative,
        }
    }

    #[test]
    fn test_render_trend() {
        let out = render_trend("MONTH", &[row("1/2018", 2, 2), row("2/2018", 1, 3)]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("MONTH"));
        assert!(lines[1].starts_with("1/2018"));
        assert!(lines[2].ends_with('3'));
    }

    #[test]
    fn test_render_month_header() {
        let detail = MonthDetail {
            month: 9,
            year: 2018,
            prior: 12,
            rows: vec![row("1/9", 2, 14)],
        };
        let out = render_month(&detail);
        assert!(out.starts_with("9/2018 (stars before: 12)"));
        assert!(out.contains("1/9"));
    }

    #[test]
    fn test_render_weekday() {
        let rows = vec![WeekdayRow {
            index: 0,
            day: "Mon".to_string(),
            stars: 5,
        }];
        let out = render_weekday(&rows);
        assert!(out.lines().nth(1).unwrap().starts_with("Mon"));
    }
}
