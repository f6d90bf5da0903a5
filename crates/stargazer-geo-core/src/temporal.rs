//! Star-growth trends over time.
//!
//! Events are first counted per UTC calendar day, then regrouped into the
//! requested buckets. Buckets are emitted in the order they were first seen
//! in the event stream, and the cumulative column sums in that same order.
//! For a stream already sorted by `starred_at` (as the GitHub API returns
//! it) this is chronological; for an unsorted stream it is not.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;

use crate::models::StarEvent;

/// How [`group_by_date`] keys its buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    /// Key `"{month}/{year}"`, e.g. `"1/2018"`.
    Monthly,
    /// Key `YYYY-MM-DD`.
    Daily,
}

/// One row of a trend table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendRow {
    pub bucket: String,
    pub new_stars: u64,
    pub cumulative: u64,
}

/// Daily rows for one month, on top of everything starred before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthDetail {
    pub month: u32,
    pub year: i32,
    /// Stars dated before the first day of the month.
    pub prior: u64,
    pub rows: Vec<TrendRow>,
}

/// Star count for one day of the week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekdayRow {
    /// 0 = Monday … 6 = Sunday.
    pub index: u32,
    pub day: String,
    pub stars: u64,
}

/// Counter that remembers first-insertion order.
#[derive(Debug)]
struct Tally<K> {
    order: Vec<(K, u64)>,
    slots: HashMap<K, usize>,
}

impl<K: Clone + Eq + Hash> Tally<K> {
    fn new() -> Self {
        Self {
            order: Vec::new(),
            slots: HashMap::new(),
        }
    }

    fn add(&mut self, key: K, n: u64) {
        match self.slots.get(&key) {
            Some(&slot) => self.order[slot].1 += n,
            None => {
                self.slots.insert(key.clone(), self.order.len());
                self.order.push((key, n));
            }
        }
    }

    fn into_rows(self, start: u64, label: impl Fn(&K) -> String) -> Vec<TrendRow> {
        let mut total = start;
        self.order
            .into_iter()
            .map(|(key, n)| {
                total += n;
                TrendRow {
                    bucket: label(&key),
                    new_stars: n,
                    cumulative: total,
                }
            })
            .collect()
    }
}

/// Stars per UTC calendar day, in first-seen order.
pub fn stars_per_day<'a, I>(events: I) -> Vec<(NaiveDate, u64)>
where
    I: IntoIterator<Item = &'a StarEvent>,
{
    let mut tally = Tally::new();
    for event in events {
        tally.add(event.starred_at.date_naive(), 1);
    }
    tally.order
}

/// New and cumulative stars per month or per day.
pub fn group_by_date<'a, I>(events: I, grouping: Grouping) -> Vec<TrendRow>
where
    I: IntoIterator<Item = &'a StarEvent>,
{
    let mut tally: Tally<String> = Tally::new();
    for (date, n) in stars_per_day(events) {
        let key = match grouping {
            Grouping::Monthly => format!("{}/{}", date.month(), date.year()),
            Grouping::Daily => date.format("%Y-%m-%d").to_string(),
        };
        tally.add(key, n);
    }
    tally.into_rows(0, String::clone)
}

/// Daily rows for `month`/`year`, cumulative counted from all earlier stars.
///
/// Rows are scoped to the given year as well as the month: stars from the
/// same month of a later year are not folded in (a month-only filter would
/// merge September 2018 and September 2019 into one view). Stars after the
/// month are ignored.
///
/// Returns `None` when `month`/`year` is not a valid calendar month.
pub fn month_detail<'a, I>(events: I, month: u32, year: i32) -> Option<MonthDetail>
where
    I: IntoIterator<Item = &'a StarEvent>,
{
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;

    let mut prior = 0u64;
    let mut tally: Tally<NaiveDate> = Tally::new();
    for (date, n) in stars_per_day(events) {
        if date < start {
            prior += n;
        } else if date.month() == month && date.year() == year {
            tally.add(date, n);
        }
    }

    let rows = tally.into_rows(prior, |date| format!("{}/{}", date.day(), date.month()));
    Some(MonthDetail {
        month,
        year,
        prior,
        rows,
    })
}

/// Stars per weekday, Monday first.
///
/// With `exclude_peak_day`, the busiest single day (first one on ties) is
/// subtracted from its weekday, so one announcement spike does not skew
/// the weekly shape.
pub fn stars_per_weekday<'a, I>(events: I, exclude_peak_day: bool) -> Vec<WeekdayRow>
where
    I: IntoIterator<Item = &'a StarEvent>,
{
    let per_day = stars_per_day(events);
    let mut counts = [0u64; 7];
    for (date, n) in &per_day {
        counts[date.weekday().num_days_from_monday() as usize] += n;
    }

    if exclude_peak_day {
        let peak = per_day
            .iter()
            .fold(None::<&(NaiveDate, u64)>, |best, day| match best {
                Some(b) if b.1 >= day.1 => Some(b),
                _ => Some(day),
            });
        if let Some((date, n)) = peak {
            let slot = date.weekday().num_days_from_monday() as usize;
            counts[slot] = counts[slot].saturating_sub(*n);
        }
    }

    (0..7u32)
        .map(|index| WeekdayRow {
            index,
            day: weekday_name(index),
            stars: counts[index as usize],
        })
        .collect()
}

fn weekday_name(index: u32) -> String {
    let day = match index {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        _ => Weekday::Sun,
    };
    format!("{:?}", day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::parse_starred_at;

    fn star(ts: &str) -> StarEvent {
        StarEvent {
            login: "someone".to_string(),
            user_id: 42,
            company: None,
            name: None,
            location: None,
            bio: None,
            starred_at: parse_starred_at(0, ts).unwrap(),
        }
    }

    fn row(bucket: &str, new_stars: u64, cumulative: u64) -> TrendRow {
        TrendRow {
            bucket: bucket.to_string(),
            new_stars,
            cumulative,
        }
    }

    fn sample() -> Vec<StarEvent> {
        vec![
            star("2018-01-05T10:00:00Z"),
            star("2018-01-05T23:59:59Z"),
            star("2018-02-01T00:00:00Z"),
        ]
    }

    #[test]
    fn test_monthly() {
        let rows = group_by_date(&sample(), Grouping::Monthly);
        assert_eq!(rows, vec![row("1/2018", 2, 2), row("2/2018", 1, 3)]);
    }

    #[test]
    fn test_daily() {
        let rows = group_by_date(&sample(), Grouping::Daily);
        assert_eq!(
            rows,
            vec![row("2018-01-05", 2, 2), row("2018-02-01", 1, 3)]
        );
    }

    #[test]
    fn test_first_seen_order_kept() {
        let events = vec![
            star("2018-03-01T00:00:00Z"),
            star("2018-01-01T00:00:00Z"),
            star("2018-03-02T00:00:00Z"),
        ];
        let rows = group_by_date(&events, Grouping::Monthly);
        assert_eq!(rows, vec![row("3/2018", 2, 2), row("1/2018", 1, 3)]);
    }

    #[test]
    fn test_month_detail() {
        let events = vec![
            star("2018-08-30T00:00:00Z"),
            star("2018-09-01T08:00:00Z"),
            star("2018-09-01T09:00:00Z"),
            star("2018-09-15T00:00:00Z"),
            star("2018-10-01T00:00:00Z"),
            star("2019-09-03T00:00:00Z"),
        ];
        let detail = month_detail(&events, 9, 2018).unwrap();
        assert_eq!(detail.prior, 1);
        assert_eq!(detail.rows, vec![row("1/9", 2, 3), row("15/9", 1, 4)]);
    }

    #[test]
    fn test_month_detail_other_year_excluded() {
        let events = vec![star("2019-09-03T00:00:00Z"), star("2018-09-10T00:00:00Z")];
        let detail = month_detail(&events, 9, 2019).unwrap();
        assert_eq!(detail.prior, 1);
        assert_eq!(detail.rows, vec![row("3/9", 1, 2)]);
    }

    #[test]
    fn test_month_detail_invalid_month() {
        assert!(month_detail(&sample(), 13, 2018).is_none());
    }

    #[test]
    fn test_weekday() {
        // 2018-01-05 was a Friday, 2018-02-01 a Thursday.
        let rows = stars_per_weekday(&sample(), false);
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[4].day, "Fri");
        assert_eq!(rows[4].stars, 2);
        assert_eq!(rows[3].stars, 1);
        assert_eq!(rows.iter().map(|r| r.stars).sum::<u64>(), 3);
    }

    #[test]
    fn test_weekday_excluding_peak() {
        let rows = stars_per_weekday(&sample(), true);
        assert_eq!(rows[4].stars, 0);
        assert_eq!(rows[3].stars, 1);
    }

    #[test]
    fn test_empty() {
        assert!(group_by_date(&Vec::<StarEvent>::new(), Grouping::Daily).is_empty());
        let rows = stars_per_weekday(&Vec::<StarEvent>::new(), true);
        assert!(rows.iter().all(|r| r.stars == 0));
    }
}
