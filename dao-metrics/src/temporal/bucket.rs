//! Calendar bucketing of instants into dense periodic series.
//!
//! Instants are truncated to the start of their bucket (first day of the
//! month, or the day itself), counted, and the series is then filled with
//! zero-count buckets from the earliest observed bucket up to the bucket
//! containing "now". The result has exactly one entry per bucket in range and
//! strictly increasing keys.
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use dao_metrics::temporal::{bucketize, FixedClock, Granularity, Instant};
//!
//! let jan = Instant::from_date(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
//! let mar = Instant::from_date(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
//! let clock = FixedClock::at_date(NaiveDate::from_ymd_opt(2024, 3, 20).unwrap());
//!
//! let series = bucketize([Some(jan), Some(mar)], Granularity::Monthly, &clock);
//! assert_eq!(series.counts(), vec![1, 0, 1]);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::clock::Clock;
use super::normalize::Instant;

/// Bucket width of a periodic series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Monthly,
    Daily,
}

impl Granularity {
    /// Start of the bucket containing `date`.
    pub fn truncate(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Monthly => date.with_day(1).unwrap_or(date),
            Granularity::Daily => date,
        }
    }

    /// Start of the bucket following the one starting at `period_start`.
    pub fn step(&self, period_start: NaiveDate) -> Option<NaiveDate> {
        match self {
            Granularity::Monthly => period_start.checked_add_months(Months::new(1)),
            Granularity::Daily => period_start.succ_opt(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Monthly => "monthly",
            Granularity::Daily => "daily",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bucket of a periodic series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub period_start: NaiveDate,
    pub count: u64,
}

/// Dense, chronologically ordered bucket counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodicSeries {
    granularity: Granularity,
    points: Vec<SeriesPoint>,
}

impl PeriodicSeries {
    pub fn empty(granularity: Granularity) -> Self {
        Self {
            granularity,
            points: Vec::new(),
        }
    }

    /// Builds a series from explicit points.
    ///
    /// Points are sorted by period; callers are responsible for density.
    pub fn from_points(granularity: Granularity, mut points: Vec<SeriesPoint>) -> Self {
        points.sort_by_key(|p| p.period_start);
        Self {
            granularity,
            points,
        }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn periods(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.period_start).collect()
    }

    pub fn counts(&self) -> Vec<u64> {
        self.points.iter().map(|p| p.count).collect()
    }

    /// Total number of instants counted.
    pub fn total(&self) -> u64 {
        self.points.iter().map(|p| p.count).sum()
    }

    /// Running total of the counts.
    pub fn cumulative(&self) -> Vec<u64> {
        self.points
            .iter()
            .scan(0u64, |acc, p| {
                *acc += p.count;
                Some(*acc)
            })
            .collect()
    }
}

/// Groups instants into calendar buckets and fills gaps up to "now".
///
/// `None` entries are dropped. An empty input yields an empty series. If the
/// data contains instants after `clock`'s current bucket, the series extends
/// to the latest observed bucket instead so that it stays dense.
pub fn bucketize<I>(instants: I, granularity: Granularity, clock: &dyn Clock) -> PeriodicSeries
where
    I: IntoIterator<Item = Option<Instant>>,
{
    let mut counts: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for instant in instants.into_iter().flatten() {
        *counts
            .entry(granularity.truncate(instant.date()))
            .or_insert(0) += 1;
    }

    let (start, last_observed) = match (counts.keys().next(), counts.keys().next_back()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return PeriodicSeries::empty(granularity),
    };
    let end = granularity.truncate(clock.today()).max(last_observed);

    let mut cursor = Some(start);
    while let Some(period) = cursor.filter(|p| *p <= end) {
        counts.entry(period).or_insert(0);
        cursor = granularity.step(period);
    }

    let points = counts
        .into_iter()
        .map(|(period_start, count)| SeriesPoint {
            period_start,
            count,
        })
        .collect();

    PeriodicSeries {
        granularity,
        points,
    }
}
