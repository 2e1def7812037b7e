//! Property-based tests for the metrics pipeline.
//!
//! ## Properties
//!
//! - **Density**: a bucketized series has exactly one entry per calendar
//!   bucket from the earliest observed bucket to the injected "now", with
//!   strictly increasing keys, and no instant is lost.
//! - **Completeness bound**: `0 <= completeness <= 1`, and it equals `1`
//!   exactly when no cell is missing.
//! - **Trend rules**: the classification agrees with the monotonicity of the
//!   counts, and the peak is the earliest maximum.
//! - **Idempotence**: two runs over the same tables with the same clock
//!   serialize to the same bytes.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate};
use dao_metrics::analyzers::summary::summarize;
use dao_metrics::analyzers::{analyze_trend, Trend};
use dao_metrics::prelude::*;
use dao_metrics::temporal::{bucketize, Instant, PeriodicSeries, SeriesPoint};
use proptest::prelude::*;

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

fn months_between(start: NaiveDate, end: NaiveDate) -> usize {
    ((end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32) as usize + 1
}

/// Day offsets from 2020-01-01 (about five years), some of them null.
fn instant_offsets() -> impl Strategy<Value = Vec<Option<u32>>> {
    prop::collection::vec(prop::option::weighted(0.9, 0..1800u32), 0..200)
}

fn to_instants(offsets: &[Option<u32>]) -> Vec<Option<Instant>> {
    offsets
        .iter()
        .map(|offset| offset.map(|days| Instant::from_date(base_date() + Duration::days(days as i64))))
        .collect()
}

fn monthly_series(counts: &[u64]) -> PeriodicSeries {
    let points = counts
        .iter()
        .enumerate()
        .map(|(i, &count)| SeriesPoint {
            period_start: base_date()
                .checked_add_months(chrono::Months::new(i as u32))
                .unwrap(),
            count,
        })
        .collect();
    PeriodicSeries::from_points(Granularity::Monthly, points)
}

proptest! {
    #[test]
    fn monthly_series_is_dense(offsets in instant_offsets(), now_offset in 0..2200u32) {
        let now = base_date() + Duration::days(now_offset as i64);
        let clock = FixedClock::at_date(now);
        let instants = to_instants(&offsets);
        let observed = instants.iter().flatten().count() as u64;

        let series = bucketize(instants.clone(), Granularity::Monthly, &clock);

        if observed == 0 {
            prop_assert!(series.is_empty());
            return Ok(());
        }

        let periods = series.periods();
        prop_assert!(periods.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(periods.iter().all(|p| p.day() == 1));
        for pair in periods.windows(2) {
            prop_assert_eq!(Granularity::Monthly.step(pair[0]), Some(pair[1]));
        }

        let earliest = instants.iter().flatten().min().unwrap().date();
        let latest = instants.iter().flatten().max().unwrap().date();
        let first = Granularity::Monthly.truncate(earliest);
        let last = Granularity::Monthly.truncate(now.max(latest));
        prop_assert_eq!(periods[0], first);
        prop_assert_eq!(*periods.last().unwrap(), last);
        prop_assert_eq!(series.len(), months_between(first, last));
        prop_assert_eq!(series.total(), observed);
    }

    #[test]
    fn daily_series_is_dense(offsets in instant_offsets(), now_offset in 0..2200u32) {
        let now = base_date() + Duration::days(now_offset as i64);
        let instants = to_instants(&offsets);
        let series = bucketize(instants.clone(), Granularity::Daily, &FixedClock::at_date(now));

        if let Some(earliest) = instants.iter().flatten().min() {
            let latest = instants.iter().flatten().max().unwrap().date();
            let end = now.max(latest);
            let expected = (end - earliest.date()).num_days() as usize + 1;
            prop_assert_eq!(series.len(), expected);
            prop_assert!(series.periods().windows(2).all(|w| w[1] - w[0] == Duration::days(1)));
        } else {
            prop_assert!(series.is_empty());
        }
    }

    #[test]
    fn completeness_is_bounded(
        ints in prop::collection::vec(prop::option::of(any::<i32>()), 0..50),
        words in prop::collection::vec(prop::option::of("[a-z]{0,4}"), 0..50),
    ) {
        let rows = ints.len().min(words.len());
        let table = Table::builder()
            .int("n", ints[..rows].iter().map(|v| v.map(i64::from)).collect::<Vec<_>>())
            .text("s", words[..rows].iter().map(|w| w.as_deref()).collect::<Vec<_>>())
            .build()
            .unwrap();

        let summary = summarize(&table).unwrap();
        let completeness = summary.completeness();
        prop_assert!((0.0..=1.0).contains(&completeness));

        let any_missing = ints[..rows].iter().any(Option::is_none)
            || words[..rows].iter().any(|w| w.as_deref().map_or(true, str::is_empty));
        if rows > 0 {
            prop_assert_eq!(completeness == 1.0, !any_missing);
        } else {
            prop_assert_eq!(completeness, 0.0);
        }
    }

    #[test]
    fn trend_matches_monotonicity(counts in prop::collection::vec(0..20u64, 1..24)) {
        let summary = analyze_trend(&monthly_series(&counts)).unwrap();

        let non_decreasing = counts.windows(2).all(|w| w[0] <= w[1]);
        let non_increasing = counts.windows(2).all(|w| w[0] >= w[1]);
        let expected = if non_decreasing {
            Trend::Increasing
        } else if non_increasing {
            Trend::Decreasing
        } else {
            Trend::Varying
        };
        prop_assert_eq!(summary.trend, expected);

        let max = *counts.iter().max().unwrap();
        let first_max = counts.iter().position(|&c| c == max).unwrap();
        prop_assert_eq!(summary.peak_value, max as f64);
        prop_assert_eq!(
            summary.peak_period,
            base_date().checked_add_months(chrono::Months::new(first_max as u32)).unwrap()
        );
    }

    #[test]
    fn runs_are_idempotent(offsets in prop::collection::vec(prop::option::of(0..900u32), 1..40)) {
        let dates: Vec<Option<String>> = offsets
            .iter()
            .map(|o| o.map(|days| (base_date() + Duration::days(days as i64)).to_string()))
            .collect();
        let table = Table::builder()
            .text("createdAt", dates.iter().map(|d| d.as_deref()).collect::<Vec<_>>())
            .build()
            .unwrap();

        let clock = Arc::new(FixedClock::at_date(NaiveDate::from_ymd_opt(2022, 6, 30).unwrap()));
        let pipeline = MetricsPipeline::new(PipelineConfig::default()).with_clock(clock);
        let first = pipeline
            .run(BTreeMap::from([("events".to_string(), table.clone())]))
            .unwrap();
        let second = pipeline
            .run(BTreeMap::from([("events".to_string(), table)]))
            .unwrap();

        prop_assert_eq!(first.corpus.to_json().unwrap(), second.corpus.to_json().unwrap());
    }
}

#[test]
fn fixed_trend_conventions() {
    assert_eq!(analyze_trend(&monthly_series(&[1, 1, 1])).unwrap().trend, Trend::Increasing);
    assert_eq!(analyze_trend(&monthly_series(&[3, 2, 1])).unwrap().trend, Trend::Decreasing);
    assert_eq!(analyze_trend(&monthly_series(&[1, 3, 2])).unwrap().trend, Trend::Varying);

    let peak = analyze_trend(&monthly_series(&[5, 5, 3])).unwrap();
    assert_eq!(peak.peak_period, base_date());
}
