//! Trend classification and peak detection over a periodic series.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::temporal::PeriodicSeries;

/// Direction of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    /// Counts never decrease (a flat series counts as increasing)
    Increasing,
    /// Counts never increase
    Decreasing,
    Varying,
}

impl Trend {
    /// Classifies a sequence of counts.
    ///
    /// Non-decreasing is checked first, so a constant or single-element
    /// sequence is `Increasing`.
    pub fn classify(counts: &[u64]) -> Self {
        if counts.windows(2).all(|w| w[0] <= w[1]) {
            Trend::Increasing
        } else if counts.windows(2).all(|w| w[0] >= w[1]) {
            Trend::Decreasing
        } else {
            Trend::Varying
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
            Trend::Varying => "varying",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trend and peak of a non-empty series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub trend: Trend,
    pub peak_period: NaiveDate,
    pub peak_value: f64,
}

/// Classifies `series` and finds its peak bucket.
///
/// Returns `None` for an empty series. On ties the earliest bucket with the
/// maximum count is reported.
pub fn analyze_trend(series: &PeriodicSeries) -> Option<TrendSummary> {
    let mut peak = series.points().first()?;
    for point in series.points().iter().skip(1) {
        if point.count > peak.count {
            peak = point;
        }
    }

    Some(TrendSummary {
        trend: Trend::classify(&series.counts()),
        peak_period: peak.period_start,
        peak_value: peak.count as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::{Granularity, SeriesPoint};

    fn monthly(counts: &[u64]) -> PeriodicSeries {
        let points = counts
            .iter()
            .enumerate()
            .map(|(i, &count)| SeriesPoint {
                period_start: NaiveDate::from_ymd_opt(2023, i as u32 + 1, 1).unwrap(),
                count,
            })
            .collect();
        PeriodicSeries::from_points(Granularity::Monthly, points)
    }

    #[test]
    fn test_trend_classification() {
        assert_eq!(Trend::classify(&[1, 1, 1]), Trend::Increasing);
        assert_eq!(Trend::classify(&[1, 2, 2, 5]), Trend::Increasing);
        assert_eq!(Trend::classify(&[3, 2, 1]), Trend::Decreasing);
        assert_eq!(Trend::classify(&[3, 3, 0]), Trend::Decreasing);
        assert_eq!(Trend::classify(&[1, 3, 2]), Trend::Varying);
        assert_eq!(Trend::classify(&[7]), Trend::Increasing);
    }

    #[test]
    fn test_peak_earliest_wins() {
        let summary = analyze_trend(&monthly(&[5, 5, 3])).unwrap();
        assert_eq!(summary.peak_period, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(summary.peak_value, 5.0);
        assert_eq!(summary.trend, Trend::Decreasing);
    }

    #[test]
    fn test_peak_in_middle() {
        let summary = analyze_trend(&monthly(&[1, 3, 2])).unwrap();
        assert_eq!(summary.peak_period, NaiveDate::from_ymd_opt(2023, 2, 1).unwrap());
        assert_eq!(summary.peak_value, 3.0);
        assert_eq!(summary.trend, Trend::Varying);
    }

    #[test]
    fn test_empty_series() {
        assert!(analyze_trend(&PeriodicSeries::empty(Granularity::Daily)).is_none());
    }

    #[test]
    fn test_serialized_form() {
        let summary = analyze_trend(&monthly(&[1, 1, 1])).unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["trend"], "increasing");
        assert_eq!(json["peak_period"], "2023-01-01");
        assert_eq!(json["peak_value"], 1.0);
    }
}
