//! Report types produced by the pipeline.
//!
//! A [`DatasetReport`] bundles everything derived from one table. A
//! [`CorpusReport`] is the aggregation of all dataset reports of a run and is
//! the pipeline's only durable output; it never references raw tables.
//! Every keyed collection is a `BTreeMap`, so serializing the same report
//! always produces the same bytes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analyzers::summary::{NetworkStats, SummaryStats};
use crate::analyzers::trend::TrendSummary;
use crate::temporal::{Granularity, PeriodicSeries, Representation};

/// Outcome of date column inference for one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalInfo {
    pub has_temporal_data: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_column: Option<String>,
    pub representation: Representation,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub date_columns: Vec<String>,
}

impl TemporalInfo {
    pub fn absent() -> Self {
        Self {
            has_temporal_data: false,
            date_column: None,
            representation: Representation::None,
            date_columns: Vec::new(),
        }
    }
}

/// The dense activity series of a dataset plus its observed range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeriesReport {
    pub granularity: Granularity,
    pub series: PeriodicSeries,
    pub total_periods: usize,
    /// Earliest observed instant, ISO-8601
    pub start_date: Option<String>,
    /// Latest observed instant, ISO-8601
    pub end_date: Option<String>,
    /// Non-null date cells that could not be normalized
    pub unparsable_cells: u64,
    /// Running total of the series, when requested by the registry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cumulative: Option<Vec<u64>>,
}

impl TimeSeriesReport {
    /// `"<start> to <end>"`, or `"Unknown"` when either end is missing.
    pub fn time_span(&self) -> String {
        match (&self.start_date, &self.end_date) {
            (Some(start), Some(end)) => format!("{start} to {end}"),
            _ => "Unknown".to_string(),
        }
    }
}

/// Complete per-dataset analysis bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetReport {
    pub dataset_name: String,
    pub record_count: u64,
    pub column_names: Vec<String>,
    pub summary_stats: SummaryStats,
    pub temporal_info: TemporalInfo,
    pub network_stats: NetworkStats,
    /// Present iff `temporal_info.has_temporal_data`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_series: Option<TimeSeriesReport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_required_columns: Vec<String>,
    /// Registry-requested scalar metrics, e.g. `sum:amount`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub derived_metrics: BTreeMap<String, f64>,
}

impl DatasetReport {
    pub fn completeness(&self) -> f64 {
        self.summary_stats.completeness()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetrics {
    pub record_count: u64,
    pub column_count: u64,
    pub completeness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalMetrics {
    /// `None` when the series is empty
    pub activity_trend: Option<TrendSummary>,
    pub time_span: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkMetrics {
    pub network_distribution: BTreeMap<String, u64>,
    pub unique_addresses: u64,
}

/// Corpus-level counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossDatasetMetrics {
    pub total_datasets: usize,
    pub datasets_with_temporal_data: usize,
    pub datasets_with_network_data: usize,
}

/// A dataset dropped from the run because its processing failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedDataset {
    pub name: String,
    pub reason: String,
}

/// Aggregation of all dataset reports of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusReport {
    pub dataset_metrics: BTreeMap<String, DatasetMetrics>,
    pub temporal_metrics: BTreeMap<String, TemporalMetrics>,
    pub network_metrics: BTreeMap<String, NetworkMetrics>,
    pub cross_dataset_metrics: CrossDatasetMetrics,
    #[serde(default)]
    pub excluded_datasets: Vec<ExcludedDataset>,
}

impl CorpusReport {
    /// Serializes the report as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
