//! Per-dataset summary statistics, completeness and network statistics.
//!
//! For every column the summary records missing-value and distinct-value
//! counts. Numeric columns additionally get descriptive statistics (count,
//! mean, sample standard deviation, min, quartiles, max) with quartiles
//! computed by linear interpolation between closest ranks.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::analyzers::inference::ColumnRoles;
use crate::error::Result;
use crate::table::{Cell, ColumnView, Table};

/// Descriptive statistics of one numeric column.
///
/// Fields other than `count` are `None` when there is not enough data
/// (no values at all, or fewer than two for the standard deviation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStats {
    pub count: u64,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub q25: Option<f64>,
    #[serde(rename = "50%")]
    pub median: Option<f64>,
    #[serde(rename = "75%")]
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl NumericStats {
    /// Computes statistics over the non-null values of a column.
    pub fn from_values(mut values: Vec<f64>) -> Self {
        let count = values.len();
        if count == 0 {
            return Self {
                count: 0,
                mean: None,
                std: None,
                min: None,
                q25: None,
                median: None,
                q75: None,
                max: None,
            };
        }

        values.sort_by(f64::total_cmp);
        let n = count as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = (count > 1).then(|| {
            let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (sum_sq / (n - 1.0)).sqrt()
        });

        Self {
            count: count as u64,
            mean: Some(mean),
            std,
            min: values.first().copied(),
            q25: Some(quantile(&values, 0.25)),
            median: Some(quantile(&values, 0.5)),
            q75: Some(quantile(&values, 0.75)),
            max: values.last().copied(),
        }
    }
}

/// Linear-interpolated quantile of an ascending, non-empty slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Summary statistics of one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub record_count: u64,
    pub column_count: u64,
    pub numeric_stats: BTreeMap<String, NumericStats>,
    pub missing_values: BTreeMap<String, u64>,
    pub unique_values: BTreeMap<String, u64>,
}

impl SummaryStats {
    /// Sum of missing cells over all columns.
    pub fn total_missing(&self) -> u64 {
        self.missing_values.values().sum()
    }

    /// Fraction of non-missing cells in the table.
    pub fn completeness(&self) -> f64 {
        completeness_ratio(self.total_missing(), self.record_count, self.column_count)
    }
}

/// `1 - missing / (rows * columns)`, or `0` for a zero-sized table.
pub fn completeness_ratio(missing: u64, record_count: u64, column_count: u64) -> f64 {
    let total = record_count.saturating_mul(column_count);
    if total == 0 {
        0.0
    } else {
        1.0 - missing as f64 / total as f64
    }
}

/// Number of distinct non-null values in a column.
pub fn distinct_count(column: &ColumnView) -> u64 {
    column
        .cells()
        .filter_map(|cell| cell.key())
        .collect::<HashSet<_>>()
        .len() as u64
}

/// Computes missing counts, distinct counts and numeric statistics.
#[instrument(skip(table), fields(rows = table.num_rows(), columns = table.num_columns()))]
pub fn summarize(table: &Table) -> Result<SummaryStats> {
    let mut numeric_stats = BTreeMap::new();
    let mut missing_values = BTreeMap::new();
    let mut unique_values = BTreeMap::new();

    for column in table.columns()? {
        let name = column.name().to_string();
        missing_values.insert(name.clone(), column.null_count() as u64);
        unique_values.insert(name.clone(), distinct_count(&column));

        if column.is_numeric() {
            let values = column
                .cells()
                .filter_map(|cell| match cell {
                    Cell::Number(v) => Some(v),
                    _ => None,
                })
                .collect();
            numeric_stats.insert(name, NumericStats::from_values(values));
        }
    }

    Ok(SummaryStats {
        record_count: table.num_rows() as u64,
        column_count: table.num_columns() as u64,
        numeric_stats,
        missing_values,
        unique_values,
    })
}

/// Distinct counts of address-like columns and the network frequency table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkStats {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub address_columns: BTreeMap<String, u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub networks: Option<BTreeMap<String, u64>>,
}

impl NetworkStats {
    /// `true` when the table has neither address-like nor network columns.
    pub fn is_empty(&self) -> bool {
        self.address_columns.is_empty() && self.networks.is_none()
    }

    /// Sum of distinct values across all address-like columns.
    pub fn unique_addresses(&self) -> u64 {
        self.address_columns.values().sum()
    }
}

/// Computes network statistics for the columns identified in `roles`.
pub fn network_stats(table: &Table, roles: &ColumnRoles) -> Result<NetworkStats> {
    let mut stats = NetworkStats::default();

    for name in &roles.address_columns {
        if let Some(column) = table.column_by_name(name)? {
            stats.address_columns.insert(name.clone(), distinct_count(&column));
        }
    }

    if let Some(name) = &roles.network_column {
        if let Some(column) = table.column_by_name(name)? {
            let mut frequencies = BTreeMap::new();
            for key in column.cells().filter_map(|cell| cell.key()) {
                *frequencies.entry(key).or_insert(0u64) += 1;
            }
            stats.networks = Some(frequencies);
        }
    }

    Ok(stats)
}
