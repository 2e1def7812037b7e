//! Turns one [`Table`] into one [`DatasetReport`].
//!
//! Processing is pure apart from logging: summary statistics, network
//! statistics, date column inference, normalization and bucketing all derive
//! new values from the table without touching it. Problems confined to
//! individual date cells are logged and counted; anything structural (a column
//! that cannot be viewed) fails the whole dataset with a [`MetricsError`].

use std::collections::BTreeMap;

use tracing::{debug, instrument, warn};

use crate::analyzers::inference::{ColumnInference, DateColumnSelection};
use crate::analyzers::summary::{distinct_count, network_stats, summarize, SummaryStats};
use crate::error::{MetricsError, Result};
use crate::logging::LogConfig;
use crate::pipeline::PipelineConfig;
use crate::registry::{DatasetConfig, DatasetRegistry, RequestedMetric};
use crate::report::{DatasetReport, TemporalInfo, TimeSeriesReport};
use crate::table::{Cell, Table};
use crate::temporal::{bucketize, normalize_column, Clock, Granularity};
use crate::{log_cell_failure, log_data_op};

/// Per-dataset analysis driven by a [`PipelineConfig`] and a registry.
pub struct DatasetProcessor<'a> {
    inference: ColumnInference,
    default_granularity: Granularity,
    log: &'a LogConfig,
    registry: &'a DatasetRegistry,
    clock: &'a dyn Clock,
}

impl<'a> DatasetProcessor<'a> {
    pub fn new(
        config: &'a PipelineConfig,
        registry: &'a DatasetRegistry,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            inference: ColumnInference::new(config.inference.clone()),
            default_granularity: config.default_granularity,
            log: &config.log,
            registry,
            clock,
        }
    }

    /// Analyzes `table` under the dataset name `name`.
    #[instrument(skip(self, table), fields(rows = table.num_rows(), columns = table.num_columns()))]
    pub fn process(&self, name: &str, table: &Table) -> Result<DatasetReport> {
        let dataset_config = self.registry.get(name);
        let column_names = table.column_names();

        let missing_required_columns = dataset_config
            .map(|config| config.missing_columns(&column_names))
            .unwrap_or_default();
        if !missing_required_columns.is_empty() {
            warn!(
                dataset = name,
                missing = ?missing_required_columns,
                "Dataset is missing required columns"
            );
        }

        let summary_stats = summarize(table)?;
        let roles = ColumnInference::column_roles(table);
        let network_stats = network_stats(table, &roles)?;

        let hint = dataset_config.and_then(|config| config.date_column.as_deref());
        let selection = self.inference.select_date_column(table, hint);
        let (temporal_info, time_series) =
            self.temporal_analysis(name, table, &selection, dataset_config)?;

        let derived_metrics = match dataset_config {
            Some(config) => derived_metrics(table, &summary_stats, &selection, config)?,
            None => BTreeMap::new(),
        };

        log_data_op!(
            self.log,
            dataset = name,
            records = table.num_rows(),
            has_temporal_data = temporal_info.has_temporal_data,
            date_column = ?temporal_info.date_column,
            "Processed dataset"
        );

        Ok(DatasetReport {
            dataset_name: name.to_string(),
            record_count: table.num_rows() as u64,
            column_names,
            summary_stats,
            temporal_info,
            network_stats,
            time_series,
            missing_required_columns,
            derived_metrics,
        })
    }

    fn temporal_analysis(
        &self,
        name: &str,
        table: &Table,
        selection: &DateColumnSelection,
        dataset_config: Option<&DatasetConfig>,
    ) -> Result<(TemporalInfo, Option<TimeSeriesReport>)> {
        let Some(column_name) = selection.column_name.as_deref() else {
            debug!(dataset = name, "No date column found");
            return Ok((TemporalInfo::absent(), None));
        };
        let column = table.column_by_name(column_name)?.ok_or_else(|| {
            MetricsError::unsupported_column(column_name, "selected date column is not in the table")
        })?;

        let normalized = normalize_column(&column, selection.representation);
        for failure in &normalized.failures {
            log_cell_failure!(
                self.log,
                dataset = name,
                column = column_name,
                row = failure.row,
                error = %self.log.field(&failure.error.to_string()),
                "Skipping unparsable date cell"
            );
        }

        let granularity = self.registry.granularity_for(name, self.default_granularity);
        let series = bucketize(
            normalized.instants.iter().copied().map(Some),
            granularity,
            self.clock,
        );
        if series.is_empty() {
            debug!(dataset = name, column = column_name, "Date column produced no buckets");
            return Ok((TemporalInfo::absent(), None));
        }

        let cumulative = dataset_config
            .filter(|config| config.requests(RequestedMetric::CumulativeSum))
            .map(|_| series.cumulative());

        let temporal_info = TemporalInfo {
            has_temporal_data: true,
            date_column: Some(column_name.to_string()),
            representation: selection.representation,
            date_columns: vec![column_name.to_string()],
        };
        let time_series = TimeSeriesReport {
            granularity,
            total_periods: series.len(),
            start_date: normalized.earliest().map(|i| i.to_iso()),
            end_date: normalized.latest().map(|i| i.to_iso()),
            unparsable_cells: normalized.failures.len() as u64,
            cumulative,
            series,
        };
        Ok((temporal_info, Some(time_series)))
    }
}

/// Scalar metrics requested by the registry entry.
///
/// `unique_count`, `sum` and `average` target the first required column that
/// is present and is not the date column; `sum` and `average` are skipped when
/// that column is not numeric. `cumulative_sum` lives on the time series.
fn derived_metrics(
    table: &Table,
    summary: &SummaryStats,
    selection: &DateColumnSelection,
    config: &DatasetConfig,
) -> Result<BTreeMap<String, f64>> {
    let mut metrics = BTreeMap::new();
    let date_column = selection
        .column_name
        .as_deref()
        .or(config.date_column.as_deref());
    let target = config
        .required_columns
        .iter()
        .find(|name| Some(name.as_str()) != date_column && table.has_column(name));
    let target_view = match target {
        Some(name) => table.column_by_name(name)?,
        None => None,
    };

    for metric in &config.metrics {
        match metric {
            RequestedMetric::Count => {
                metrics.insert(metric.to_string(), summary.record_count as f64);
            }
            RequestedMetric::CumulativeSum => {}
            RequestedMetric::UniqueCount => {
                if let Some(view) = &target_view {
                    metrics.insert(
                        format!("{metric}:{}", view.name()),
                        distinct_count(view) as f64,
                    );
                }
            }
            RequestedMetric::Sum | RequestedMetric::Average => {
                let Some(view) = target_view.as_ref().filter(|v| v.is_numeric()) else {
                    debug!(%metric, "No numeric target column for metric");
                    continue;
                };
                let values: Vec<f64> = view
                    .cells()
                    .filter_map(|cell| match cell {
                        Cell::Number(v) => Some(v),
                        _ => None,
                    })
                    .collect();
                let sum: f64 = values.iter().sum();
                let value = if *metric == RequestedMetric::Sum {
                    Some(sum)
                } else {
                    (!values.is_empty()).then(|| sum / values.len() as f64)
                };
                if let Some(value) = value {
                    metrics.insert(format!("{metric}:{}", view.name()), value);
                }
            }
        }
    }

    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::{FixedClock, Representation};
    use chrono::NaiveDate;

    fn clock() -> FixedClock {
        FixedClock::at_date(NaiveDate::from_ymd_opt(2023, 3, 15).unwrap())
    }

    fn process(name: &str, table: &Table, registry: &DatasetRegistry) -> DatasetReport {
        let config = PipelineConfig::default();
        let clock = clock();
        DatasetProcessor::new(&config, registry, &clock)
            .process(name, table)
            .unwrap()
    }

    #[test]
    fn test_gap_filled_monthly_series() {
        let table = Table::builder()
            .text("date", [Some("2023-01-05"), Some("2023-01-20"), Some("2023-03-01")])
            .build()
            .unwrap();

        let report = process("events", &table, &DatasetRegistry::empty());
        let time_series = report.time_series.unwrap();
        assert_eq!(time_series.series.counts(), vec![2, 0, 1]);
        assert_eq!(time_series.total_periods, 3);
        assert_eq!(time_series.start_date.as_deref(), Some("2023-01-05T00:00:00"));
        assert_eq!(time_series.end_date.as_deref(), Some("2023-03-01T00:00:00"));
        assert_eq!(report.temporal_info.representation, Representation::CalendarString);
        assert!(report.derived_metrics.is_empty());
    }

    #[test]
    fn test_no_temporal_data() {
        let table = Table::builder()
            .int("id", [Some(1), Some(2), Some(3)])
            .text("name", [Some("a"), Some("b"), Some("c")])
            .build()
            .unwrap();

        let report = process("plain", &table, &DatasetRegistry::empty());
        assert!(!report.temporal_info.has_temporal_data);
        assert!(report.time_series.is_none());
        assert_eq!(report.record_count, 3);
        assert_eq!(report.completeness(), 1.0);
    }

    #[test]
    fn test_registered_dataset() {
        let table = Table::builder()
            .text("date", [Some("2023-03-14"), Some("2023-03-14"), Some("2023-03-15")])
            .float("amount", [Some(10.0), Some(20.0), None])
            .text("note", [Some("a"), None, Some("c")])
            .build()
            .unwrap();

        let report = process("transactions", &table, &DatasetRegistry::builtin());
        assert_eq!(report.missing_required_columns, vec!["token"]);
        assert_eq!(report.derived_metrics["sum:amount"], 30.0);
        assert_eq!(report.derived_metrics["average:amount"], 15.0);
        assert_eq!(report.derived_metrics["count"], 3.0);

        let time_series = report.time_series.unwrap();
        assert_eq!(time_series.granularity, Granularity::Daily);
        assert_eq!(time_series.series.counts(), vec![2, 1]);
        assert!(time_series.cumulative.is_none());
    }

    #[test]
    fn test_cumulative_and_unique_count() {
        let table = Table::builder()
            .int("createdAt", [Some(1_672_531_200), Some(1_672_617_600), Some(1_677_628_800)])
            .text("address", [Some("0x1"), Some("0x1"), Some("0x2")])
            .build()
            .unwrap();

        let report = process("users", &table, &DatasetRegistry::builtin());
        assert_eq!(report.derived_metrics["unique_count:address"], 2.0);
        let time_series = report.time_series.unwrap();
        assert_eq!(time_series.series.counts(), vec![2, 0, 1]);
        assert_eq!(time_series.cumulative, Some(vec![2, 2, 3]));
        assert_eq!(report.network_stats.address_columns["address"], 2);
    }

    #[test]
    fn test_hint_column_used() {
        let table = Table::builder()
            .text("startDate", [Some("2023-01-01"), Some("2023-01-02")])
            .text("createdAt", [Some("2023-02-01"), Some("2023-03-01")])
            .int("id", [Some(1), Some(2)])
            .build()
            .unwrap();

        let report = process("active_daos", &table, &DatasetRegistry::builtin());
        assert_eq!(report.temporal_info.date_column.as_deref(), Some("createdAt"));
        assert_eq!(report.derived_metrics["count"], 2.0);
    }

    #[test]
    fn test_hinted_column_drops_bad_cells() {
        let table = Table::builder()
            .int("id", [Some(1), Some(2), Some(3)])
            .text("createdAt", [Some("2023-01-05"), Some("not-a-date"), Some("2023-03-01")])
            .build()
            .unwrap();

        let report = process("active_daos", &table, &DatasetRegistry::builtin());
        assert!(report.temporal_info.has_temporal_data);
        assert_eq!(report.temporal_info.date_column.as_deref(), Some("createdAt"));

        let time_series = report.time_series.unwrap();
        assert_eq!(time_series.unparsable_cells, 1);
        assert_eq!(time_series.series.counts(), vec![1, 0, 1]);
        assert_eq!(time_series.cumulative, Some(vec![1, 1, 2]));
    }
}
