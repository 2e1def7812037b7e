//! Cross-dataset aggregation of dataset reports into a corpus report.
//!
//! Both functions are pure folds over well-formed reports; failed datasets
//! have already been filtered out (and recorded as excluded) upstream.

use crate::analyzers::trend::analyze_trend;
use crate::report::{
    CorpusReport, CrossDatasetMetrics, DatasetMetrics, DatasetReport, ExcludedDataset,
    NetworkMetrics, TemporalMetrics,
};

/// Counts datasets overall, with a time series, and with network data.
pub fn aggregate(reports: &[DatasetReport]) -> CrossDatasetMetrics {
    reports
        .iter()
        .fold(CrossDatasetMetrics::default(), |mut acc, report| {
            acc.total_datasets += 1;
            if report.time_series.is_some() {
                acc.datasets_with_temporal_data += 1;
            }
            if !report.network_stats.is_empty() {
                acc.datasets_with_network_data += 1;
            }
            acc
        })
}

/// Builds the corpus report from per-dataset reports.
pub fn build_corpus_report(
    reports: &[DatasetReport],
    excluded_datasets: Vec<ExcludedDataset>,
) -> CorpusReport {
    let mut corpus = CorpusReport {
        cross_dataset_metrics: aggregate(reports),
        excluded_datasets,
        ..Default::default()
    };

    for report in reports {
        let name = report.dataset_name.clone();

        corpus.dataset_metrics.insert(
            name.clone(),
            DatasetMetrics {
                record_count: report.record_count,
                column_count: report.column_names.len() as u64,
                completeness: report.completeness(),
            },
        );

        if let Some(time_series) = &report.time_series {
            corpus.temporal_metrics.insert(
                name.clone(),
                TemporalMetrics {
                    activity_trend: analyze_trend(&time_series.series),
                    time_span: time_series.time_span(),
                },
            );
        }

        if !report.network_stats.is_empty() {
            corpus.network_metrics.insert(
                name,
                NetworkMetrics {
                    network_distribution: report.network_stats.networks.clone().unwrap_or_default(),
                    unique_addresses: report.network_stats.unique_addresses(),
                },
            );
        }
    }

    corpus
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{fixed_clock, network_table, plain_table, process_fixture, proposals_table};

    #[test]
    fn test_aggregate_counts() {
        let clock = fixed_clock(2023, 3, 15);
        let reports = vec![
            process_fixture("plain", &plain_table(), &clock),
            process_fixture("proposals", &proposals_table(), &clock),
            process_fixture("members", &network_table(), &clock),
        ];

        let metrics = aggregate(&reports);
        assert_eq!(metrics.total_datasets, 3);
        assert_eq!(metrics.datasets_with_temporal_data, 2);
        assert_eq!(metrics.datasets_with_network_data, 1);
    }

    #[test]
    fn test_aggregate_empty() {
        assert_eq!(aggregate(&[]), CrossDatasetMetrics::default());
    }

    #[test]
    fn test_corpus_sections() {
        let clock = fixed_clock(2023, 3, 15);
        let reports = vec![
            process_fixture("plain", &plain_table(), &clock),
            process_fixture("members", &network_table(), &clock),
        ];
        let excluded = vec![ExcludedDataset {
            name: "broken".to_string(),
            reason: "unsupported column".to_string(),
        }];

        let corpus = build_corpus_report(&reports, excluded);

        assert_eq!(corpus.dataset_metrics.len(), 2);
        assert_eq!(corpus.dataset_metrics["plain"].column_count, 2);
        assert!(!corpus.temporal_metrics.contains_key("plain"));
        assert!(corpus.temporal_metrics.contains_key("members"));

        let members = &corpus.network_metrics["members"];
        assert_eq!(members.network_distribution["mainnet"], 2);
        assert_eq!(members.unique_addresses, 3);

        assert_eq!(corpus.cross_dataset_metrics.total_datasets, 2);
        assert_eq!(corpus.excluded_datasets.len(), 1);
    }
}
