//! The metrics pipeline: source → per-dataset reports → corpus report → render.
//!
//! One run is a single synchronous pass over a collection of tables. Each
//! table is processed independently; a dataset whose processing fails is
//! logged, listed in [`CorpusReport::excluded_datasets`] and left out of every
//! other section. Only three things abort a run: the source failing, the
//! source producing no datasets, and a renderer failure.
//!
//! # Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//!
//! use chrono::NaiveDate;
//! use dao_metrics::pipeline::{MetricsPipeline, PipelineConfig};
//! use dao_metrics::table::Table;
//! use dao_metrics::temporal::FixedClock;
//!
//! let table = Table::builder()
//!     .text("date", [Some("2023-01-05"), Some("2023-01-20"), Some("2023-03-01")])
//!     .build()
//!     .unwrap();
//!
//! let clock = FixedClock::at_date(NaiveDate::from_ymd_opt(2023, 3, 15).unwrap());
//! let pipeline = MetricsPipeline::new(PipelineConfig::default()).with_clock(Arc::new(clock));
//! let run = pipeline.run(BTreeMap::from([("events".to_string(), table)])).unwrap();
//!
//! assert_eq!(run.corpus.cross_dataset_metrics.datasets_with_temporal_data, 1);
//! assert_eq!(run.corpus.temporal_metrics["events"].time_span,
//!            "2023-01-05T00:00:00 to 2023-03-01T00:00:00");
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::analyzers::aggregate::build_corpus_report;
use crate::analyzers::inference::InferenceConfig;
use crate::error::{MetricsError, Result};
use crate::logging::LogConfig;
use crate::processor::DatasetProcessor;
use crate::registry::DatasetRegistry;
use crate::render::{RenderSeries, Renderer};
use crate::report::{CorpusReport, DatasetReport, ExcludedDataset};
use crate::sources::DatasetSource;
use crate::table::Table;
use crate::temporal::{Clock, Granularity, SystemClock};

/// Configuration of a pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub inference: InferenceConfig,
    /// Bucket size for datasets without a registry entry
    pub default_granularity: Granularity,
    pub log: LogConfig,
}

impl PipelineConfig {
    pub fn with_inference(mut self, inference: InferenceConfig) -> Self {
        self.inference = inference;
        self
    }

    pub fn with_default_granularity(mut self, granularity: Granularity) -> Self {
        self.default_granularity = granularity;
        self
    }

    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }
}

/// Result of one run: every successful dataset report plus their aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRun {
    pub reports: Vec<DatasetReport>,
    pub corpus: CorpusReport,
}

impl PipelineRun {
    pub fn report(&self, name: &str) -> Option<&DatasetReport> {
        self.reports.iter().find(|r| r.dataset_name == name)
    }
}

/// Drives processing, aggregation and rendering.
#[derive(Debug, Clone)]
pub struct MetricsPipeline {
    config: PipelineConfig,
    registry: DatasetRegistry,
    clock: Arc<dyn Clock>,
}

impl MetricsPipeline {
    /// A pipeline with an empty registry and the system clock.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            registry: DatasetRegistry::empty(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_registry(mut self, registry: DatasetRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry(&self) -> &DatasetRegistry {
        &self.registry
    }

    /// Runs the pipeline over an in-memory collection of tables.
    ///
    /// Tables are consumed; datasets are visited in name order.
    #[instrument(skip(self, datasets), fields(datasets = datasets.len()))]
    pub fn run(&self, datasets: BTreeMap<String, Table>) -> Result<PipelineRun> {
        if datasets.is_empty() {
            return Err(MetricsError::NoDatasets);
        }

        let processor = DatasetProcessor::new(&self.config, &self.registry, self.clock.as_ref());
        let mut reports = Vec::with_capacity(datasets.len());
        let mut excluded = Vec::new();

        for (name, table) in datasets {
            match processor.process(&name, &table) {
                Ok(report) => reports.push(report),
                Err(e) => {
                    error!(dataset = %name, error = %e, "Excluding dataset after processing failure");
                    excluded.push(ExcludedDataset {
                        name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let corpus = build_corpus_report(&reports, excluded);
        info!(
            total = corpus.cross_dataset_metrics.total_datasets,
            temporal = corpus.cross_dataset_metrics.datasets_with_temporal_data,
            network = corpus.cross_dataset_metrics.datasets_with_network_data,
            excluded = corpus.excluded_datasets.len(),
            "Pipeline run complete"
        );

        Ok(PipelineRun { reports, corpus })
    }

    /// Fetches all datasets from `source` and runs the pipeline over them.
    #[instrument(skip(self, source), fields(source = %source.description()))]
    pub async fn run_source(&self, source: &dyn DatasetSource) -> Result<PipelineRun> {
        let datasets = source.fetch().await?;
        self.run(datasets)
    }

    /// Presentation series for every dataset with a time series.
    pub fn render_series(&self, run: &PipelineRun) -> Vec<RenderSeries> {
        run.reports
            .iter()
            .filter_map(|report| RenderSeries::from_report(report, self.registry.get(&report.dataset_name)))
            .collect()
    }

    /// Hands every series to `renderer`, stopping at the first failure.
    pub fn render(&self, run: &PipelineRun, renderer: &mut dyn Renderer) -> Result<usize> {
        let series = self.render_series(run);
        for item in &series {
            renderer.render(item)?;
        }
        Ok(series.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::InMemorySource;
    use crate::test_fixtures::{fixed_clock, network_table, plain_table, proposals_table};

    fn pipeline() -> MetricsPipeline {
        MetricsPipeline::new(PipelineConfig::default()).with_clock(Arc::new(fixed_clock(2023, 3, 15)))
    }

    fn datasets() -> BTreeMap<String, Table> {
        BTreeMap::from([
            ("plain".to_string(), plain_table()),
            ("proposals".to_string(), proposals_table()),
            ("members".to_string(), network_table()),
        ])
    }

    #[test]
    fn test_run_over_tables() {
        let run = pipeline().run(datasets()).unwrap();

        assert_eq!(run.reports.len(), 3);
        assert_eq!(run.corpus.cross_dataset_metrics.total_datasets, 3);
        assert_eq!(run.corpus.dataset_metrics.len(), 3);
        assert!(run.corpus.excluded_datasets.is_empty());
        assert!(run.report("plain").unwrap().time_series.is_none());
    }

    #[test]
    fn test_empty_input_is_fatal() {
        let err = pipeline().run(BTreeMap::new()).unwrap_err();
        assert!(matches!(err, MetricsError::NoDatasets));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_deterministic_output() {
        let first = pipeline().run(datasets()).unwrap().corpus.to_json().unwrap();
        let second = pipeline().run(datasets()).unwrap().corpus.to_json().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_render_series() {
        let pipeline = pipeline();
        let run = pipeline.run(datasets()).unwrap();
        let series = pipeline.render_series(&run);

        let names: Vec<_> = series.iter().map(|s| s.dataset.as_str()).collect();
        assert_eq!(names, vec!["members", "proposals"]);
        assert_eq!(series[1].label, "Data Analysis for proposals");
    }

    #[tokio::test]
    async fn test_run_source() {
        let source = InMemorySource::new(datasets());
        let run = pipeline().run_source(&source).await.unwrap();
        assert_eq!(run.corpus.cross_dataset_metrics.total_datasets, 3);
    }
}
