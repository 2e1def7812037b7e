//! Prelude for commonly used types and traits in dao-metrics.

pub use crate::error::{MetricsError, Result};
pub use crate::formatters::{FormatterConfig, HumanFormatter, JsonFormatter, ReportFormatter};
pub use crate::logging::LogConfig;
pub use crate::pipeline::{MetricsPipeline, PipelineConfig, PipelineRun};
pub use crate::registry::{DatasetConfig, DatasetRegistry, RequestedMetric};
pub use crate::render::{JsonSeriesWriter, RenderSeries, Renderer};
pub use crate::report::{CorpusReport, DatasetReport};
pub use crate::sources::{CsvDirectorySource, DatasetSource, InMemorySource, VersionInfo, VersionStore};
pub use crate::table::Table;
pub use crate::temporal::{Clock, FixedClock, Granularity, SystemClock};
