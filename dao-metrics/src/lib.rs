//! # dao-metrics - Activity Metrics for DAO Datasets
//!
//! dao-metrics turns a collection of heterogeneous tabular DAO datasets
//! (proposals, votes, members, transactions...) into comparable activity
//! metrics. It finds the date field of each table without being told, puts
//! every timestamp on a common UTC timeline, buckets activity into a dense
//! calendar-aligned series, and rolls the per-dataset results up into one
//! corpus-level report.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dao_metrics::prelude::*;
//!
//! # async fn example() -> dao_metrics::error::Result<()> {
//! let source = CsvDirectorySource::new("data/dao-census");
//! let pipeline = MetricsPipeline::new(PipelineConfig::default())
//!     .with_registry(DatasetRegistry::builtin());
//!
//! let run = pipeline.run_source(&source).await?;
//! println!("{}", HumanFormatter::new().format(&run.corpus)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## How a dataset is analyzed
//!
//! 1. **Date column inference**: columns are scanned in declared order and the
//!    first one whose every non-null cell reads as epoch seconds or as a
//!    calendar string becomes the date column. Registered datasets may name a
//!    column to try first.
//! 2. **Normalization**: each date cell becomes a UTC [`temporal::Instant`];
//!    cells that fail are logged and skipped, never fatal.
//! 3. **Bucketing**: instants are truncated to month (or day) starts and
//!    counted. Gaps are filled with zeros and the series runs up to the
//!    current bucket of the injected [`temporal::Clock`].
//! 4. **Statistics**: missing and distinct counts per column, numeric
//!    summaries, completeness, and address/network statistics.
//! 5. **Aggregation**: trend and peak per series, corpus-level counts.
//!
//! ## Architecture
//!
//! - **`table`**: Arrow-backed table model with null-aware cell views
//! - **`temporal`**: normalization, the calendar grammar, bucketing, clocks
//! - **`analyzers`**: column inference, summary statistics, trend, aggregation
//! - **`processor`** / **`pipeline`**: per-dataset processing and the run loop
//! - **`registry`**: optional per-dataset configuration
//! - **`sources`**: CSV directory and in-memory dataset sources, version metadata
//! - **`render`** / **`formatters`**: presentation series and report output

pub mod analyzers;
pub mod error;
pub mod formatters;
pub mod logging;
pub mod pipeline;
pub mod prelude;
pub mod processor;
pub mod registry;
pub mod render;
pub mod report;
pub mod sources;
pub mod table;
pub mod temporal;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;
