//! Analysis steps run on each table and across tables.
//!
//! - **`inference`**: date column selection and address/network column roles
//! - **`summary`**: missing/distinct counts, numeric statistics, completeness,
//!   network statistics
//! - **`trend`**: trend classification and peak detection on a series
//! - **`aggregate`**: corpus report from per-dataset reports

pub mod aggregate;
pub mod inference;
pub mod summary;
pub mod trend;

pub use aggregate::{aggregate, build_corpus_report};
pub use inference::{ColumnInference, ColumnRoles, DateColumnSelection, InferenceConfig};
pub use summary::{network_stats, summarize, NetworkStats, NumericStats, SummaryStats};
pub use trend::{analyze_trend, Trend, TrendSummary};
