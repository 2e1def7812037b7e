//! Presentation of corpus reports.
//!
//! # Examples
//!
//! ```rust
//! use dao_metrics::formatters::{HumanFormatter, ReportFormatter};
//! use dao_metrics::report::CorpusReport;
//!
//! let output = HumanFormatter::new().format(&CorpusReport::default()).unwrap();
//! assert!(output.contains("Total datasets: 0"));
//! ```

use std::fmt::Write;

use crate::error::Result;
use crate::report::CorpusReport;
use crate::sources::VersionInfo;

/// Sections to include in formatted output.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Per-dataset records and completeness
    pub include_datasets: bool,
    /// Time span and activity trend
    pub include_temporal: bool,
    /// Network distribution and unique addresses
    pub include_network: bool,
    /// Datasets dropped from the run
    pub include_excluded: bool,
    /// Whether to use ANSI colors (human formatter)
    pub use_colors: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            include_datasets: true,
            include_temporal: true,
            include_network: true,
            include_excluded: true,
            use_colors: true,
        }
    }
}

impl FormatterConfig {
    /// Only the corpus-level counts.
    pub fn minimal() -> Self {
        Self {
            include_datasets: false,
            include_temporal: false,
            include_network: false,
            include_excluded: true,
            use_colors: false,
        }
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn with_network(mut self, include: bool) -> Self {
        self.include_network = include;
        self
    }
}

/// Turns a [`CorpusReport`] into text.
pub trait ReportFormatter {
    fn format(&self, report: &CorpusReport) -> Result<String>;

    /// Formats with explicit section options; the default ignores them.
    fn format_with_config(&self, report: &CorpusReport, _config: &FormatterConfig) -> Result<String> {
        self.format(report)
    }

    /// Formats the snapshot version line(s).
    fn format_version(&self, version: &VersionInfo) -> Result<String>;
}

/// Pretty or compact JSON.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for JsonFormatter {
    fn format(&self, report: &CorpusReport) -> Result<String> {
        Ok(if self.pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        })
    }

    fn format_version(&self, version: &VersionInfo) -> Result<String> {
        Ok(if self.pretty {
            serde_json::to_string_pretty(version)?
        } else {
            serde_json::to_string(version)?
        })
    }
}

/// Console-friendly text.
#[derive(Debug, Clone)]
pub struct HumanFormatter {
    config: FormatterConfig,
}

impl HumanFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }

    fn heading(&self, output: &mut String, title: &str, config: &FormatterConfig) {
        writeln!(output).unwrap();
        if config.use_colors {
            writeln!(output, "\x1b[1m{title}\x1b[0m").unwrap();
        } else {
            writeln!(output, "{title}").unwrap();
        }
    }
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for HumanFormatter {
    fn format(&self, report: &CorpusReport) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(&self, report: &CorpusReport, config: &FormatterConfig) -> Result<String> {
        let mut output = String::new();
        let cross = &report.cross_dataset_metrics;

        self.heading(&mut output, "📊 Corpus Summary", config);
        writeln!(output, "   Total datasets: {}", cross.total_datasets).unwrap();
        writeln!(output, "   With temporal data: {}", cross.datasets_with_temporal_data).unwrap();
        writeln!(output, "   With network data: {}", cross.datasets_with_network_data).unwrap();

        if config.include_datasets && !report.dataset_metrics.is_empty() {
            self.heading(&mut output, "📁 Datasets", config);
            for (name, metrics) in &report.dataset_metrics {
                writeln!(output).unwrap();
                writeln!(output, "   Dataset: {name}").unwrap();
                writeln!(output, "      Records: {}", metrics.record_count).unwrap();
                writeln!(output, "      Columns: {}", metrics.column_count).unwrap();
                writeln!(output, "      Completeness: {:.2}%", metrics.completeness * 100.0).unwrap();

                if config.include_temporal {
                    if let Some(temporal) = report.temporal_metrics.get(name) {
                        writeln!(output, "      Time span: {}", temporal.time_span).unwrap();
                        if let Some(trend) = &temporal.activity_trend {
                            writeln!(
                                output,
                                "      Activity trend: {} (peak {} in {})",
                                trend.trend, trend.peak_value, trend.peak_period
                            )
                            .unwrap();
                        }
                    }
                }

                if config.include_network {
                    if let Some(network) = report.network_metrics.get(name) {
                        writeln!(output, "      Unique addresses: {}", network.unique_addresses).unwrap();
                        for (network_name, count) in &network.network_distribution {
                            writeln!(output, "      Network {network_name}: {count}").unwrap();
                        }
                    }
                }
            }
        }

        if config.include_excluded && !report.excluded_datasets.is_empty() {
            self.heading(&mut output, "⚠️ Excluded Datasets", config);
            for excluded in &report.excluded_datasets {
                writeln!(output, "   {}: {}", excluded.name, excluded.reason).unwrap();
            }
        }

        writeln!(output).unwrap();
        Ok(output)
    }

    fn format_version(&self, version: &VersionInfo) -> Result<String> {
        let mut output = String::new();
        writeln!(output, "Dataset: {} ({})", version.dataset_id, version.source).unwrap();
        writeln!(output, "Version: {}", version.version).unwrap();
        writeln!(output, "Retrieved: {}", version.retrieved_at.to_rfc3339()).unwrap();
        Ok(output)
    }
}
