//! Registry of known datasets.
//!
//! The registry is optional: an unknown dataset is still analyzed with the
//! heuristic defaults. A registered dataset contributes a date column hint,
//! required columns, the bucket granularity, extra metrics and a
//! visualization preset.
//!
//! # Example
//!
//! ```rust
//! use dao_metrics::registry::{DatasetRegistry, RequestedMetric};
//! use dao_metrics::temporal::Granularity;
//!
//! let registry = DatasetRegistry::from_json_str(r#"{
//!     "proposals": {
//!         "required_columns": ["createdAt", "id"],
//!         "date_column": "createdAt",
//!         "aggregation": "daily",
//!         "metrics": ["count"]
//!     }
//! }"#).unwrap();
//!
//! let proposals = registry.get("proposals").unwrap();
//! assert_eq!(proposals.aggregation, Granularity::Daily);
//! assert_eq!(proposals.metrics, vec![RequestedMetric::Count]);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MetricsError, Result};
use crate::temporal::Granularity;

/// Scalar or series metric a registry entry may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestedMetric {
    Count,
    CumulativeSum,
    UniqueCount,
    Sum,
    Average,
}

impl RequestedMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestedMetric::Count => "count",
            RequestedMetric::CumulativeSum => "cumulative_sum",
            RequestedMetric::UniqueCount => "unique_count",
            RequestedMetric::Sum => "sum",
            RequestedMetric::Average => "average",
        }
    }
}

impl fmt::Display for RequestedMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotKind {
    #[default]
    Line,
    Bar,
}

/// Presentation preset for a dataset's series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualizationConfig {
    #[serde(default)]
    pub plot_type: PlotKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

/// Per-dataset configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub required_columns: Vec<String>,
    /// Column tried before the heuristic date scan
    pub date_column: Option<String>,
    pub aggregation: Granularity,
    pub metrics: Vec<RequestedMetric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visualization: Option<VisualizationConfig>,
}

impl DatasetConfig {
    pub fn requests(&self, metric: RequestedMetric) -> bool {
        self.metrics.contains(&metric)
    }

    /// Required columns absent from `columns`, in registry order.
    pub fn missing_columns(&self, columns: &[String]) -> Vec<String> {
        self.required_columns
            .iter()
            .filter(|required| !columns.contains(required))
            .cloned()
            .collect()
    }
}

/// Map of dataset name to [`DatasetConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetRegistry {
    datasets: BTreeMap<String, DatasetConfig>,
}

impl DatasetRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The three datasets of the DAO census export.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.insert(
            "active_daos",
            DatasetConfig {
                required_columns: vec!["createdAt".into(), "id".into()],
                date_column: Some("createdAt".into()),
                aggregation: Granularity::Monthly,
                metrics: vec![RequestedMetric::Count, RequestedMetric::CumulativeSum],
                visualization: Some(VisualizationConfig {
                    plot_type: PlotKind::Line,
                    title: "Active DAOs Over Time".into(),
                    x_label: "Date".into(),
                    y_label: "Number of DAOs".into(),
                }),
            },
        );
        registry.insert(
            "users",
            DatasetConfig {
                required_columns: vec!["createdAt".into(), "address".into()],
                date_column: Some("createdAt".into()),
                aggregation: Granularity::Monthly,
                metrics: vec![RequestedMetric::UniqueCount, RequestedMetric::CumulativeSum],
                visualization: Some(VisualizationConfig {
                    plot_type: PlotKind::Line,
                    title: "User Growth Over Time".into(),
                    x_label: "Date".into(),
                    y_label: "Number of Users".into(),
                }),
            },
        );
        registry.insert(
            "transactions",
            DatasetConfig {
                required_columns: vec!["date".into(), "amount".into(), "token".into()],
                date_column: Some("date".into()),
                aggregation: Granularity::Daily,
                metrics: vec![
                    RequestedMetric::Sum,
                    RequestedMetric::Average,
                    RequestedMetric::Count,
                ],
                visualization: Some(VisualizationConfig {
                    plot_type: PlotKind::Bar,
                    title: "Transaction Volume Over Time".into(),
                    x_label: "Date".into(),
                    y_label: "Volume".into(),
                }),
            },
        );
        registry
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a registry from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            MetricsError::Configuration(format!(
                "failed to read registry {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json_str(&contents)
    }

    pub fn insert(&mut self, name: impl Into<String>, config: DatasetConfig) {
        self.datasets.insert(name.into(), config);
    }

    pub fn get(&self, name: &str) -> Option<&DatasetConfig> {
        self.datasets.get(name)
    }

    /// Granularity registered for `name`, or `default`.
    pub fn granularity_for(&self, name: &str, default: Granularity) -> Granularity {
        self.get(name).map_or(default, |config| config.aggregation)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}
