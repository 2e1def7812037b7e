//! Error types for the DAO metrics pipeline.
//!
//! All fallible operations in this crate return [`MetricsError`]. Cell-level
//! conversion problems are not errors at this level: they are reported through
//! [`NormalizeError`](crate::temporal::NormalizeError) and recovered locally.

use thiserror::Error;

/// The main error type for the metrics pipeline.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Error from DataFusion operations.
    #[error("DataFusion error: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    /// Error from Arrow operations.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error from the dataset source collaborator.
    #[error("Data source error: {message}")]
    DataSource {
        /// Kind of source (e.g., "csv-directory", "memory")
        source_type: String,
        /// Detailed error message
        message: String,
        /// Optional underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error from the renderer collaborator.
    #[error("Renderer error for '{dataset}': {message}")]
    Render { dataset: String, message: String },

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Error related to configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A table does not have the structure the pipeline can analyze.
    #[error("Unsupported column '{column}': {message}")]
    UnsupportedColumn { column: String, message: String },

    /// The source produced no datasets at all.
    #[error("No datasets available for analysis")]
    NoDatasets,
}

/// A type alias for `Result<T, MetricsError>`.
pub type Result<T> = std::result::Result<T, MetricsError>;

impl MetricsError {
    /// Creates a new data source error.
    pub fn data_source(source_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new data source error with a source error.
    pub fn data_source_with_source(
        source_type: impl Into<String>,
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Creates a new renderer error.
    pub fn render(dataset: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Render {
            dataset: dataset.into(),
            message: message.into(),
        }
    }

    /// Creates an unsupported column error.
    pub fn unsupported_column(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnsupportedColumn {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if this error must abort the whole run rather than a
    /// single dataset.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::DataSource { .. } | Self::Render { .. } | Self::NoDatasets
        )
    }
}
