//! CSV directory source.
//!
//! Every `*.csv` file below a root directory becomes one dataset. The dataset
//! name is the file's path relative to the root with directory separators
//! replaced by `_` and the extension dropped, so `votes/2023/ballots.csv`
//! becomes `votes_2023_ballots`. Files are decoded with DataFusion's CSV
//! reader, which also infers column types.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use datafusion::prelude::{CsvReadOptions, SessionContext};
use tracing::{debug, info, instrument, warn};

use super::{DatasetSource, VersionInfo};
use crate::error::{MetricsError, Result};
use crate::table::Table;
use crate::temporal::{Clock, SystemClock};

const SOURCE_TYPE: &str = "csv-directory";

/// Options for reading the CSV files.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Whether files have a header row
    pub has_header: bool,
    /// Field delimiter (default: ',')
    pub delimiter: u8,
    /// Maximum records read for schema inference
    pub schema_infer_max_records: usize,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: b',',
            schema_infer_max_records: 1000,
        }
    }
}

/// Loads every CSV file below a directory.
///
/// A file that cannot be read or decoded is logged and skipped; the rest of
/// the collection is still returned.
#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    root: PathBuf,
    options: CsvOptions,
    source_name: String,
    dataset_id: Option<String>,
    clock: Arc<dyn Clock>,
}

impl CsvDirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            options: CsvOptions::default(),
            source_name: "local".to_string(),
            dataset_id: None,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_options(mut self, options: CsvOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the provenance recorded in [`VersionInfo`].
    pub fn with_origin(mut self, source: impl Into<String>, dataset_id: impl Into<String>) -> Self {
        self.source_name = source.into();
        self.dataset_id = Some(dataset_id.into());
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// CSV files below the root, keyed by dataset name.
    pub fn discover(&self) -> Result<BTreeMap<String, PathBuf>> {
        if !self.root.is_dir() {
            return Err(MetricsError::data_source(
                SOURCE_TYPE,
                format!("{} is not a directory", self.root.display()),
            ));
        }

        let pattern = self.root.join("**").join("*.csv");
        let pattern = pattern.to_str().ok_or_else(|| {
            MetricsError::Configuration(format!(
                "path contains invalid UTF-8: {}",
                self.root.display()
            ))
        })?;
        let entries = glob::glob(pattern).map_err(|e| {
            MetricsError::Configuration(format!("Invalid glob pattern '{pattern}': {e}"))
        })?;

        let mut files = BTreeMap::new();
        for entry in entries {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            let Some(name) = dataset_name(&self.root, &path) else {
                warn!(path = %path.display(), "Skipping file with unrepresentable name");
                continue;
            };
            debug!(dataset = %name, path = %path.display(), "Found CSV file");
            if let Some(previous) = files.insert(name.clone(), path) {
                warn!(dataset = %name, replaced = %previous.display(), "Duplicate dataset name");
            }
        }
        Ok(files)
    }

    async fn load_file(&self, ctx: &SessionContext, path: &Path) -> Result<Table> {
        let path_str = path.to_str().ok_or_else(|| {
            MetricsError::Configuration(format!("path contains invalid UTF-8: {}", path.display()))
        })?;
        let csv_options = CsvReadOptions::new()
            .has_header(self.options.has_header)
            .delimiter(self.options.delimiter)
            .schema_infer_max_records(self.options.schema_infer_max_records);

        let df = ctx.read_csv(path_str, csv_options).await?;
        let schema = df.schema().inner().clone();
        let batches = df.collect().await?;
        let schema = batches.first().map_or(schema, |batch| batch.schema());
        Table::from_batches(schema, &batches)
    }
}

/// `a/b/c.csv` relative to `root` becomes `a_b_c`.
fn dataset_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let stem = relative.file_stem()?.to_str()?;
    let mut parts = relative
        .parent()
        .into_iter()
        .flat_map(|parent| parent.components())
        .map(|component| component.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    parts.push(stem);
    Some(parts.join("_"))
}

#[async_trait]
impl DatasetSource for CsvDirectorySource {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn fetch(&self) -> Result<BTreeMap<String, Table>> {
        let files = self.discover()?;
        let ctx = SessionContext::new();
        let mut datasets = BTreeMap::new();

        for (name, path) in files {
            match self.load_file(&ctx, &path).await {
                Ok(table) => {
                    debug!(dataset = %name, rows = table.num_rows(), "Loaded dataset");
                    datasets.insert(name, table);
                }
                Err(e) => warn!(dataset = %name, path = %path.display(), error = %e, "Skipping unreadable CSV file"),
            }
        }

        info!(datasets = datasets.len(), "Loaded CSV datasets");
        Ok(datasets)
    }

    async fn version(&self) -> Result<VersionInfo> {
        let storage_path = self.root.display().to_string();
        let dataset_id = match &self.dataset_id {
            Some(id) => id.clone(),
            None => self
                .root
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default()
                .to_string(),
        };
        Ok(VersionInfo {
            source: self.source_name.clone(),
            dataset_id,
            version: VersionInfo::version_from_path(&storage_path)
                .unwrap_or_else(|| "local".to_string()),
            retrieved_at: self.clock.now(),
            storage_path,
        })
    }

    fn description(&self) -> String {
        format!("CSV directory: {}", self.root.display())
    }
}
