//! Presentation series and the renderer seam.
//!
//! The pipeline never draws anything itself. For each dataset with a time
//! series it builds a [`RenderSeries`] and hands it to a [`Renderer`]; the
//! bundled [`JsonSeriesWriter`] writes one JSON document per series that any
//! plotting front end can pick up.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MetricsError, Result};
use crate::registry::{DatasetConfig, PlotKind};
use crate::report::DatasetReport;

/// X/Y data plus labels for one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSeries {
    pub dataset: String,
    pub label: String,
    pub plot_kind: PlotKind,
    pub x_label: String,
    pub y_label: String,
    pub x: Vec<NaiveDate>,
    pub y: Vec<u64>,
}

impl RenderSeries {
    /// Builds the series of `report`, or `None` when it has no time series.
    ///
    /// Labels come from the registry's visualization preset when there is
    /// one, otherwise from defaults derived from the dataset name.
    pub fn from_report(report: &DatasetReport, config: Option<&DatasetConfig>) -> Option<Self> {
        let time_series = report.time_series.as_ref()?;
        let x = time_series.series.periods();
        let y = time_series.series.counts();

        let series = match config.and_then(|c| c.visualization.as_ref()) {
            Some(preset) => Self {
                dataset: report.dataset_name.clone(),
                label: preset.title.clone(),
                plot_kind: preset.plot_type,
                x_label: preset.x_label.clone(),
                y_label: preset.y_label.clone(),
                x,
                y,
            },
            None => Self {
                dataset: report.dataset_name.clone(),
                label: format!("Data Analysis for {}", report.dataset_name),
                plot_kind: PlotKind::Line,
                x_label: "Date".to_string(),
                y_label: "Count".to_string(),
                x,
                y,
            },
        };
        Some(series)
    }
}

/// Consumes presentation series. Any error aborts the run.
pub trait Renderer {
    fn render(&mut self, series: &RenderSeries) -> Result<()>;
}

/// Writes `<dataset>.json` for every series into a directory.
#[derive(Debug, Clone)]
pub struct JsonSeriesWriter {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl JsonSeriesWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Files written so far, in render order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl Renderer for JsonSeriesWriter {
    fn render(&mut self, series: &RenderSeries) -> Result<()> {
        let fail = |e: &dyn std::fmt::Display| MetricsError::render(&series.dataset, e.to_string());

        fs::create_dir_all(&self.dir).map_err(|e| fail(&e))?;
        let path = self.dir.join(format!("{}.json", file_stem(&series.dataset)));
        let json = serde_json::to_string_pretty(series).map_err(|e| fail(&e))?;
        fs::write(&path, json).map_err(|e| fail(&e))?;

        debug!(dataset = %series.dataset, path = %path.display(), "Wrote render series");
        self.written.push(path);
        Ok(())
    }
}

/// Dataset name with path separators replaced, so the file stays in `dir`.
fn file_stem(dataset: &str) -> String {
    dataset.replace(['/', '\\'], "_")
}
