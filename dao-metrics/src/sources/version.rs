//! Snapshot version metadata and its on-disk backup.
//!
//! Each successful version lookup is persisted as `version_info.json` in a
//! backup directory. When a later lookup fails (the upstream is unreachable,
//! say) the last saved record is used instead.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::DatasetSource;
use crate::error::Result;

/// File name of the persisted record inside the backup directory.
pub const VERSION_FILE: &str = "version_info.json";

/// Identifies the dataset snapshot a run was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    /// Where the snapshot came from (e.g. `local`, `kaggle`)
    pub source: String,
    pub dataset_id: String,
    pub version: String,
    pub retrieved_at: DateTime<Utc>,
    /// Local path of the snapshot
    pub storage_path: String,
}

impl VersionInfo {
    /// Version taken from a `versions/<n>` path segment, if present.
    pub fn version_from_path(path: &str) -> Option<String> {
        let normalized = path.replace('\\', "/");
        let (_, rest) = normalized.rsplit_once("versions/")?;
        rest.split('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
    }
}

/// Reads and writes the backup record.
#[derive(Debug, Clone)]
pub struct VersionStore {
    dir: PathBuf,
}

impl VersionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(VERSION_FILE)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `info`, creating the directory if needed.
    pub fn save(&self, info: &VersionInfo) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path();
        fs::write(&path, serde_json::to_string_pretty(info)?)?;
        Ok(path)
    }

    /// The saved record, or `None` if nothing was saved yet.
    pub fn load(&self) -> Result<Option<VersionInfo>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }
}

/// Asks `source` for its version, persisting it on success and falling back
/// to the backup on failure. The source's error is returned only when there
/// is no backup either.
pub async fn resolve_version(
    source: &dyn DatasetSource,
    store: &VersionStore,
) -> Result<VersionInfo> {
    match source.version().await {
        Ok(info) => {
            if let Err(e) = store.save(&info) {
                warn!(error = %e, path = %store.path().display(), "Failed to save version backup");
            }
            Ok(info)
        }
        Err(e) => {
            warn!(error = %e, "Version lookup failed, using backup");
            match store.load()? {
                Some(info) => {
                    info!(version = %info.version, "Loaded version from backup");
                    Ok(info)
                }
                None => Err(e),
            }
        }
    }
}
