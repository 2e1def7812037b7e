//! Dataset sources.
//!
//! A [`DatasetSource`] yields the full collection of named tables for one run
//! plus the version metadata of the snapshot it read. The pipeline only ever
//! sees finished [`Table`]s; how they are found and decoded is the source's
//! business.

use std::collections::BTreeMap;
use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::Result;
use crate::table::Table;

mod csv;
mod memory;
mod version;

pub use csv::{CsvDirectorySource, CsvOptions};
pub use memory::InMemorySource;
pub use version::{resolve_version, VersionInfo, VersionStore, VERSION_FILE};

/// A provider of named tables.
///
/// # Examples
///
/// ```rust,no_run
/// use dao_metrics::sources::{CsvDirectorySource, DatasetSource};
///
/// # async fn example() -> dao_metrics::error::Result<()> {
/// let source = CsvDirectorySource::new("data/dao-census");
/// let datasets = source.fetch().await?;
/// for (name, table) in &datasets {
///     println!("{name}: {} rows", table.num_rows());
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait DatasetSource: Debug + Send + Sync {
    /// Loads every dataset. Names are unique; iteration order is by name.
    async fn fetch(&self) -> Result<BTreeMap<String, Table>>;

    /// Version metadata of the snapshot `fetch` reads.
    async fn version(&self) -> Result<VersionInfo>;

    /// Returns a human-readable description of this source.
    fn description(&self) -> String;
}
