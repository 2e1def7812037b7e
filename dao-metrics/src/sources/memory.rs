//! A source serving tables that are already in memory.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::{DatasetSource, VersionInfo};
use crate::error::Result;
use crate::table::Table;
use crate::temporal::{Clock, SystemClock};

#[derive(Debug, Clone)]
pub struct InMemorySource {
    datasets: BTreeMap<String, Table>,
    version: String,
    clock: Arc<dyn Clock>,
}

impl InMemorySource {
    pub fn new(datasets: BTreeMap<String, Table>) -> Self {
        Self {
            datasets,
            version: "memory".to_string(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_table(mut self, name: impl Into<String>, table: Table) -> Self {
        self.datasets.insert(name.into(), table);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl Default for InMemorySource {
    fn default() -> Self {
        Self::new(BTreeMap::new())
    }
}

#[async_trait]
impl DatasetSource for InMemorySource {
    async fn fetch(&self) -> Result<BTreeMap<String, Table>> {
        Ok(self.datasets.clone())
    }

    async fn version(&self) -> Result<VersionInfo> {
        Ok(VersionInfo {
            source: "memory".to_string(),
            dataset_id: "in-memory".to_string(),
            version: self.version.clone(),
            retrieved_at: self.clock.now(),
            storage_path: String::new(),
        })
    }

    fn description(&self) -> String {
        format!("in-memory source ({} datasets)", self.datasets.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::FixedClock;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_fetch_and_version() {
        let table = Table::builder().text("a", [Some("x")]).build().unwrap();
        let clock = FixedClock::at_date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        let source = InMemorySource::default()
            .with_table("daos", table)
            .with_version("7")
            .with_clock(Arc::new(clock));

        let datasets = source.fetch().await.unwrap();
        assert_eq!(datasets.keys().collect::<Vec<_>>(), vec!["daos"]);

        let version = source.version().await.unwrap();
        assert_eq!(version.version, "7");
        assert_eq!(version.retrieved_at, clock.now());
        assert_eq!(source.description(), "in-memory source (1 datasets)");
    }
}
