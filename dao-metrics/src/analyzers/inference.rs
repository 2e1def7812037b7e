//! Column inference: locating the date field and address/network columns.
//!
//! Date column selection is a priority-ordered scan, not a scored ranking.
//! Columns are visited in declared order and each one is offered to a fixed
//! list of interpreters (epoch seconds first, calendar strings second). The
//! first column that an interpreter accepts in full wins; column order in the
//! source table therefore decides ties.
//!
//! A column is accepted when it has at least one non-null cell and every
//! non-null cell converts. A column named by the registry hint is held to a
//! looser rule: one convertible cell is enough. Numeric columns are only offered to the epoch
//! interpreter and must stay inside a plausibility window, so small surrogate
//! keys such as `id = 1, 2, 3` are not mistaken for timestamps.
//!
//! # Example
//!
//! ```rust
//! use dao_metrics::analyzers::inference::ColumnInference;
//! use dao_metrics::table::Table;
//! use dao_metrics::temporal::Representation;
//!
//! let table = Table::builder()
//!     .int("id", [Some(1), Some(2)])
//!     .int("createdAt", [Some(1_672_531_200), Some(1_675_209_600)])
//!     .build()
//!     .unwrap();
//!
//! let selection = ColumnInference::default().select_date_column(&table, None);
//! assert_eq!(selection.column_name.as_deref(), Some("createdAt"));
//! assert_eq!(selection.representation, Representation::EpochSeconds);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::table::{Cell, ColumnView, Table};
use crate::temporal::{from_epoch_seconds, parse_calendar, Representation};

/// Interpreters tried against every column, in priority order.
pub const INTERPRETERS: [Representation; 2] =
    [Representation::EpochSeconds, Representation::CalendarString];

/// Literal name of the network-like column.
pub const NETWORK_COLUMN: &str = "network";

/// Substring (case-insensitive) marking address-like columns.
pub const ADDRESS_MARKER: &str = "address";

/// Configuration for column inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Smallest epoch value (seconds) accepted from a numeric column (default: 1973-03-03)
    pub epoch_min_seconds: f64,
    /// Largest epoch value (seconds) accepted from a numeric column (default: year 3000)
    pub epoch_max_seconds: f64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            epoch_min_seconds: 100_000_000.0,
            epoch_max_seconds: 32_503_680_000.0,
        }
    }
}

/// The chosen date field of a table, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateColumnSelection {
    pub column_name: Option<String>,
    pub representation: Representation,
}

impl DateColumnSelection {
    /// No usable date column.
    pub fn none() -> Self {
        Self {
            column_name: None,
            representation: Representation::None,
        }
    }

    pub fn new(column_name: impl Into<String>, representation: Representation) -> Self {
        Self {
            column_name: Some(column_name.into()),
            representation,
        }
    }

    pub fn is_none(&self) -> bool {
        self.column_name.is_none() || self.representation == Representation::None
    }
}

/// Address-like and network-like columns of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRoles {
    pub address_columns: Vec<String>,
    pub network_column: Option<String>,
}

#[derive(Debug, Default)]
struct CellTally {
    accepted: usize,
    rejected: usize,
}

/// Heuristic column inference.
#[derive(Debug, Clone, Default)]
pub struct ColumnInference {
    config: InferenceConfig,
}

impl ColumnInference {
    pub fn new(config: InferenceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Selects the date column of `table`.
    ///
    /// A `hint` (from the dataset registry) is tried before the ordered scan.
    /// The hinted column only needs one convertible cell; the remaining bad
    /// cells are dropped later during normalization. If the hinted column is
    /// missing or nothing in it converts, the scan runs as usual. Columns that
    /// cannot be viewed are skipped.
    #[instrument(skip(self, table), fields(columns = table.num_columns()))]
    pub fn select_date_column(&self, table: &Table, hint: Option<&str>) -> DateColumnSelection {
        if let Some(hint) = hint {
            match table.column_by_name(hint) {
                Ok(Some(column)) => {
                    if let Some(representation) = self.interpret_hinted_column(&column) {
                        debug!(column = hint, %representation, "Using hinted date column");
                        return DateColumnSelection::new(hint, representation);
                    }
                    debug!(column = hint, "Hinted date column did not parse, scanning");
                }
                Ok(None) => debug!(column = hint, "Hinted date column not present, scanning"),
                Err(e) => debug!(column = hint, error = %e, "Hinted date column unreadable"),
            }
        }

        for index in 0..table.num_columns() {
            let column = match table.column(index) {
                Ok(column) => column,
                Err(e) => {
                    debug!(index, error = %e, "Skipping unreadable column");
                    continue;
                }
            };
            if let Some(representation) = self.interpret_column(&column) {
                debug!(column = column.name(), %representation, "Selected date column");
                return DateColumnSelection::new(column.name(), representation);
            }
        }

        DateColumnSelection::none()
    }

    /// Returns the first interpreter that accepts every non-null cell.
    pub fn interpret_column(&self, column: &ColumnView) -> Option<Representation> {
        INTERPRETERS.into_iter().find(|representation| {
            let tally = self.tally(column, *representation);
            tally.accepted > 0 && tally.rejected == 0
        })
    }

    /// Returns the first interpreter that accepts at least one non-null cell.
    pub fn interpret_hinted_column(&self, column: &ColumnView) -> Option<Representation> {
        INTERPRETERS
            .into_iter()
            .find(|representation| self.tally(column, *representation).accepted > 0)
    }

    fn tally(&self, column: &ColumnView, representation: Representation) -> CellTally {
        let mut tally = CellTally::default();
        for cell in column.cells() {
            let ok = match (cell, representation) {
                (Cell::Null, _) => continue,
                (Cell::Number(value), Representation::EpochSeconds) => {
                    self.is_plausible_epoch(value)
                }
                (Cell::Text(text), Representation::CalendarString) => {
                    !column.is_numeric() && parse_calendar(text).is_some()
                }
                _ => false,
            };
            if ok {
                tally.accepted += 1;
            } else {
                tally.rejected += 1;
            }
        }
        tally
    }

    fn is_plausible_epoch(&self, value: f64) -> bool {
        value >= self.config.epoch_min_seconds
            && value <= self.config.epoch_max_seconds
            && from_epoch_seconds(value).is_ok()
    }

    /// Identifies address-like and network-like columns.
    ///
    /// Independent of date selection: a column may play several roles.
    pub fn column_roles(table: &Table) -> ColumnRoles {
        let names = table.column_names();
        let address_columns = names
            .iter()
            .filter(|name| name.to_lowercase().contains(ADDRESS_MARKER))
            .cloned()
            .collect();
        let network_column = names.into_iter().find(|name| name == NETWORK_COLUMN);
        ColumnRoles {
            address_columns,
            network_column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_date_column() {
        let table = Table::builder()
            .int("id", [Some(1), Some(2), Some(3)])
            .text("name", [Some("alpha"), Some("beta"), Some("gamma")])
            .build()
            .unwrap();

        let selection = ColumnInference::default().select_date_column(&table, None);
        assert!(selection.is_none());
        assert_eq!(selection, DateColumnSelection::none());
    }

    #[test]
    fn test_epoch_column_selected() {
        let table = Table::builder()
            .text("name", [Some("a"), Some("b")])
            .float("createdAt", [Some(1_600_000_000.0), None])
            .build()
            .unwrap();

        let selection = ColumnInference::default().select_date_column(&table, None);
        assert_eq!(selection, DateColumnSelection::new("createdAt", Representation::EpochSeconds));
    }

    #[test]
    fn test_calendar_column_selected() {
        let table = Table::builder()
            .text("id", [Some("0xabc"), Some("0xdef")])
            .text("date", [Some("2023-01-05"), Some("2023-02-11 10:00:00")])
            .build()
            .unwrap();

        let selection = ColumnInference::default().select_date_column(&table, None);
        assert_eq!(selection, DateColumnSelection::new("date", Representation::CalendarString));
    }

    #[test]
    fn test_first_match_wins() {
        let table = Table::builder()
            .text("startDate", [Some("2023-01-05"), Some("2023-02-11")])
            .int("createdAt", [Some(1_600_000_000), Some(1_600_000_100)])
            .build()
            .unwrap();

        let selection = ColumnInference::default().select_date_column(&table, None);
        assert_eq!(selection.column_name.as_deref(), Some("startDate"));
    }

    #[test]
    fn test_partially_parsable_column_is_rejected() {
        let table = Table::builder()
            .text("date", [Some("2023-01-05"), Some("soon")])
            .text("executedAt", [Some("2023-01-06"), None])
            .build()
            .unwrap();

        let selection = ColumnInference::default().select_date_column(&table, None);
        assert_eq!(selection.column_name.as_deref(), Some("executedAt"));
    }

    #[test]
    fn test_all_null_column_is_skipped() {
        let table = Table::builder()
            .text("empty", [None, None])
            .text("date", [Some("2023-01-05"), Some("2023-01-06")])
            .build()
            .unwrap();

        let selection = ColumnInference::default().select_date_column(&table, None);
        assert_eq!(selection.column_name.as_deref(), Some("date"));
    }

    #[test]
    fn test_hint_takes_priority() {
        let table = Table::builder()
            .text("startDate", [Some("2023-01-05")])
            .text("executedAt", [Some("2023-03-01")])
            .build()
            .unwrap();
        let inference = ColumnInference::default();

        let hinted = inference.select_date_column(&table, Some("executedAt"));
        assert_eq!(hinted.column_name.as_deref(), Some("executedAt"));

        let missing_hint = inference.select_date_column(&table, Some("createdAt"));
        assert_eq!(missing_hint.column_name.as_deref(), Some("startDate"));
    }

    #[test]
    fn test_hinted_column_tolerates_bad_cells() {
        let table = Table::builder()
            .int("id", [Some(1), Some(2), Some(3)])
            .text("createdAt", [Some("2023-01-05"), Some("not-a-date"), Some("2023-03-01")])
            .build()
            .unwrap();
        let inference = ColumnInference::default();

        let hinted = inference.select_date_column(&table, Some("createdAt"));
        assert_eq!(hinted, DateColumnSelection::new("createdAt", Representation::CalendarString));

        // without the hint the same column fails the strict scan
        assert!(inference.select_date_column(&table, None).is_none());
    }

    #[test]
    fn test_hinted_column_without_any_date_falls_back() {
        let table = Table::builder()
            .text("createdAt", [Some("soon"), None])
            .text("executedAt", [Some("2023-03-01"), Some("2023-03-02")])
            .build()
            .unwrap();

        let selection = ColumnInference::default().select_date_column(&table, Some("createdAt"));
        assert_eq!(selection.column_name.as_deref(), Some("executedAt"));
    }

    #[test]
    fn test_epoch_window_is_configurable() {
        let table = Table::builder()
            .int("block", [Some(5_000), Some(6_000)])
            .build()
            .unwrap();

        assert!(ColumnInference::default()
            .select_date_column(&table, None)
            .is_none());

        let permissive = ColumnInference::new(InferenceConfig {
            epoch_min_seconds: 0.0,
            ..Default::default()
        });
        assert_eq!(
            permissive.select_date_column(&table, None).representation,
            Representation::EpochSeconds
        );
    }

    #[test]
    fn test_column_roles() {
        let table = Table::builder()
            .text("userAddress", [Some("0x1")])
            .text("DAO_ADDRESS", [Some("0x2")])
            .text("network", [Some("mainnet")])
            .text("Networks", [Some("xdai")])
            .build()
            .unwrap();

        let roles = ColumnInference::column_roles(&table);
        assert_eq!(roles.address_columns, vec!["userAddress", "DAO_ADDRESS"]);
        assert_eq!(roles.network_column.as_deref(), Some("network"));
    }

    #[test]
    fn test_column_roles_absent() {
        let table = Table::builder().text("id", [Some("1")]).build().unwrap();
        assert_eq!(ColumnInference::column_roles(&table), ColumnRoles::default());
    }
}
