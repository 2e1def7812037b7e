//! Small tables shaped like the DAO census exports, for tests.

use chrono::NaiveDate;

use crate::pipeline::PipelineConfig;
use crate::processor::DatasetProcessor;
use crate::registry::DatasetRegistry;
use crate::report::DatasetReport;
use crate::table::Table;
use crate::temporal::FixedClock;

/// A clock frozen at midnight UTC of the given date.
pub fn fixed_clock(year: i32, month: u32, day: u32) -> FixedClock {
    let date = NaiveDate::from_ymd_opt(year, month, day).expect("valid fixture date");
    FixedClock::at_date(date)
}

/// `{id, name}`: no date column, no address or network columns.
pub fn plain_table() -> Table {
    Table::builder()
        .int("id", [Some(1), Some(2), Some(3)])
        .text("name", [Some("alpha"), Some("beta"), Some("gamma")])
        .build()
        .expect("valid plain fixture")
}

/// Proposals with calendar-string dates in January and March 2023.
pub fn proposals_table() -> Table {
    Table::builder()
        .text("proposalId", [Some("p-1"), Some("p-2"), Some("p-3")])
        .text("title", [Some("Fund grants"), Some("Add signer"), Some("Raise quorum")])
        .text("createdAt", [Some("2023-01-05"), Some("2023-01-20"), Some("2023-03-01")])
        .build()
        .expect("valid proposals fixture")
}

/// Members with epoch-second dates, two address columns (3 distinct
/// addresses in total) and a `network` column.
pub fn network_table() -> Table {
    Table::builder()
        .int(
            "createdAt",
            [Some(1_672_531_200), Some(1_675_209_600), Some(1_677_628_800)],
        )
        .text("userAddress", [Some("0x1"), Some("0x2"), Some("0x1")])
        .text("daoAddress", [Some("0xa"), Some("0xa"), Some("0xa")])
        .text("network", [Some("mainnet"), Some("xdai"), Some("mainnet")])
        .build()
        .expect("valid network fixture")
}

/// Processes `table` with the default config, an empty registry and `clock`.
pub fn process_fixture(name: &str, table: &Table, clock: &FixedClock) -> DatasetReport {
    let config = PipelineConfig::default();
    let registry = DatasetRegistry::empty();
    DatasetProcessor::new(&config, &registry, clock)
        .process(name, table)
        .expect("fixture processes cleanly")
}
