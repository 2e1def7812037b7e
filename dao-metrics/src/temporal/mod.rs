//! Temporal normalization and calendar bucketing.
//!
//! - [`normalize`]: cell to [`Instant`] conversion with tagged failures
//! - [`bucketize`]: dense monthly/daily series ending at the injected "now"
//! - [`Clock`]: the only source of "now" in the pipeline

mod bucket;
mod clock;
mod normalize;

pub use bucket::{bucketize, Granularity, PeriodicSeries, SeriesPoint};
pub use clock::{Clock, FixedClock, SystemClock};
pub use normalize::{
    from_epoch_seconds, normalize, normalize_column, parse_calendar, CellFailure, Instant,
    NormalizeError, NormalizedColumn, Representation,
};
