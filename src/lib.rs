pub mod block_range;
pub mod env;
pub mod etherscan;
pub mod log;
pub mod rate_limit;
pub mod series;
pub mod significance;
pub mod stats;
pub mod volume;

pub use series::{build as build_series, DailySeries, EmptyInputError};
pub use significance::{analyze, SignificanceReport, TestResult};
pub use volume::{DailyVolumeFetcher, DateRange, DayEstimate, VolumeEstimator};
