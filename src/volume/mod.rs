//! Daily transaction volume, estimated from block samples.
mod daily;
mod estimator;
mod store;

use std::fmt::Display;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{block_range::BlockNumber, etherscan::Closest};

pub use daily::{summarize, CollectSummary, DailyVolumeFetcher, DateRange, InvalidDateRange};
pub use estimator::{
    extrapolate, sample_block_numbers, BlockSample, SampledEstimate, VolumeEstimator,
    DEFAULT_SAMPLE_COUNT,
};
pub use store::{
    read_day_estimates, read_day_estimates_from_path, write_day_estimates, DayEstimateWriter,
    StoreError, CSV_HEADER,
};

/// Field order is the column order of the CSV artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayEstimate {
    pub date: NaiveDate,
    pub tx_count: Option<u64>,
    pub start_block: BlockNumber,
    pub end_block: BlockNumber,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    BlockUnavailable { closest: Closest, error: String },
    NoBlocks {
        start_block: BlockNumber,
        end_block: BlockNumber,
    },
    NoEstimate {
        start_block: BlockNumber,
        end_block: BlockNumber,
    },
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::BlockUnavailable { closest, error } => {
                write!(f, "could not resolve the day's {closest} block: {error}")
            }
            SkipReason::NoBlocks {
                start_block,
                end_block,
            } => write!(
                f,
                "no blocks in the day, first block {start_block} is after last block {end_block}"
            ),
            SkipReason::NoEstimate {
                start_block,
                end_block,
            } => write!(
                f,
                "no estimate, every sampled block in {start_block}-{end_block} was unavailable"
            ),
        }
    }
}

/// What happened to one day. A skipped day never shows up as a zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayOutcome {
    Estimated(DayEstimate),
    Skipped { date: NaiveDate, reason: SkipReason },
}

impl DayOutcome {
    pub fn date(&self) -> NaiveDate {
        match self {
            DayOutcome::Estimated(estimate) => estimate.date,
            DayOutcome::Skipped { date, .. } => *date,
        }
    }

    pub fn estimate(&self) -> Option<&DayEstimate> {
        match self {
            DayOutcome::Estimated(estimate) => Some(estimate),
            DayOutcome::Skipped { .. } => None,
        }
    }
}
