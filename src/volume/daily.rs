use std::io::Write;

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::{
    block_range::BlockRange,
    etherscan::{BlockExplorer, Closest},
};

use super::{DayEstimate, DayEstimateWriter, DayOutcome, SkipReason, StoreError, VolumeEstimator};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("date range ends on {last} before it starts on {first}")]
pub struct InvalidDateRange {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

/// Calendar days, inclusive of both the first and last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl DateRange {
    pub fn new(first: NaiveDate, last: NaiveDate) -> Result<Self, InvalidDateRange> {
        if first > last {
            return Err(InvalidDateRange { first, last });
        }

        Ok(Self { first, last })
    }

    pub fn count(&self) -> usize {
        (self.last - self.first).num_days() as usize + 1
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let last = self.last;
        std::iter::successors(Some(self.first), |date| date.succ_opt())
            .take_while(move |date| *date <= last)
    }
}

/// First and last second of a UTC day as unix timestamps.
pub fn day_bounds(date: NaiveDate) -> (i64, i64) {
    let start = Utc
        .from_utc_datetime(&date.and_time(NaiveTime::MIN))
        .timestamp();
    (start, start + SECONDS_PER_DAY - 1)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectSummary {
    pub estimated: usize,
    pub skipped: usize,
}

pub fn summarize(outcomes: &[DayOutcome]) -> CollectSummary {
    outcomes
        .iter()
        .fold(CollectSummary::default(), |summary, outcome| match outcome {
            DayOutcome::Estimated(_) => CollectSummary {
                estimated: summary.estimated + 1,
                ..summary
            },
            DayOutcome::Skipped { .. } => CollectSummary {
                skipped: summary.skipped + 1,
                ..summary
            },
        })
}

/// Turns calendar days into [`DayEstimate`]s. Days are fetched one after the other, pacing is up
/// to the explorer handed in.
pub struct DailyVolumeFetcher<'a> {
    explorer: &'a dyn BlockExplorer,
    estimator: VolumeEstimator<'a>,
}

impl<'a> DailyVolumeFetcher<'a> {
    pub fn new(explorer: &'a dyn BlockExplorer, sample_count: usize) -> Self {
        Self {
            explorer,
            estimator: VolumeEstimator::new(explorer).with_sample_count(sample_count),
        }
    }

    #[instrument(skip_all, fields(%date))]
    pub async fn fetch_day(&self, date: NaiveDate) -> DayOutcome {
        let (start_timestamp, end_timestamp) = day_bounds(date);

        let start_block = match self
            .explorer
            .resolve_block(start_timestamp, Closest::After)
            .await
        {
            Ok(block_number) => block_number,
            Err(err) => {
                return DayOutcome::Skipped {
                    date,
                    reason: SkipReason::BlockUnavailable {
                        closest: Closest::After,
                        error: err.to_string(),
                    },
                }
            }
        };

        let end_block = match self
            .explorer
            .resolve_block(end_timestamp, Closest::Before)
            .await
        {
            Ok(block_number) => block_number,
            Err(err) => {
                return DayOutcome::Skipped {
                    date,
                    reason: SkipReason::BlockUnavailable {
                        closest: Closest::Before,
                        error: err.to_string(),
                    },
                }
            }
        };

        let range = match BlockRange::new(start_block, end_block) {
            Ok(range) => range,
            Err(_) => {
                return DayOutcome::Skipped {
                    date,
                    reason: SkipReason::NoBlocks {
                        start_block,
                        end_block,
                    },
                }
            }
        };

        let estimate = self.estimator.estimate_with_samples(range).await;
        if !estimate.has_estimate() {
            return DayOutcome::Skipped {
                date,
                reason: SkipReason::NoEstimate {
                    start_block,
                    end_block,
                },
            };
        }

        DayOutcome::Estimated(DayEstimate {
            date,
            tx_count: Some(estimate.tx_count),
            start_block,
            end_block,
        })
    }

    /// Fetches every day in order, writing each estimated day to `sink` as soon as it is known.
    /// Only a failure to write is fatal, unavailable days are logged and skipped.
    pub async fn collect_days<W: Write + Send>(
        &self,
        days: &DateRange,
        sink: &mut DayEstimateWriter<W>,
    ) -> Result<Vec<DayOutcome>, StoreError> {
        let total = days.count();
        let mut outcomes = Vec::with_capacity(total);

        for (index, date) in days.days().enumerate() {
            let outcome = self.fetch_day(date).await;

            match &outcome {
                DayOutcome::Estimated(estimate) => {
                    sink.write(estimate)?;
                    info!(
                        %date,
                        tx_count = estimate.tx_count,
                        progress = %format!("{}/{}", index + 1, total),
                        "estimated daily transactions"
                    );
                }
                DayOutcome::Skipped { reason, .. } => {
                    warn!(%date, %reason, "skipping day");
                }
            }

            outcomes.push(outcome);
        }

        Ok(outcomes)
    }
}
