//! Volume Estimator. Counting every transaction of a day costs thousands of requests, so we
//! sample a handful of blocks spread over the range and extrapolate.

use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    block_range::{BlockNumber, BlockRange},
    etherscan::BlockExplorer,
};

pub const DEFAULT_SAMPLE_COUNT: usize = 5;

/// One sampled block. `tx_count` is `None` when the block could not be fetched, which is not the
/// same as a block without transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockSample {
    pub block_number: BlockNumber,
    pub tx_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledEstimate {
    /// Zero when no sample succeeded, check [`SampledEstimate::has_estimate`].
    pub tx_count: u64,
    pub samples: Vec<BlockSample>,
}

impl SampledEstimate {
    pub fn valid_samples(&self) -> usize {
        self.samples
            .iter()
            .filter(|sample| sample.tx_count.is_some())
            .count()
    }

    pub fn has_estimate(&self) -> bool {
        self.valid_samples() > 0
    }
}

/// Picks `sample_count` blocks starting at `range.start`, `step` apart. Ranges narrower than the
/// sample count get a step of one and so fewer, clustered samples. That loses accuracy on narrow
/// ranges but keeps the request count fixed.
pub fn sample_block_numbers(range: &BlockRange, sample_count: usize) -> Vec<BlockNumber> {
    let start = i64::from(range.start);
    let end = i64::from(range.end);
    let step = ((end - start) / sample_count as i64).max(1);

    (0..sample_count as i64)
        .map(|i| start + i * step)
        .filter(|block_number| *block_number <= end)
        .map(|block_number| block_number as BlockNumber)
        .collect()
}

/// Average transactions per valid sample times the number of blocks in the range, rounded.
/// Failed samples are left out of the average rather than counted as zero.
pub fn extrapolate(samples: &[BlockSample], range: &BlockRange) -> u64 {
    let (total_tx, valid_samples) = samples
        .iter()
        .filter_map(|sample| sample.tx_count)
        .fold((0u64, 0u64), |(total, count), tx_count| {
            (total + tx_count, count + 1)
        });

    if valid_samples == 0 {
        return 0;
    }

    let avg_tx_per_block = total_tx as f64 / valid_samples as f64;
    (avg_tx_per_block * range.count() as f64).round() as u64
}

pub struct VolumeEstimator<'a> {
    explorer: &'a dyn BlockExplorer,
    sample_count: usize,
}

impl<'a> VolumeEstimator<'a> {
    /// Pass a paced explorer, the estimator itself issues its requests back to back.
    pub fn new(explorer: &'a dyn BlockExplorer) -> Self {
        Self {
            explorer,
            sample_count: DEFAULT_SAMPLE_COUNT,
        }
    }

    pub fn with_sample_count(mut self, sample_count: usize) -> Self {
        self.sample_count = sample_count.max(1);
        self
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub async fn estimate_with_samples(&self, range: BlockRange) -> SampledEstimate {
        let mut samples = Vec::with_capacity(self.sample_count);

        for block_number in sample_block_numbers(&range, self.sample_count) {
            let tx_count = match self.explorer.get_block_tx_count(block_number).await {
                Ok(tx_count) => Some(tx_count),
                Err(err) => {
                    warn!(block_number, %err, "block unavailable, excluding it from the sample");
                    None
                }
            };
            samples.push(BlockSample {
                block_number,
                tx_count,
            });
        }

        let tx_count = extrapolate(&samples, &range);
        debug!(%range, tx_count, sample_count = samples.len(), "estimated block range volume");

        SampledEstimate { tx_count, samples }
    }

    /// Estimated transaction count for the range. Zero means no sample could be fetched, use
    /// [`VolumeEstimator::estimate_with_samples`] to tell that apart from a quiet range.
    pub async fn estimate(&self, range: BlockRange) -> u64 {
        self.estimate_with_samples(range).await.tx_count
    }
}
