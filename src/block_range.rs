use std::fmt::{Display, Formatter};

use thiserror::Error;

// Execution chain blocks come in about once every 12s. With i32 we only overflow when the block
// number passes 2_147_483_648, which is several centuries away.
pub type BlockNumber = i32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidBlockRange {
    #[error("block numbers can't be negative, got start {0}")]
    NegativeStart(BlockNumber),
    #[error("tried to create negative block range {start}-{end}")]
    EndBeforeStart {
        start: BlockNumber,
        end: BlockNumber,
    },
}

/// A range of blocks. The range is inclusive of both the first and last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    pub start: BlockNumber,
    pub end: BlockNumber,
}

impl BlockRange {
    pub fn new(start: BlockNumber, end: BlockNumber) -> Result<Self, InvalidBlockRange> {
        if start < 0 {
            return Err(InvalidBlockRange::NegativeStart(start));
        }

        if start > end {
            return Err(InvalidBlockRange::EndBeforeStart { start, end });
        }

        Ok(Self { start, end })
    }

    pub fn count(&self) -> u64 {
        (self.end - self.start) as u64 + 1
    }
}

impl Display for BlockRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_range_count_test() {
        let range = BlockRange::new(1, 4).unwrap();
        assert_eq!(range.count(), 4);
    }

    #[test]
    fn single_block_range_test() {
        let range = BlockRange::new(7, 7).unwrap();
        assert_eq!(range.count(), 1);
        assert_eq!(range.to_string(), "7-7");
    }

    #[test]
    fn rejects_negative_range_test() {
        assert_eq!(
            BlockRange::new(10, 9),
            Err(InvalidBlockRange::EndBeforeStart { start: 10, end: 9 })
        );
    }

    #[test]
    fn rejects_negative_start_test() {
        assert_eq!(
            BlockRange::new(-1, 9),
            Err(InvalidBlockRange::NegativeStart(-1))
        );
    }
}
