//! Block Locator. Resolves timestamps to blocks and counts the transactions in a block, through
//! the Etherscan API or anything else that implements [`BlockExplorer`].
mod envelope;
mod http;

use std::fmt::Display;

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

use crate::block_range::BlockNumber;

pub use http::{EthPrice, EtherscanHttp};

/// Which side of a timestamp the resolved block should be on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closest {
    Before,
    After,
}

impl Closest {
    fn as_query_value(&self) -> &'static str {
        match self {
            Closest::Before => "before",
            Closest::After => "after",
        }
    }
}

impl Display for Closest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_query_value())
    }
}

/// A single unit (a block, a timestamp lookup) could not be fetched. Never a zero, never fatal
/// for a run: callers skip the unit and carry on.
#[derive(Debug, Error)]
pub enum FetchUnavailable {
    #[error("explorer has no result: {0}")]
    NotFound(String),
    #[error("explorer rate limit reached: {0}")]
    RateLimited(String),
    #[error("explorer returned an error: {0}")]
    Api(String),
    #[error("failed to decode explorer response: {0}")]
    Decode(String),
    #[error("explorer request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl FetchUnavailable {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, FetchUnavailable::RateLimited(_))
    }
}

#[automock]
#[async_trait]
pub trait BlockExplorer: Send + Sync {
    /// Block number closest to a unix timestamp, on the requested side of it.
    async fn resolve_block(
        &self,
        timestamp: i64,
        closest: Closest,
    ) -> Result<BlockNumber, FetchUnavailable>;

    /// Number of transactions included in a block.
    async fn get_block_tx_count(&self, block_number: BlockNumber)
        -> Result<u64, FetchUnavailable>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_query_value_test() {
        assert_eq!(Closest::Before.to_string(), "before");
        assert_eq!(Closest::After.to_string(), "after");
    }

    #[test]
    fn rate_limit_detection_test() {
        assert!(FetchUnavailable::RateLimited("slow down".to_string()).is_rate_limit());
        assert!(!FetchUnavailable::NotFound("block".to_string()).is_rate_limit());
    }
}
