//! Request pacing. Every explorer request of a run goes through a single [`RateLimiter`], so the
//! estimator never bursts, no matter how the fetching around it is arranged. Retries of rate
//! limited requests are requests too and wait for the limiter like any other.

use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use backoff::ExponentialBackoff;
use tokio::{sync::Mutex, time::Instant};
use tracing::info;

use crate::{
    block_range::BlockNumber,
    etherscan::{BlockExplorer, Closest, FetchUnavailable},
};

const DEFAULT_MAX_RETRY_ELAPSED: Duration = Duration::from_secs(30);
const INITIAL_RETRY_INTERVAL: Duration =
    Duration::from_millis(backoff::default::INITIAL_INTERVAL_MILLIS);

#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Completes once the next request may be sent.
    async fn acquire(&self);
}

/// Lets one request through per `min_interval`. Callers queue on the mutex, which keeps the
/// gate fair and serializes concurrent callers.
#[derive(Debug)]
pub struct FixedIntervalGate {
    min_interval: Duration,
    last_release: Mutex<Option<Instant>>,
}

impl FixedIntervalGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_release: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

#[async_trait]
impl RateLimiter for FixedIntervalGate {
    async fn acquire(&self) {
        let mut last_release = self.last_release.lock().await;

        if let Some(last) = *last_release {
            tokio::time::sleep_until(last + self.min_interval).await;
        }

        *last_release = Some(Instant::now());
    }
}

/// A [`BlockExplorer`] that waits for its limiter before every request, and backs off and tries
/// again when the explorer answers that it is rate limited. Other failures are returned as is.
pub struct Paced<E> {
    inner: E,
    limiter: Arc<dyn RateLimiter>,
    max_retry_elapsed: Duration,
}

impl<E: BlockExplorer> Paced<E> {
    pub fn new(inner: E, limiter: Arc<dyn RateLimiter>) -> Self {
        Self {
            inner,
            limiter,
            max_retry_elapsed: DEFAULT_MAX_RETRY_ELAPSED,
        }
    }

    /// Bounds how long rate limited requests are retried before giving up on the unit.
    pub fn with_max_retry_elapsed(mut self, max_retry_elapsed: Duration) -> Self {
        self.max_retry_elapsed = max_retry_elapsed;
        self
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    async fn send<T, F, Fut>(&self, request: F) -> Result<T, FetchUnavailable>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, FetchUnavailable>>,
    {
        let policy = ExponentialBackoff {
            initial_interval: INITIAL_RETRY_INTERVAL,
            max_elapsed_time: Some(self.max_retry_elapsed),
            ..ExponentialBackoff::default()
        };

        let limiter = &self.limiter;
        let request = &request;
        backoff::future::retry(policy, move || async move {
            limiter.acquire().await;
            request().await.map_err(|err| {
                if err.is_rate_limit() {
                    info!(%err, "explorer rate limit hit, backing off");
                    backoff::Error::transient(err)
                } else {
                    backoff::Error::permanent(err)
                }
            })
        })
        .await
    }
}

#[async_trait]
impl<E: BlockExplorer> BlockExplorer for Paced<E> {
    async fn resolve_block(
        &self,
        timestamp: i64,
        closest: Closest,
    ) -> Result<BlockNumber, FetchUnavailable> {
        self.send(|| self.inner.resolve_block(timestamp, closest))
            .await
    }

    async fn get_block_tx_count(
        &self,
        block_number: BlockNumber,
    ) -> Result<u64, FetchUnavailable> {
        self.send(|| self.inner.get_block_tx_count(block_number))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex as StdMutex,
    };

    use crate::etherscan::MockBlockExplorer;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_acquire_does_not_wait_test() {
        let gate = FixedIntervalGate::new(Duration::from_millis(200));
        let start = Instant::now();

        gate.acquire().await;

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn spaces_successive_acquires_test() {
        let gate = FixedIntervalGate::new(Duration::from_millis(200));
        let start = Instant::now();

        for _ in 0..5 {
            gate.acquire().await;
        }

        // Four gaps between five requests.
        assert!(start.elapsed() >= Duration::from_millis(800));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_never_waits_test() {
        let gate = FixedIntervalGate::new(Duration::ZERO);
        let start = Instant::now();

        for _ in 0..10 {
            gate.acquire().await;
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn paced_explorer_spaces_requests_test() {
        let request_times = Arc::new(StdMutex::new(Vec::new()));
        let request_times_clone = request_times.clone();

        let mut explorer = MockBlockExplorer::new();
        explorer.expect_get_block_tx_count().returning(move |_| {
            request_times_clone.lock().unwrap().push(Instant::now());
            Ok(10)
        });

        let paced = Paced::new(
            explorer,
            Arc::new(FixedIntervalGate::new(Duration::from_millis(250))),
        );

        for block_number in 0..3 {
            paced.get_block_tx_count(block_number).await.unwrap();
        }

        let request_times = request_times.lock().unwrap();
        assert_eq!(request_times.len(), 3);
        for pair in request_times.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(250));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_after_rate_limit_wait_for_the_gate_test() {
        let request_times = Arc::new(StdMutex::new(Vec::new()));
        let request_times_clone = request_times.clone();
        let attempts = Arc::new(AtomicUsize::new(0));

        let mut explorer = MockBlockExplorer::new();
        explorer.expect_get_block_tx_count().returning(move |_| {
            request_times_clone.lock().unwrap().push(Instant::now());
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(FetchUnavailable::RateLimited(
                    "Max calls per sec rate limit reached".to_string(),
                ))
            } else {
                Ok(10)
            }
        });

        let paced = Paced::new(
            explorer,
            Arc::new(FixedIntervalGate::new(Duration::from_millis(250))),
        );

        for block_number in 0..3 {
            assert_eq!(paced.get_block_tx_count(block_number).await.unwrap(), 10);
        }

        // One rate limited answer, its retry, then two more calls.
        let request_times = request_times.lock().unwrap();
        assert_eq!(request_times.len(), 4);
        for pair in request_times.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(250));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn other_failures_are_not_retried_test() {
        let mut explorer = MockBlockExplorer::new();
        explorer
            .expect_resolve_block()
            .times(1)
            .returning(|_, _| Err(FetchUnavailable::NotFound("no closest block".to_string())));

        let paced = Paced::new(explorer, Arc::new(FixedIntervalGate::new(Duration::ZERO)));
        let result = paced.resolve_block(1735689600, Closest::After).await;

        assert!(matches!(result, Err(FetchUnavailable::NotFound(_))));
    }
}
