use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use format_url::FormatUrl;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::block_range::BlockNumber;

use super::{
    envelope::{
        parse_decimal_block_number, parse_hex_block_number, to_hex_tag, Envelope,
        EtherscanEthPrice, ProxyBlock,
    },
    BlockExplorer, Closest, FetchUnavailable,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct EthPrice {
    pub timestamp: DateTime<Utc>,
    pub usd: f64,
}

/// Etherscan v2 API client. Credentials and chain are passed in, nothing is read from the
/// environment here. Every call is a single request, pacing and retrying rate limited answers is
/// left to [`crate::rate_limit::Paced`].
#[derive(Clone, Debug)]
pub struct EtherscanHttp {
    api_key: String,
    api_url: String,
    chain_id: String,
    client: reqwest::Client,
}

impl EtherscanHttp {
    pub fn new(api_url: &str, api_key: &str, chain_id: u32) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            api_key: api_key.to_string(),
            api_url: api_url.to_string(),
            chain_id: chain_id.to_string(),
            client,
        })
    }

    fn make_url(&self, params: &[(&str, &str)]) -> String {
        let mut query_params = vec![("chainid", self.chain_id.as_str())];
        query_params.extend_from_slice(params);
        query_params.push(("apikey", self.api_key.as_str()));

        FormatUrl::new(&self.api_url)
            .with_query_params(query_params)
            .format_url()
    }

    async fn send_request(&self, url: &str) -> Result<Envelope, FetchUnavailable> {
        let response = self.client.get(url).send().await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchUnavailable::RateLimited(format!(
                "http status {}",
                response.status()
            )));
        }

        let envelope = response.error_for_status()?.json::<Envelope>().await?;

        Ok(envelope)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        params: &[(&str, &str)],
    ) -> Result<Option<T>, FetchUnavailable> {
        let url = self.make_url(params);
        debug!(?params, "sending etherscan request");

        self.send_request(&url).await?.into_result::<T>()
    }

    pub async fn latest_block_number(&self) -> Result<BlockNumber, FetchUnavailable> {
        let text = self
            .fetch::<String>(&[("module", "proxy"), ("action", "eth_blockNumber")])
            .await?
            .ok_or_else(|| FetchUnavailable::NotFound("latest block number".to_string()))?;

        parse_hex_block_number(&text)
    }

    pub async fn eth_price(&self) -> Result<EthPrice, FetchUnavailable> {
        let price = self
            .fetch::<EtherscanEthPrice>(&[("module", "stats"), ("action", "ethprice")])
            .await?
            .ok_or_else(|| FetchUnavailable::NotFound("eth price".to_string()))?;

        let timestamp = price
            .ethusd_timestamp
            .parse::<i64>()
            .ok()
            .and_then(|seconds| Utc.timestamp_opt(seconds, 0).single())
            .ok_or_else(|| {
                FetchUnavailable::Decode(format!("eth price timestamp {}", price.ethusd_timestamp))
            })?;
        let usd = price
            .ethusd
            .parse::<f64>()
            .map_err(|err| FetchUnavailable::Decode(format!("eth price {}: {err}", price.ethusd)))?;

        Ok(EthPrice { timestamp, usd })
    }
}

#[async_trait]
impl BlockExplorer for EtherscanHttp {
    async fn resolve_block(
        &self,
        timestamp: i64,
        closest: Closest,
    ) -> Result<BlockNumber, FetchUnavailable> {
        let timestamp_text = timestamp.to_string();
        let text = self
            .fetch::<String>(&[
                ("module", "block"),
                ("action", "getblocknobytime"),
                ("timestamp", &timestamp_text),
                ("closest", closest.as_query_value()),
            ])
            .await?
            .ok_or_else(|| {
                FetchUnavailable::NotFound(format!("block {closest} timestamp {timestamp}"))
            })?;

        parse_decimal_block_number(&text)
    }

    async fn get_block_tx_count(
        &self,
        block_number: BlockNumber,
    ) -> Result<u64, FetchUnavailable> {
        let tag = to_hex_tag(block_number);
        let block = self
            .fetch::<ProxyBlock>(&[
                ("module", "proxy"),
                ("action", "eth_getBlockByNumber"),
                ("tag", &tag),
                ("boolean", "false"),
            ])
            .await?
            .ok_or_else(|| FetchUnavailable::NotFound(format!("block {block_number}")))?;

        Ok(block.transactions.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use serde_json::json;

    use super::*;

    fn client_for(server: &mockito::ServerGuard) -> EtherscanHttp {
        EtherscanHttp::new(&format!("{}/v2/api", server.url()), "test-key", 1).unwrap()
    }

    #[tokio::test]
    async fn resolve_block_test() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v2/api")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("chainid".into(), "1".into()),
                Matcher::UrlEncoded("module".into(), "block".into()),
                Matcher::UrlEncoded("action".into(), "getblocknobytime".into()),
                Matcher::UrlEncoded("timestamp".into(), "1735689600".into()),
                Matcher::UrlEncoded("closest".into(), "after".into()),
                Matcher::UrlEncoded("apikey".into(), "test-key".into()),
            ]))
            .with_status(200)
            .with_body(json!({"status": "1", "message": "OK", "result": "21525891"}).to_string())
            .create_async()
            .await;

        let etherscan = client_for(&server);
        let block_number = etherscan
            .resolve_block(1735689600, Closest::After)
            .await
            .unwrap();

        assert_eq!(block_number, 21525891);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn resolve_block_not_found_test() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/api")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                json!({"status": "0", "message": "NOTOK", "result": "Error! No closest block found"})
                    .to_string(),
            )
            .create_async()
            .await;

        let etherscan = client_for(&server);
        let result = etherscan.resolve_block(0, Closest::Before).await;

        assert!(matches!(result, Err(FetchUnavailable::NotFound(_))));
    }

    #[tokio::test]
    async fn get_block_tx_count_test() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/api")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("action".into(), "eth_getBlockByNumber".into()),
                Matcher::UrlEncoded("tag".into(), "0x14875c3".into()),
                Matcher::UrlEncoded("boolean".into(), "false".into()),
            ]))
            .with_status(200)
            .with_body(
                json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "result": {"number": "0x14875c3", "transactions": ["0x1", "0x2"]}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let etherscan = client_for(&server);
        let tx_count = etherscan.get_block_tx_count(21525955).await.unwrap();

        assert_eq!(tx_count, 2);
    }

    #[tokio::test]
    async fn missing_block_is_unavailable_not_zero_test() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/api")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({"jsonrpc": "2.0", "id": 1, "result": null}).to_string())
            .create_async()
            .await;

        let etherscan = client_for(&server);
        let result = etherscan.get_block_tx_count(1).await;

        assert!(matches!(result, Err(FetchUnavailable::NotFound(_))));
    }

    #[tokio::test]
    async fn server_error_is_unavailable_test() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/api")
            .match_query(Matcher::Any)
            .with_status(502)
            .create_async()
            .await;

        let etherscan = client_for(&server);
        let result = etherscan.get_block_tx_count(1).await;

        assert!(matches!(result, Err(FetchUnavailable::Http(_))));
    }

    #[tokio::test]
    async fn too_many_requests_is_rate_limit_test() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v2/api")
            .match_query(Matcher::Any)
            .with_status(429)
            .expect(1)
            .create_async()
            .await;

        let etherscan = client_for(&server);
        let result = etherscan.get_block_tx_count(1).await;

        assert!(matches!(result, Err(FetchUnavailable::RateLimited(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rate_limit_answer_is_not_retried_here_test() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v2/api")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                json!({"status": "0", "message": "NOTOK", "result": "Max calls per sec rate limit reached (5/sec)"})
                    .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let etherscan = client_for(&server);
        let result = etherscan.resolve_block(1735689600, Closest::After).await;

        assert!(matches!(result, Err(FetchUnavailable::RateLimited(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn latest_block_number_test() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/api")
            .match_query(Matcher::UrlEncoded(
                "action".into(),
                "eth_blockNumber".into(),
            ))
            .with_status(200)
            .with_body(json!({"jsonrpc": "2.0", "id": 83, "result": "0xc1fa67"}).to_string())
            .create_async()
            .await;

        let etherscan = client_for(&server);
        assert_eq!(etherscan.latest_block_number().await.unwrap(), 12712551);
    }

    #[tokio::test]
    async fn eth_price_test() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/api")
            .match_query(Matcher::UrlEncoded("action".into(), "ethprice".into()))
            .with_status(200)
            .with_body(
                json!({
                    "status": "1",
                    "message": "OK",
                    "result": {
                        "ethbtc": "0.0371",
                        "ethbtc_timestamp": "1735689600",
                        "ethusd": "3337.12",
                        "ethusd_timestamp": "1735689600"
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let etherscan = client_for(&server);
        let price = etherscan.eth_price().await.unwrap();

        assert_eq!(price.usd, 3337.12);
        assert_eq!(
            price.timestamp,
            "2025-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
    }
}
