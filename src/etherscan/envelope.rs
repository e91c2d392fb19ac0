//! Etherscan wraps every answer in one of two envelopes. The classic modules answer with
//! `{status, message, result}`, the proxy module answers JSON-RPC style with `{result}` or
//! `{error}`. Both decode through [`Envelope`].

use serde::{de::DeserializeOwned, Deserialize};

use crate::block_range::BlockNumber;

use super::FetchUnavailable;

#[derive(Debug, Deserialize)]
pub struct JsonRpcError {
    #[serde(default)]
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: serde_json::Value,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

fn classify_failure(text: String) -> FetchUnavailable {
    let lowercase = text.to_lowercase();
    if lowercase.contains("rate limit") {
        FetchUnavailable::RateLimited(text)
    } else if lowercase.contains("no closest block") || lowercase.contains("no record") {
        FetchUnavailable::NotFound(text)
    } else {
        FetchUnavailable::Api(text)
    }
}

impl Envelope {
    /// Unwraps the envelope. `Ok(None)` means the explorer answered but had nothing, e.g. a
    /// `null` block.
    pub fn into_result<T: DeserializeOwned>(self) -> Result<Option<T>, FetchUnavailable> {
        if let Some(error) = self.error {
            return Err(FetchUnavailable::Api(format!(
                "{} (code {})",
                error.message, error.code
            )));
        }

        if self.status.as_deref() == Some("0") {
            let text = match self.result {
                serde_json::Value::String(text) if !text.is_empty() => text,
                _ => self.message.unwrap_or_else(|| "NOTOK".to_string()),
            };
            return Err(classify_failure(text));
        }

        match self.result {
            serde_json::Value::Null => Ok(None),
            // Some proxy calls report throttling as a bare string result.
            serde_json::Value::String(ref text) if text.to_lowercase().contains("rate limit") => {
                Err(FetchUnavailable::RateLimited(text.clone()))
            }
            result => serde_json::from_value::<T>(result)
                .map(Some)
                .map_err(|err| FetchUnavailable::Decode(err.to_string())),
        }
    }
}

/// Only the transaction hashes are requested, we only count them.
#[derive(Debug, Deserialize)]
pub struct ProxyBlock {
    pub transactions: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct EtherscanEthPrice {
    pub ethusd: String,
    pub ethusd_timestamp: String,
}

pub fn parse_decimal_block_number(text: &str) -> Result<BlockNumber, FetchUnavailable> {
    text.trim()
        .parse::<BlockNumber>()
        .map_err(|err| FetchUnavailable::Decode(format!("block number {text}: {err}")))
}

pub fn parse_hex_block_number(text: &str) -> Result<BlockNumber, FetchUnavailable> {
    let digits = text
        .strip_prefix("0x")
        .ok_or_else(|| FetchUnavailable::Decode(format!("expected 0x prefixed hex, got {text}")))?;
    BlockNumber::from_str_radix(digits, 16)
        .map_err(|err| FetchUnavailable::Decode(format!("block number {text}: {err}")))
}

pub fn to_hex_tag(block_number: BlockNumber) -> String {
    format!("{block_number:#x}")
}
