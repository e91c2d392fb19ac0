//! Fns to read variables from the environment more conveniently. Everything the binaries need to
//! know about their environment is collected once in [`ENV_CONFIG`]; library code never reads the
//! environment itself and receives what it needs as parameters.

use std::{env, time::Duration};

use lazy_static::lazy_static;
use tracing::debug;

const SECRET_LOG_BLACKLIST: [&str; 1] = ["ETHERSCAN_API_KEY"];

pub const DEFAULT_ETHERSCAN_API_URL: &str = "https://api.etherscan.io/v2/api";
const DEFAULT_CHAIN_ID: u32 = 1;
// The free Etherscan tier allows five calls per second.
const DEFAULT_MIN_REQUEST_INTERVAL_MS: u64 = 200;

lazy_static! {
    pub static ref ENV_CONFIG: EnvConfig = get_env_config();
}

pub(crate) fn obfuscate_if_secret(blacklist: &[&str], key: &str, value: &str) -> String {
    if blacklist.contains(&key) {
        let mut last_four = value.to_string();
        last_four.drain(0..value.len().saturating_sub(4));
        format!("****{last_four}")
    } else {
        value.to_string()
    }
}

/// Get an environment variable, encoding found or missing as Option, and panic otherwise.
pub fn get_env_var(key: &str) -> Option<String> {
    let var = match env::var(key) {
        Err(env::VarError::NotPresent) => None,
        Err(e) => panic!("{e}"),
        Ok(var) => Some(var),
    };

    if let Some(ref existing_var) = var {
        let output = obfuscate_if_secret(&SECRET_LOG_BLACKLIST, key, existing_var);
        debug!("env var {key}: {output}");
    } else {
        debug!("env var {key} requested but not found")
    };

    var
}

pub fn get_env_bool(key: &str) -> Option<bool> {
    get_env_var(key).map(|var| match var.to_lowercase().as_str() {
        "true" => true,
        "false" => false,
        "t" => true,
        "f" => false,
        "1" => true,
        "0" => false,
        str => panic!("invalid bool value {str} for {key}"),
    })
}

pub fn get_env_u64(key: &str) -> Option<u64> {
    get_env_var(key).map(|var| {
        var.parse::<u64>()
            .unwrap_or_else(|_| panic!("invalid integer value {var} for {key}"))
    })
}

#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Missing is fine, the binaries prompt for it.
    pub etherscan_api_key: Option<String>,
    pub etherscan_api_url: String,
    pub etherscan_chain_id: u32,
    pub min_request_interval: Duration,
    pub log_json: bool,
    pub log_perf: bool,
}

pub fn get_env_config() -> EnvConfig {
    EnvConfig {
        etherscan_api_key: get_env_var("ETHERSCAN_API_KEY").filter(|key| !key.trim().is_empty()),
        etherscan_api_url: get_env_var("ETHERSCAN_API_URL")
            .unwrap_or_else(|| DEFAULT_ETHERSCAN_API_URL.to_string()),
        etherscan_chain_id: get_env_u64("ETHERSCAN_CHAIN_ID")
            .map(|id| u32::try_from(id).expect("ETHERSCAN_CHAIN_ID to fit in u32"))
            .unwrap_or(DEFAULT_CHAIN_ID),
        min_request_interval: Duration::from_millis(
            get_env_u64("MIN_REQUEST_INTERVAL_MS").unwrap_or(DEFAULT_MIN_REQUEST_INTERVAL_MS),
        ),
        log_json: get_env_bool("LOG_JSON").unwrap_or(false),
        log_perf: get_env_bool("LOG_PERF").unwrap_or(false),
    }
}
