use anyhow::Context;
use console::{style, Term};
use dialoguer::Password;

use eth_weekend_effect::{
    env::ENV_CONFIG,
    etherscan::{BlockExplorer, EtherscanHttp},
    log,
};

/// Checks the API key and the two calls the fetcher depends on, one step at a time.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    log::init(&ENV_CONFIG);

    let term = Term::stdout();
    term.write_line("= etherscan connection check =")?;

    let api_key = match &ENV_CONFIG.etherscan_api_key {
        Some(api_key) => api_key.clone(),
        None => Password::new()
            .with_prompt("Etherscan API key")
            .interact()
            .context("read etherscan api key")?,
    };
    let etherscan = EtherscanHttp::new(
        &ENV_CONFIG.etherscan_api_url,
        api_key.trim(),
        ENV_CONFIG.etherscan_chain_id,
    )
    .context("build etherscan http client")?;

    term.write_line("1. checking the api key with the eth price endpoint")?;
    match etherscan.eth_price().await {
        Ok(price) => term.write_line(&format!(
            "   {} eth price {:.2} usd at {}",
            style("ok").green(),
            price.usd,
            price.timestamp
        ))?,
        Err(err) => {
            term.write_line(&format!("   {} {err}", style("failed").red()))?;
            anyhow::bail!("api key check failed: {err}");
        }
    }

    term.write_line("2. fetching the latest block number")?;
    let latest_block = match etherscan.latest_block_number().await {
        Ok(block_number) => {
            term.write_line(&format!(
                "   {} latest block {block_number}",
                style("ok").green()
            ))?;
            block_number
        }
        Err(err) => {
            term.write_line(&format!("   {} {err}", style("failed").red()))?;
            anyhow::bail!("latest block check failed: {err}");
        }
    };

    term.write_line("3. counting the transactions in the latest block")?;
    match etherscan.get_block_tx_count(latest_block).await {
        Ok(tx_count) => term.write_line(&format!(
            "   {} block {latest_block} has {tx_count} transactions",
            style("ok").green()
        ))?,
        Err(err) => {
            term.write_line(&format!("   {} {err}", style("failed").red()))?;
            anyhow::bail!("transaction count check failed: {err}");
        }
    }

    term.write_line("all checks passed")?;

    Ok(())
}
