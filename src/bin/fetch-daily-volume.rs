use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use dialoguer::Password;
use tracing::info;

use eth_weekend_effect::{
    build_series,
    env::ENV_CONFIG,
    etherscan::EtherscanHttp,
    log,
    rate_limit::{FixedIntervalGate, Paced},
    significance::render::series_overview,
    volume::{summarize, DayEstimateWriter, DEFAULT_SAMPLE_COUNT},
    DailyVolumeFetcher, DateRange,
};

/// Estimates daily Ethereum transaction counts from sampled blocks and writes them to CSV.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// First day to fetch, inclusive.
    #[clap(long, default_value = "2025-01-01")]
    start_date: NaiveDate,
    /// Last day to fetch, inclusive.
    #[clap(long, default_value = "2025-12-31")]
    end_date: NaiveDate,
    /// Output CSV path, parent directories are created.
    #[clap(long, default_value = "outputs/eth_transaction_data_2025.csv")]
    output: PathBuf,
    /// Blocks sampled per day.
    #[clap(long, default_value_t = DEFAULT_SAMPLE_COUNT)]
    samples_per_day: usize,
    /// Minimum delay between two explorer requests, overrides MIN_REQUEST_INTERVAL_MS.
    #[clap(long)]
    min_request_interval_ms: Option<u64>,
}

fn api_key() -> anyhow::Result<String> {
    match &ENV_CONFIG.etherscan_api_key {
        Some(api_key) => Ok(api_key.clone()),
        None => {
            let api_key = Password::new()
                .with_prompt("Etherscan API key (get one at https://etherscan.io/myapikey)")
                .interact()
                .context("read etherscan api key")?;
            Ok(api_key.trim().to_string())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    log::init(&ENV_CONFIG);

    let cli = Cli::parse();
    let days = DateRange::new(cli.start_date, cli.end_date)?;

    let api_key = api_key()?;
    let min_interval = cli
        .min_request_interval_ms
        .map(Duration::from_millis)
        .unwrap_or(ENV_CONFIG.min_request_interval);

    let etherscan = EtherscanHttp::new(
        &ENV_CONFIG.etherscan_api_url,
        &api_key,
        ENV_CONFIG.etherscan_chain_id,
    )
    .context("build etherscan http client")?;
    let explorer = Paced::new(etherscan, Arc::new(FixedIntervalGate::new(min_interval)));
    let fetcher = DailyVolumeFetcher::new(&explorer, cli.samples_per_day);

    info!(
        first = %days.first,
        last = %days.last,
        days = days.count(),
        samples_per_day = cli.samples_per_day,
        min_interval_ms = min_interval.as_millis() as u64,
        "fetching daily transaction counts, this takes a while because of rate limits"
    );

    let mut writer = DayEstimateWriter::create(&cli.output)
        .with_context(|| format!("create {}", cli.output.display()))?;
    let outcomes = fetcher.collect_days(&days, &mut writer).await?;

    let summary = summarize(&outcomes);
    info!(
        estimated = summary.estimated,
        skipped = summary.skipped,
        output = %cli.output.display(),
        "data fetch complete"
    );

    let estimates = outcomes
        .into_iter()
        .filter_map(|outcome| outcome.estimate().cloned());
    match build_series(estimates.map(Into::into)) {
        Ok(series) => print!("{}", series_overview(&series)),
        Err(err) => println!("{err}, nothing to summarize"),
    }

    Ok(())
}
