use std::{fs, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::info;

use eth_weekend_effect::{
    analyze, build_series,
    env::ENV_CONFIG,
    log,
    significance::render::{console_report, summary_text},
    volume::read_day_estimates_from_path,
};

/// Tests whether weekday transaction volume differs significantly from the weekend.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// CSV written by fetch-daily-volume.
    #[clap(long, default_value = "outputs/eth_transaction_data_2025.csv")]
    input: PathBuf,
    /// Where to write the compact results summary.
    #[clap(long, default_value = "outputs/statistical_results.txt")]
    summary_output: PathBuf,
    /// Optionally write the full report as JSON.
    #[clap(long)]
    json_output: Option<PathBuf>,
}

fn write_creating_dirs(path: &PathBuf, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    log::init(&ENV_CONFIG);

    let cli = Cli::parse();

    let estimates = read_day_estimates_from_path(&cli.input).with_context(|| {
        format!(
            "read {}, run fetch-daily-volume first to create it",
            cli.input.display()
        )
    })?;
    info!(rows = estimates.len(), input = %cli.input.display(), "loaded day estimates");

    let series = build_series(estimates.into_iter().map(Into::into))?;
    let report = analyze(&series)?;

    print!("{}", console_report(&report));

    write_creating_dirs(&cli.summary_output, &summary_text(&report))?;
    info!(path = %cli.summary_output.display(), "saved results summary");

    if let Some(json_output) = &cli.json_output {
        let json = serde_json::to_string_pretty(&report)?;
        write_creating_dirs(json_output, &json)?;
        info!(path = %json_output.display(), "saved json report");
    }

    Ok(())
}
