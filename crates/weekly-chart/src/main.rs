mod cli;
mod fetch;

use anyhow::Context;
use chrono::Duration;
use clap::Parser;
use fxchart::{config::ReportConfigBuilder, HtmlFileWriter};
use log::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = cli::Args::parse();
    let config = ReportConfigBuilder::default()
        .output_dir(args.output_dir.clone())
        .window(Duration::days(args.days))
        .pairs(&args.pairs)
        .event_currency(args.event_currency.clone())
        .build()?;

    info!("loading data from published sheets");
    let prices = fetch::fetch_csv(&args.price_url)
        .await
        .context("loading price data, check the url")?;
    let events = fetch::fetch_csv(&args.events_url)
        .await
        .context("loading event data, check the url")?;

    let mut writer = HtmlFileWriter::new(&config.output_dir);
    let paths = fxchart::run(prices.as_bytes(), events.as_bytes(), &config, &mut writer)
        .context("building weekly charts")?;

    info!("{} chart(s) generated", paths.len());
    Ok(())
}
