use std::path::PathBuf;

use clap::Parser;
use fxchart::{
    annotate::EventCurrency,
    config::{EVENTS_DATA_URL, PRICE_DATA_URL},
};

/// Builds last-week candlestick charts from published spreadsheet exports.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// CSV export of the 5-minute price sheet.
    #[arg(long, default_value = PRICE_DATA_URL)]
    pub price_url: String,

    /// CSV export of the economic calendar sheet.
    #[arg(long, default_value = EVENTS_DATA_URL)]
    pub events_url: String,

    #[arg(short, long, default_value = "output")]
    pub output_dir: PathBuf,

    /// Length of the trailing window in days.
    #[arg(short, long, default_value_t = 7, value_parser = clap::value_parser!(i64).range(1..))]
    pub days: i64,

    /// Pair to chart, repeatable. Every pair in the price data when omitted.
    #[arg(short, long = "pair")]
    pub pairs: Vec<String>,

    /// Calendar events shown on a chart: a currency code, `base` or `either`.
    #[arg(short, long, default_value = "USD")]
    pub event_currency: EventCurrency,
}
