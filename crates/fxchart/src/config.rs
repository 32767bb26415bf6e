use std::path::PathBuf;

use chrono::Duration;
use derive_builder::Builder;

use crate::{annotate::EventCurrency, data::Symbol};

pub const PRICE_DATA_URL: &str =
    "https://docs.google.com/spreadsheets/d/e/REPLACE_WITH_YOUR_PRICE_SHEET_ID/pub?output=csv";
pub const EVENTS_DATA_URL: &str =
    "https://docs.google.com/spreadsheets/d/e/REPLACE_WITH_YOUR_EVENTS_SHEET_ID/pub?output=csv";

#[derive(Builder, Debug, Clone)]
pub struct ReportConfig {
    #[builder(setter(into), default = "PathBuf::from(\"output\")")]
    pub output_dir: PathBuf,
    /// Length of the trailing window.
    #[builder(default = "Duration::days(7)")]
    pub window: Duration,
    /// Pairs to chart; empty means every pair in the price data.
    #[builder(setter(custom), default)]
    pub pairs: Vec<Symbol>,
    #[builder(default)]
    pub event_currency: EventCurrency,
}

impl ReportConfigBuilder {
    pub fn pairs<I, S>(&mut self, pairs: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.pairs = Some(
            pairs
                .into_iter()
                .map(|p| p.as_ref().trim().to_uppercase())
                .collect(),
        );
        self
    }
}
