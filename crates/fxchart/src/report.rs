use std::{
    fs, io,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use log::{info, warn};

use crate::{
    annotate::build_chart,
    chart::{render_html, Chart},
    config::ReportConfig,
    data::{load_bars_from_csv, load_events_from_csv, Bar, EconomicEvent},
    errors::ErrorRepr,
    resample::resample_hourly,
    window::Window,
};

/// Destination of rendered charts.
#[cfg_attr(test, mockall::automock)]
pub trait ChartWriter {
    fn write(&mut self, chart: &Chart) -> Result<PathBuf, ErrorRepr>;
}

/// Writes `<dir>/<PAIR>_last_week.html`, replacing any existing file.
pub struct HtmlFileWriter {
    dir: PathBuf,
}

impl HtmlFileWriter {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_owned(),
        }
    }

    pub fn path_for(&self, pair: &str) -> PathBuf {
        self.dir.join(format!("{}_last_week.html", pair))
    }
}

impl ChartWriter for HtmlFileWriter {
    fn write(&mut self, chart: &Chart) -> Result<PathBuf, ErrorRepr> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&chart.pair);
        fs::write(&path, render_html(chart)?)?;
        Ok(path)
    }
}

/// Resamples to hourly bars, applies the trailing window and builds one
/// chart per pair that has bars left.
pub fn build_charts(
    bars: Vec<Bar>,
    events: Vec<EconomicEvent>,
    config: &ReportConfig,
) -> Result<Vec<Chart>, ErrorRepr> {
    let hourly = resample_hourly(&bars)?;
    let window = Window::trailing(&hourly, config.window)?;
    info!(
        "window {} .. {} ({} hourly bars)",
        window.start,
        window.end,
        hourly.len()
    );
    let hourly = window.bars(hourly);
    let events = window.events(events);

    let pairs = if config.pairs.is_empty() {
        hourly.iter().map(|b| b.pair.clone()).unique().sorted().collect()
    } else {
        config.pairs.clone()
    };

    let mut charts = vec![];
    for pair in pairs {
        let bars = hourly
            .iter()
            .filter(|b| b.pair == pair)
            .cloned()
            .collect::<Vec<_>>();
        if let Some(chart) = build_chart(&pair, &bars, &events, &config.event_currency) {
            charts.push(chart);
        }
    }
    Ok(charts)
}

/// Runs the whole report over the two CSV exports and returns the written
/// paths.
pub fn run<P, E, W>(
    prices: P,
    events: E,
    config: &ReportConfig,
    writer: &mut W,
) -> Result<Vec<PathBuf>, ErrorRepr>
where
    P: io::Read,
    E: io::Read,
    W: ChartWriter,
{
    let bars = load_bars_from_csv(prices)?;
    let events = load_events_from_csv(events)?;
    info!("loaded {} price rows, {} events", bars.len(), events.len());

    let charts = build_charts(bars, events, config)?;
    if charts.is_empty() {
        warn!("no charts generated");
    }

    let mut paths = Vec::with_capacity(charts.len());
    for chart in &charts {
        let path = writer.write(chart)?;
        info!("chart saved to {}", path.display());
        paths.push(path);
    }
    Ok(paths)
}
