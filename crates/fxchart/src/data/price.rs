use std::io;

use csv::StringRecord;
use log::warn;
use serde::Deserialize;

use super::{normalize_headers, parse_time, timefmt, Bar, DateTime, Symbol};
use crate::errors::ErrorRepr;

/// One row of the long layout: `Time, Pair, Open, High, Low, Close`.
#[derive(Debug, Deserialize)]
struct LongRow {
    #[serde(alias = "date")]
    #[serde(deserialize_with = "timefmt")]
    time: DateTime,
    #[serde(alias = "symbol")]
    pair: Symbol,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

impl From<LongRow> for Bar {
    fn from(r: LongRow) -> Self {
        Bar {
            pair: r.pair.trim().to_uppercase(),
            time: r.time,
            open: r.open,
            high: r.high,
            low: r.low,
            close: r.close,
        }
    }
}

/// Column positions of one `date_<pair>, open_<pair>, ...` group in the
/// wide layout.
#[derive(Debug, PartialEq)]
struct WideGroup {
    pair: Symbol,
    time: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
}

impl WideGroup {
    /// `None` when the group has no timestamp in this row.
    fn read(&self, record: &StringRecord) -> Option<Result<Bar, String>> {
        match record.get(self.time).map(str::trim) {
            None | Some("") => None,
            Some(_) => Some(self.parse(record)),
        }
    }

    fn parse(&self, record: &StringRecord) -> Result<Bar, String> {
        let cell = |i: usize| record.get(i).map(str::trim).unwrap_or("");
        let price = |i: usize| {
            cell(i)
                .parse::<f64>()
                .map_err(|e| format!("{} {:?}: {}", self.pair, cell(i), e))
        };

        Ok(Bar {
            pair: self.pair.clone(),
            time: parse_time(cell(self.time))
                .ok_or_else(|| format!("{} bad timestamp: {:?}", self.pair, cell(self.time)))?,
            open: price(self.open)?,
            high: price(self.high)?,
            low: price(self.low)?,
            close: price(self.close)?,
        })
    }
}

enum Layout {
    Long,
    Wide(Vec<WideGroup>),
}

fn detect_layout(headers: &StringRecord) -> Result<Layout, ErrorRepr> {
    let has = |names: &[&str]| headers.iter().any(|h| names.contains(&h));
    if has(&["time", "date"]) && has(&["pair", "symbol"]) {
        for col in ["open", "high", "low", "close"] {
            if !has(&[col]) {
                return Err(ErrorRepr::MissingColumn(col.to_owned()));
            }
        }
        return Ok(Layout::Long);
    }

    let position = |name: String| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(ErrorRepr::MissingColumn(name))
    };
    let mut groups = vec![];
    for suffix in headers.iter().filter_map(|h| h.strip_prefix("date_")) {
        groups.push(WideGroup {
            pair: suffix.to_uppercase(),
            time: position(format!("date_{}", suffix))?,
            open: position(format!("open_{}", suffix))?,
            high: position(format!("high_{}", suffix))?,
            low: position(format!("low_{}", suffix))?,
            close: position(format!("close_{}", suffix))?,
        });
    }

    if groups.is_empty() {
        return Err(ErrorRepr::MissingColumn(
            "time/pair or date_<pair>".to_owned(),
        ));
    }
    Ok(Layout::Wide(groups))
}

fn is_finite(bar: &Bar) -> bool {
    [bar.open, bar.high, bar.low, bar.close]
        .iter()
        .all(|x| x.is_finite())
}

/// Loads price bars from either the long or the wide spreadsheet layout.
/// Rows that fail to parse are skipped with a warning.
pub fn load_bars_from_csv<R: io::Read>(rdr: R) -> Result<Vec<Bar>, ErrorRepr> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(rdr);
    let headers = normalize_headers(rdr.headers()?);
    let layout = detect_layout(&headers)?;
    rdr.set_headers(headers.clone());

    let mut bars = vec![];
    match layout {
        Layout::Long => {
            for (i, row) in rdr.deserialize::<LongRow>().enumerate() {
                match row {
                    Ok(row) => bars.push(Bar::from(row)),
                    Err(err) => warn!("skip price row {}: {}", i + 1, err),
                }
            }
        }
        Layout::Wide(groups) => {
            for (i, record) in rdr.records().enumerate() {
                let record = record?;
                for res in groups.iter().filter_map(|g| g.read(&record)) {
                    match res {
                        Ok(bar) => bars.push(bar),
                        Err(err) => warn!("skip price row {}: {}", i + 1, err),
                    }
                }
            }
        }
    }

    let total = bars.len();
    bars.retain(is_finite);
    if bars.len() < total {
        warn!("dropped {} price rows with non-finite values", total - bars.len());
    }
    Ok(bars)
}
