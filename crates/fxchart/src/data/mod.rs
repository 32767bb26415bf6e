use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use csv::StringRecord;
use serde::{Deserialize, Deserializer, Serialize};

mod events;
mod price;

pub use events::load_events_from_csv;
pub use price::load_bars_from_csv;

pub type DateTime = chrono::DateTime<Utc>;
pub type Symbol = String;

/// One OHLC bar of a currency pair. High/low ordering is not validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub pair: Symbol,
    pub time: DateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Impact {
    High,
    #[default]
    Other,
}

impl From<&str> for Impact {
    fn from(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("high") {
            Impact::High
        } else {
            Impact::Other
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EconomicEvent {
    pub datetime: DateTime,
    pub currency: String,
    pub name: String,
    pub actual: Option<String>,
    pub forecast: Option<String>,
    pub previous: Option<String>,
    pub impact: Impact,
}

impl EconomicEvent {
    pub fn is_high_impact(&self) -> bool {
        self.impact == Impact::High
    }
}

const TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parses the timestamp shapes found in spreadsheet exports. Values without
/// an offset are taken as UTC.
pub fn parse_time(s: &str) -> Option<DateTime> {
    let s = s.trim();
    if let Ok(t) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }

    TIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|t| Utc.from_utc_datetime(&t))
}

fn timefmt<'de, D>(deserializer: D) -> Result<DateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_time(&s).ok_or_else(|| serde::de::Error::custom(format!("bad timestamp: {:?}", s)))
}

/// Header names are matched case-insensitively.
fn normalize_headers(headers: &StringRecord) -> StringRecord {
    headers
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_owned())
}
