use std::io;

use log::{debug, warn};
use serde::Deserialize;

use super::{non_empty, normalize_headers, parse_time, EconomicEvent, Impact};
use crate::errors::ErrorRepr;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EventRow {
    date: String,
    time: String,
    #[serde(alias = "date_and_time_")]
    date_and_time: String,
    currency: String,
    event: String,
    actual: String,
    forecast: String,
    previous: String,
    #[serde(alias = "importance")]
    impact: String,
}

impl EventRow {
    /// `None` when the sheet has a time column and this row leaves it blank,
    /// e.g. all-day items. Only `date_and_time` may carry a bare date.
    fn datetime(&self, has_time: bool) -> Option<String> {
        if !self.date_and_time.trim().is_empty() {
            return Some(self.date_and_time.clone());
        }
        match (has_time, self.time.trim()) {
            (true, "") => None,
            (_, time) => Some(format!("{} {}", self.date.trim(), time)),
        }
    }
}

fn is_header(line: &str) -> bool {
    let line = line.to_lowercase();
    line.contains("currency") && line.contains("event")
}

/// Loads calendar events. Metadata lines above the header row are skipped.
/// Events whose date does not parse are dropped.
pub fn load_events_from_csv<R: io::Read>(mut rdr: R) -> Result<Vec<EconomicEvent>, ErrorRepr> {
    let mut text = String::new();
    rdr.read_to_string(&mut text)?;
    let text = text.trim_start_matches('\u{feff}');

    let start = text
        .lines()
        .position(is_header)
        .ok_or_else(|| ErrorRepr::MissingColumn("currency/event".to_owned()))?;
    if start > 0 {
        debug!("skip {} lines above the events header", start);
    }
    let body = text.lines().skip(start).collect::<Vec<_>>().join("\n");

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());
    let headers = normalize_headers(rdr.headers()?);
    let has = |name: &str| headers.iter().any(|h| h == name);
    if !has("date_and_time") && !has("date_and_time_") && !has("date") {
        return Err(ErrorRepr::MissingColumn("date".to_owned()));
    }
    let has_time = has("time");
    rdr.set_headers(headers.clone());

    let mut events = vec![];
    for (i, row) in rdr.deserialize::<EventRow>().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                warn!("skip event row {}: {}", i + 1, err);
                continue;
            }
        };

        let raw = row.datetime(has_time);
        let Some(datetime) = raw.as_deref().and_then(parse_time) else {
            debug!("drop event {:?}: bad date {:?}", row.event, raw);
            continue;
        };
        events.push(EconomicEvent {
            datetime,
            currency: row.currency.trim().to_uppercase(),
            name: row.event.trim().to_owned(),
            impact: Impact::from(row.impact.as_str()),
            actual: non_empty(row.actual),
            forecast: non_empty(row.forecast),
            previous: non_empty(row.previous),
        });
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::at;

    #[test]
    fn test_events_csv() {
        let data = "Date,Time,Currency,Event,Actual,Forecast,Previous,Impact
2024-03-08,13:30,USD,Non-Farm Payrolls,275K,200K,229K,High
2024-03-07,13:15,eur,ECB Rate Decision,4.50%,4.50%,4.50%,high
2024-03-06,15:00,USD,JOLTS Job Openings,,8.9M,8.86M,Medium
soon,,USD,Unscheduled Speech,,,,";
        let events = load_events_from_csv(data.as_bytes()).unwrap();
        assert_eq!(events.len(), 3);

        assert_eq!(
            events[0],
            EconomicEvent {
                datetime: at("2024-03-08 13:30"),
                currency: "USD".into(),
                name: "Non-Farm Payrolls".into(),
                actual: Some("275K".into()),
                forecast: Some("200K".into()),
                previous: Some("229K".into()),
                impact: Impact::High,
            }
        );
        assert_eq!(events[1].currency, "EUR");
        assert!(events[1].is_high_impact());
        assert_eq!(events[2].actual, None);
        assert!(!events[2].is_high_impact());
    }

    #[test]
    fn test_blank_time_dropped() {
        let data = "Date,Time,Currency,Event,Actual,Forecast,Previous,Impact
2024-03-04,,USD,Bank Holiday,,,,Low
2024-03-04,09:40,USD,Fed Chair Speaks,,,,High";
        let events = load_events_from_csv(data.as_bytes()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "Fed Chair Speaks");
        assert_eq!(events[0].datetime, at("2024-03-04 09:40"));
    }

    #[test]
    fn test_bare_date_and_time_kept() {
        let data = "date_and_time,currency,importance,event
2024-03-04,USD,Low,Bank Holiday";
        let events = load_events_from_csv(data.as_bytes()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].datetime, at("2024-03-04 00:00"));
    }

    #[test]
    fn test_dashboard_export() {
        let data = "\u{feff}Economic Calendar
exported from sheet,,,,
date_and_time,currency,importance,event,insights
03/08/2024 13:30:00,USD,High,Non-Farm Payrolls,https://example.com/nfp
03/07/2024 13:15:00,EUR,Low,ECB Press Conference,";
        let events = load_events_from_csv(data.as_bytes()).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].datetime, at("2024-03-08 13:30"));
        assert_eq!(events[0].impact, Impact::High);
        assert_eq!(events[1].impact, Impact::Other);
        assert_eq!(events[1].name, "ECB Press Conference");
    }

    #[test]
    fn test_missing_header() {
        let data = "Date,Time,Headline\n2024-03-08,13:30,Payrolls";
        let err = load_events_from_csv(data.as_bytes()).unwrap_err();
        assert!(matches!(err, ErrorRepr::MissingColumn(_)));

        let data = "Currency,Event\nUSD,Payrolls";
        let err = load_events_from_csv(data.as_bytes()).unwrap_err();
        assert!(matches!(err, ErrorRepr::MissingColumn(ref c) if c == "date"));
    }
}
