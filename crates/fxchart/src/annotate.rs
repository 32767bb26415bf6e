use std::{fmt, str::FromStr};

use log::{info, warn};

use crate::{
    chart::{
        escape_html, plotly_time, Annotation, Candlestick, Chart, Coord, Figure, Layout, Shape,
        WeeklyLevels,
    },
    data::{Bar, DateTime, EconomicEvent, Impact},
};

pub const HIGH_IMPACT_COLOR: &str = "rgba(255,255,0,0.7)";
pub const NEUTRAL_COLOR: &str = "rgba(200,200,200,0.6)";

/// Which calendar events belong on a pair's chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventCurrency {
    /// Events of one currency, whatever the pair.
    Fixed(String),
    /// Events of the pair's base currency, e.g. `EUR` for `EURUSD`.
    Base,
    /// Events of either side of the pair.
    Either,
}

impl Default for EventCurrency {
    fn default() -> Self {
        EventCurrency::Fixed("USD".to_owned())
    }
}

impl FromStr for EventCurrency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "base" => Ok(EventCurrency::Base),
            "either" => Ok(EventCurrency::Either),
            code if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) => {
                Ok(EventCurrency::Fixed(code.to_uppercase()))
            }
            _ => Err(format!(
                "invalid event currency {:?}: use a 3-letter code, base or either",
                s
            )),
        }
    }
}

impl fmt::Display for EventCurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventCurrency::Fixed(code) => write!(f, "{}", code),
            EventCurrency::Base => write!(f, "base"),
            EventCurrency::Either => write!(f, "either"),
        }
    }
}

impl EventCurrency {
    pub fn matches(&self, pair: &str, currency: &str) -> bool {
        let base = pair.get(..3).unwrap_or(pair);
        let quote = pair.get(3..6).unwrap_or("");
        match self {
            EventCurrency::Fixed(code) => currency.eq_ignore_ascii_case(code),
            EventCurrency::Base => currency.eq_ignore_ascii_case(base),
            EventCurrency::Either => {
                currency.eq_ignore_ascii_case(base) || currency.eq_ignore_ascii_case(quote)
            }
        }
    }
}

/// Index of the bar closest in time to `time`; ties go to the earlier index.
pub fn nearest_bar(bars: &[Bar], time: DateTime) -> Option<usize> {
    bars.iter()
        .enumerate()
        .min_by_key(|(_, b)| (b.time - time).num_milliseconds().unsigned_abs())
        .map(|(i, _)| i)
}

fn event_annotation(bar: &Bar, event: &EconomicEvent) -> Annotation {
    Annotation {
        xref: None,
        x: Coord::Time(plotly_time(&bar.time)),
        y: bar.high,
        text: format!(
            "{}<br>Actual: {}",
            escape_html(&event.name),
            escape_html(event.actual.as_deref().unwrap_or(""))
        ),
        showarrow: true,
        arrowhead: Some(2),
        yshift: Some(30),
        xanchor: None,
        yanchor: None,
        bgcolor: Some(match event.impact {
            Impact::High => HIGH_IMPACT_COLOR,
            Impact::Other => NEUTRAL_COLOR,
        }),
        bordercolor: Some("black"),
        font: None,
    }
}

/// Builds the annotated weekly chart of one pair from its hourly bars.
/// Returns `None` when the pair has no bars.
pub fn build_chart(
    pair: &str,
    bars: &[Bar],
    events: &[EconomicEvent],
    policy: &EventCurrency,
) -> Option<Chart> {
    let Some(levels) = WeeklyLevels::from_bars(bars) else {
        warn!("no data found for {}, skipping", pair);
        return None;
    };
    info!("building chart for {} ({} bars)", pair, bars.len());

    let mut candles = Candlestick::new(format!("{} 1H Candles", pair));
    for b in bars {
        candles.x.push(b.time);
        candles.open.push(b.open);
        candles.high.push(b.high);
        candles.low.push(b.low);
        candles.close.push(b.close);
    }

    let mut layout = Layout::dark(&format!(
        "{} – Last Week Performance (1H Aggregated)",
        pair
    ));
    for (label, y, right, above) in [
        ("Weekly High", levels.high, false, true),
        ("Weekly Low", levels.low, false, false),
        ("Weekly Average", levels.average, true, false),
    ] {
        layout.shapes.push(Shape::hline(y));
        layout
            .annotations
            .push(Annotation::edge_label(label, y, right, above));
    }

    let events = events
        .iter()
        .filter(|e| policy.matches(pair, &e.currency))
        .cloned()
        .collect::<Vec<_>>();
    for event in &events {
        if let Some(i) = nearest_bar(bars, event.datetime) {
            layout.annotations.push(event_annotation(&bars[i], event));
        }
    }

    Some(Chart {
        pair: pair.to_owned(),
        levels,
        figure: Figure {
            data: vec![candles],
            layout,
        },
        events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::{at, get_test_events};
    use chrono::Duration;

    fn hourly(start: &str, closes: &[f64]) -> Vec<Bar> {
        let start = at(start);
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                pair: "EURUSD".into(),
                time: start + Duration::hours(i as i64),
                open: c,
                high: c + 0.5,
                low: c - 0.5,
                close: c,
            })
            .collect()
    }

    fn event(time: &str, currency: &str, impact: &str) -> EconomicEvent {
        EconomicEvent {
            datetime: at(time),
            currency: currency.into(),
            name: "CPI m/m".into(),
            actual: Some("0.4%".into()),
            forecast: None,
            previous: None,
            impact: Impact::from(impact),
        }
    }

    #[test]
    fn test_event_currency_policy() {
        let usd = EventCurrency::default();
        assert!(usd.matches("EURUSD", "USD"));
        assert!(usd.matches("EURUSD", "usd"));
        assert!(!usd.matches("EURUSD", "EUR"));

        assert!(EventCurrency::Base.matches("EURUSD", "EUR"));
        assert!(!EventCurrency::Base.matches("EURUSD", "USD"));

        assert!(EventCurrency::Either.matches("GBPJPY", "GBP"));
        assert!(EventCurrency::Either.matches("GBPJPY", "JPY"));
        assert!(!EventCurrency::Either.matches("GBPJPY", "USD"));
    }

    #[test]
    fn test_event_currency_from_str() {
        assert_eq!("base".parse::<EventCurrency>(), Ok(EventCurrency::Base));
        assert_eq!("Either".parse::<EventCurrency>(), Ok(EventCurrency::Either));
        assert_eq!(
            "jpy".parse::<EventCurrency>(),
            Ok(EventCurrency::Fixed("JPY".into()))
        );
        assert!("dollars".parse::<EventCurrency>().is_err());
        assert_eq!(EventCurrency::Fixed("CHF".into()).to_string(), "CHF");
    }

    #[test]
    fn test_nearest_bar() {
        let bars = hourly("2024-03-04 09:00", &[1.0, 1.0, 1.0]);
        assert_eq!(nearest_bar(&bars, at("2024-03-04 09:10")), Some(0));
        assert_eq!(nearest_bar(&bars, at("2024-03-04 10:40")), Some(2));
        assert_eq!(nearest_bar(&bars, at("2024-03-01 00:00")), Some(0));
        assert_eq!(nearest_bar(&bars, at("2024-03-09 00:00")), Some(2));
        assert_eq!(nearest_bar(&[], at("2024-03-04 09:00")), None);
    }

    #[test]
    fn test_nearest_bar_tie_goes_to_earlier() {
        let bars = hourly("2024-03-04 09:00", &[1.0, 1.0, 1.0]);
        assert_eq!(nearest_bar(&bars, at("2024-03-04 09:30")), Some(0));
        assert_eq!(nearest_bar(&bars, at("2024-03-04 10:30")), Some(1));
    }

    #[test]
    fn test_build_chart() {
        let bars = hourly("2024-03-04 09:00", &[1.08, 1.09, 1.10]);
        let events = vec![
            event("2024-03-04 10:05", "USD", "High"),
            event("2024-03-04 11:00", "EUR", "High"),
            event("2024-03-04 08:00", "usd", "Low"),
        ];

        let chart = build_chart("EURUSD", &bars, &events, &EventCurrency::default()).unwrap();
        assert_eq!(chart.pair, "EURUSD");
        assert_eq!(chart.events.len(), 2);

        let layout = &chart.figure.layout;
        assert_eq!(
            layout.title.text,
            "EURUSD – Last Week Performance (1H Aggregated)"
        );
        assert_eq!(chart.figure.data[0].x.len(), 3);
        assert_eq!(chart.figure.data[0].name, "EURUSD 1H Candles");

        let levels = layout.shapes.iter().map(|s| s.y0).collect::<Vec<_>>();
        assert_eq!(levels, vec![chart.levels.high, chart.levels.low, chart.levels.average]);

        let labels = layout
            .annotations
            .iter()
            .filter(|a| !a.showarrow)
            .map(|a| a.text.as_str())
            .collect::<Vec<_>>();
        assert_eq!(labels, vec!["Weekly High", "Weekly Low", "Weekly Average"]);

        let markers = layout
            .annotations
            .iter()
            .filter(|a| a.showarrow)
            .collect::<Vec<_>>();
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].x, Coord::Time("2024-03-04 10:00:00".into()));
        assert_eq!(markers[0].y, bars[1].high);
        assert_eq!(markers[0].text, "CPI m/m<br>Actual: 0.4%");
        assert_eq!(markers[0].bgcolor, Some(HIGH_IMPACT_COLOR));
        assert_eq!(markers[1].x, Coord::Time("2024-03-04 09:00:00".into()));
        assert_eq!(markers[1].bgcolor, Some(NEUTRAL_COLOR));
    }

    #[test]
    fn test_impact_colors() {
        let bars = hourly("2024-03-04 09:00", &[1.0]);
        let events = vec![
            event("2024-03-04 09:00", "USD", "HIGH"),
            event("2024-03-04 09:00", "USD", "hIgH"),
            event("2024-03-04 09:00", "USD", "Medium"),
            event("2024-03-04 09:00", "USD", ""),
        ];
        let chart = build_chart("EURUSD", &bars, &events, &EventCurrency::default()).unwrap();
        let colors = chart
            .figure
            .layout
            .annotations
            .iter()
            .filter_map(|a| a.bgcolor)
            .collect::<Vec<_>>();
        assert_eq!(
            colors,
            vec![HIGH_IMPACT_COLOR, HIGH_IMPACT_COLOR, NEUTRAL_COLOR, NEUTRAL_COLOR]
        );
    }

    #[test]
    fn test_missing_actual_and_markup() {
        let bars = hourly("2024-03-04 09:00", &[1.0]);
        let mut e = event("2024-03-04 09:00", "USD", "High");
        e.name = "Fed <Chair> Speaks".into();
        e.actual = None;

        let chart = build_chart("EURUSD", &bars, &[e], &EventCurrency::default()).unwrap();
        let marker = chart.figure.layout.annotations.last().unwrap();
        assert_eq!(marker.text, "Fed &lt;Chair&gt; Speaks<br>Actual: ");
    }

    #[test]
    fn test_empty_pair_skipped() {
        let events = get_test_events();
        assert!(build_chart("EURUSD", &[], &events, &EventCurrency::default()).is_none());
    }
}
