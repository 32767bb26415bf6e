//! Serializable subset of the plotly.js figure schema and the html page
//! wrapping it.

use serde::{Serialize, Serializer};

use crate::{
    data::{Bar, DateTime, EconomicEvent, Impact, Symbol},
    errors::ErrorRepr,
};

const DARK_BG: &str = "rgb(17,17,17)";
const DARK_FG: &str = "#f2f5fa";
const DARK_GRID: &str = "#283442";

/// plotly date axes take `yyyy-mm-dd HH:MM:SS` strings.
pub fn plotly_time(t: &DateTime) -> String {
    t.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn times<S: Serializer>(xs: &[DateTime], s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(xs.iter().map(plotly_time))
}

#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub data: Vec<Candlestick>,
    pub layout: Layout,
}

#[derive(Debug, Clone, Serialize)]
pub struct Candlestick {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
    #[serde(serialize_with = "times")]
    pub x: Vec<DateTime>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
}

impl Candlestick {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            kind: "candlestick",
            name: name.into(),
            x: vec![],
            open: vec![],
            high: vec![],
            low: vec![],
            close: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Title {
    pub text: String,
}

impl From<&str> for Title {
    fn from(s: &str) -> Self {
        Title { text: s.to_owned() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RangeSlider {
    pub visible: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Axis {
    pub title: Title,
    pub gridcolor: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rangeslider: Option<RangeSlider>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Margin {
    pub l: u32,
    pub r: u32,
    pub t: u32,
    pub b: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Font {
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Line {
    pub dash: &'static str,
    pub width: u32,
    pub color: &'static str,
}

/// A horizontal line spanning the full plot width at `y0 == y1`.
#[derive(Debug, Clone, Serialize)]
pub struct Shape {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub xref: &'static str,
    pub x0: f64,
    pub x1: f64,
    pub yref: &'static str,
    pub y0: f64,
    pub y1: f64,
    pub line: Line,
}

impl Shape {
    pub fn hline(y: f64) -> Self {
        Self {
            kind: "line",
            xref: "paper",
            x0: 0.0,
            x1: 1.0,
            yref: "y",
            y0: y,
            y1: y,
            line: Line {
                dash: "dot",
                width: 1,
                color: DARK_FG,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Coord {
    Paper(f64),
    Time(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct Annotation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xref: Option<&'static str>,
    pub x: Coord,
    pub y: f64,
    pub text: String,
    pub showarrow: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrowhead: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yshift: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xanchor: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yanchor: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bgcolor: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bordercolor: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
}

impl Annotation {
    /// Label for a reference line, pinned to the left or right plot edge.
    pub fn edge_label(text: &str, y: f64, right: bool, above: bool) -> Self {
        Self {
            xref: Some("paper"),
            x: Coord::Paper(if right { 1.0 } else { 0.0 }),
            y,
            text: text.to_owned(),
            showarrow: false,
            arrowhead: None,
            yshift: None,
            xanchor: Some(if right { "right" } else { "left" }),
            yanchor: Some(if above { "bottom" } else { "top" }),
            bgcolor: None,
            bordercolor: None,
            font: Some(Font { color: DARK_FG }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub title: Title,
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub shapes: Vec<Shape>,
    pub annotations: Vec<Annotation>,
    pub margin: Margin,
    pub paper_bgcolor: &'static str,
    pub plot_bgcolor: &'static str,
    pub font: Font,
}

impl Layout {
    /// Dark theme, no range slider.
    pub fn dark(title: &str) -> Self {
        Self {
            title: title.into(),
            xaxis: Axis {
                title: "Time (UTC)".into(),
                gridcolor: DARK_GRID,
                rangeslider: Some(RangeSlider { visible: false }),
            },
            yaxis: Axis {
                title: "Price".into(),
                gridcolor: DARK_GRID,
                rangeslider: None,
            },
            shapes: vec![],
            annotations: vec![],
            margin: Margin {
                l: 50,
                r: 50,
                t: 80,
                b: 50,
            },
            paper_bgcolor: DARK_BG,
            plot_bgcolor: DARK_BG,
            font: Font { color: DARK_FG },
        }
    }
}

/// Weekly reference levels of one pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeeklyLevels {
    pub high: f64,
    pub low: f64,
    pub average: f64,
}

impl WeeklyLevels {
    pub fn from_bars(bars: &[Bar]) -> Option<Self> {
        if bars.is_empty() {
            return None;
        }
        Some(Self {
            high: bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max),
            low: bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min),
            average: bars.iter().map(|b| b.close).sum::<f64>() / bars.len() as f64,
        })
    }
}

/// A built chart: the figure plus the events listed under it.
#[derive(Debug, Clone, Serialize)]
pub struct Chart {
    pub pair: Symbol,
    pub levels: WeeklyLevels,
    pub figure: Figure,
    pub events: Vec<EconomicEvent>,
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn events_table(events: &[EconomicEvent]) -> String {
    if events.is_empty() {
        return "<p>No events in this window.</p>".to_owned();
    }

    let cell = |v: &Option<String>| escape_html(v.as_deref().unwrap_or("—"));
    let rows = events
        .iter()
        .map(|e| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                e.datetime.format("%d %b %Y %H:%M"),
                escape_html(&e.currency),
                if e.impact == Impact::High { "High" } else { "" },
                escape_html(&e.name),
                cell(&e.actual),
                cell(&e.forecast),
                cell(&e.previous),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "<table>
<thead><tr><th>Date &amp; Time (UTC)</th><th>Currency</th><th>Impact</th><th>Event</th><th>Actual</th><th>Forecast</th><th>Previous</th></tr></thead>
<tbody>
{}
</tbody>
</table>",
        rows
    )
}

/// Renders a standalone page: plotly.js, the figure JSON and the events
/// table are all inlined, so the page works offline.
pub fn render_html(chart: &Chart) -> Result<String, ErrorRepr> {
    // "</" would close the script element early
    let figure = serde_json::to_string(&chart.figure)?.replace("</", "<\\/");

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
{plotly_js}
<style>
body {{ background: {bg}; color: {fg}; font-family: sans-serif; margin: 0 2em; }}
table {{ border-collapse: collapse; width: 100%; font-size: 13px; }}
th, td {{ border-bottom: 1px solid {grid}; padding: 4px 8px; text-align: left; }}
</style>
</head>
<body>
<div id="chart" style="height: 80vh;"></div>
<h3>Events</h3>
{events}
<script>
const figure = {figure};
Plotly.newPlot("chart", figure.data, figure.layout, {{ responsive: true }});
</script>
</body>
</html>
"#,
        title = escape_html(&chart.figure.layout.title.text),
        plotly_js = plotly::Plot::offline_js_sources(),
        bg = DARK_BG,
        fg = DARK_FG,
        grid = DARK_GRID,
        events = events_table(&chart.events),
        figure = figure,
    ))
}
