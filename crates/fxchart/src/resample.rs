use chrono::{Duration, DurationRound};
use itertools::Itertools;

use crate::{
    data::{Bar, DateTime},
    errors::ErrorRepr,
};

/// Aggregates bars into fixed wall-clock buckets of `period`, per pair.
///
/// Input may be unsorted and hold several pairs; rows with equal timestamps
/// keep their feed order. Each non-empty bucket yields one bar stamped at
/// the bucket start with first open, max high, min low and last close. Empty
/// buckets produce nothing. Output is ordered by pair, then time.
pub fn resample(bars: &[Bar], period: Duration) -> Result<Vec<Bar>, ErrorRepr> {
    let mut sorted: Vec<&Bar> = bars.iter().collect();
    sorted.sort_by(|a, b| a.pair.cmp(&b.pair).then(a.time.cmp(&b.time)));

    let keyed = sorted
        .into_iter()
        .map(|b| Ok((bucket_start(b.time, period)?, b)))
        .collect::<Result<Vec<_>, ErrorRepr>>()?;

    let mut out = vec![];
    for ((pair, start), group) in &keyed.iter().group_by(|(start, b)| (b.pair.clone(), *start)) {
        let rows = group.map(|(_, b)| *b).collect::<Vec<_>>();
        let (first, last) = match (rows.first(), rows.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => continue,
        };
        out.push(Bar {
            pair,
            time: start,
            open: first.open,
            high: rows.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max),
            low: rows.iter().map(|b| b.low).fold(f64::INFINITY, f64::min),
            close: last.close,
        });
    }
    Ok(out)
}

pub fn resample_hourly(bars: &[Bar]) -> Result<Vec<Bar>, ErrorRepr> {
    resample(bars, Duration::hours(1))
}

fn bucket_start(time: DateTime, period: Duration) -> Result<DateTime, ErrorRepr> {
    time.duration_trunc(period)
        .map_err(|e| ErrorRepr::InvalidPeriod(format!("{}: {}", period, e)))
}
