use chrono::Duration;

use crate::{
    data::{Bar, DateTime, EconomicEvent},
    errors::ErrorRepr,
};

/// Trailing window ending at the latest price timestamp.
///
/// Only the lower bound filters: events scheduled after `end` are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime,
    pub end: DateTime,
}

impl Window {
    pub fn trailing(bars: &[Bar], span: Duration) -> Result<Self, ErrorRepr> {
        let end = bars
            .iter()
            .map(|b| b.time)
            .max()
            .ok_or(ErrorRepr::NoPriceData)?;
        Ok(Self {
            start: end - span,
            end,
        })
    }

    pub fn contains(&self, time: DateTime) -> bool {
        time >= self.start
    }

    pub fn bars(&self, bars: Vec<Bar>) -> Vec<Bar> {
        bars.into_iter().filter(|b| self.contains(b.time)).collect()
    }

    pub fn events(&self, events: Vec<EconomicEvent>) -> Vec<EconomicEvent> {
        events
            .into_iter()
            .filter(|e| self.contains(e.datetime))
            .collect()
    }
}
