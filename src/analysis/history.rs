use crate::analysis::status::is_stunting;
use crate::error::{GrowthError, Result};
use crate::models::history::{HistoryReport, HistorySeries, HistoryStore, HistorySummary, Trend};
use crate::models::measurement::Measurement;

/// Owns the history store; the only path through which measurements are appended.
pub struct HistoryTracker<S: HistoryStore> {
    store: S,
}

impl<S: HistoryStore> HistoryTracker<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn append(&mut self, measurement: &Measurement) -> Result<()> {
        self.store
            .append(measurement)
            .map_err(GrowthError::HistoryWriteFailed)
    }

    pub fn series(&self) -> Result<HistorySeries> {
        self.store
            .read_all()
            .map(HistorySeries::new)
            .map_err(GrowthError::HistoryReadFailed)
    }

    pub fn report(&self) -> Result<HistoryReport> {
        Ok(build_report(self.series()?))
    }
}

/// Direction of the latest Z-score against the one before it. Ties count as `Down`.
pub fn trend(series: &HistorySeries) -> Trend {
    match series.records() {
        [.., prior, latest] => {
            if latest.z_score > prior.z_score {
                Trend::Up
            } else {
                Trend::Down
            }
        }
        _ => Trend::None,
    }
}

pub fn summary(series: &HistorySeries) -> HistorySummary {
    HistorySummary {
        count: series.len(),
        last_z_score: series.last().map(|m| m.z_score),
        stunting_episode_count: series
            .records()
            .iter()
            .filter(|m| is_stunting(m.z_score))
            .count(),
    }
}

pub fn trend_advisory(trend: Trend) -> Option<&'static str> {
    match trend {
        Trend::None => None,
        Trend::Up => Some("Positive trend: Z-score increased since the previous measurement."),
        Trend::Down => Some(
            "Attention: Z-score did not improve since the previous measurement. Monitor the child's nutrition.",
        ),
    }
}

pub fn build_report(series: HistorySeries) -> HistoryReport {
    let trend = trend(&series);
    HistoryReport {
        summary: summary(&series),
        trend,
        trend_advisory: trend_advisory(trend).map(str::to_string),
        records: series,
    }
}
