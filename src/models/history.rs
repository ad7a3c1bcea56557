use crate::models::measurement::Measurement;
use serde::{Deserialize, Serialize};

/// Append-only persistence for measurements. Insertion order is temporal order.
pub trait HistoryStore {
    fn append(&mut self, measurement: &Measurement) -> Result<(), String>;
    fn read_all(&self) -> Result<Vec<Measurement>, String>;
}

/// Session-scoped store; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    records: Vec<Measurement>,
}

impl HistoryStore for MemoryHistory {
    fn append(&mut self, measurement: &Measurement) -> Result<(), String> {
        self.records.push(measurement.clone());
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<Measurement>, String> {
        Ok(self.records.clone())
    }
}

/// Measurements in insertion order, oldest first. Never re-sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistorySeries {
    records: Vec<Measurement>,
}

impl HistorySeries {
    pub fn new(records: Vec<Measurement>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Measurement] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&Measurement> {
        self.records.last()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Trend {
    None,
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub count: usize,
    pub last_z_score: Option<f64>,
    pub stunting_episode_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryReport {
    pub records: HistorySeries,
    pub summary: HistorySummary,
    pub trend: Trend,
    pub trend_advisory: Option<String>,
}
