use crate::models::profile::Sex;
use crate::models::reference::LmsParams;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GrowthStatus {
    Severe,
    Stunted,
    Normal,
    Tall,
}

impl GrowthStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GrowthStatus::Severe => "SEVERE",
            GrowthStatus::Stunted => "STUNTED",
            GrowthStatus::Normal => "NORMAL",
            GrowthStatus::Tall => "TALL",
        }
    }
}

impl fmt::Display for GrowthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GrowthStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SEVERE" => Ok(GrowthStatus::Severe),
            "STUNTED" => Ok(GrowthStatus::Stunted),
            "NORMAL" => Ok(GrowthStatus::Normal),
            "TALL" => Ok(GrowthStatus::Tall),
            other => Err(format!("Unknown growth status: {other}")),
        }
    }
}

/// What the presentation boundary hands to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRequest {
    pub birth_date: NaiveDate,
    pub sex: Sex,
    pub measured_at: NaiveDateTime,
    pub height_cm: f64,
    pub subject_name: String,
}

/// One successful evaluation. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub timestamp: NaiveDateTime,
    pub sex: Sex,
    pub age_days: i64,
    pub age_months: f64,
    pub height_cm: f64,
    pub z_score: f64,
    pub status: GrowthStatus,
    pub subject_name: String,
    pub recorder_kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub measurement: Measurement,
    pub message: String,
    pub lms: LmsParams,
}
