use crate::error::{GrowthError, Result};
use serde::{Deserialize, Serialize};

/// One tabulated day of a WHO LMS table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRow {
    #[serde(alias = "Day")]
    pub day: u32,
    #[serde(rename = "L", alias = "l")]
    pub l: f64,
    #[serde(rename = "M", alias = "m")]
    pub m: f64,
    #[serde(rename = "S", alias = "s")]
    pub s: f64,
}

/// Box-Cox power, median and coefficient of variation for a single age.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LmsParams {
    pub l: f64,
    pub m: f64,
    pub s: f64,
}

impl From<&ReferenceRow> for LmsParams {
    fn from(row: &ReferenceRow) -> Self {
        LmsParams {
            l: row.l,
            m: row.m,
            s: row.s,
        }
    }
}

/// Sex-specific reference table, validated on construction and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTable {
    rows: Vec<ReferenceRow>,
}

impl ReferenceTable {
    /// Rows must be strictly increasing by day with finite L and positive M, S.
    pub fn from_rows(rows: Vec<ReferenceRow>) -> Result<Self> {
        if rows.is_empty() {
            return Err(GrowthError::InvalidReferenceData(
                "reference table has no rows".to_string(),
            ));
        }

        for (index, row) in rows.iter().enumerate() {
            if !row.l.is_finite() || !row.m.is_finite() || !row.s.is_finite() {
                return Err(GrowthError::InvalidReferenceData(format!(
                    "non-finite LMS value on day {}",
                    row.day
                )));
            }
            if row.m <= 0.0 || row.s <= 0.0 {
                return Err(GrowthError::InvalidReferenceData(format!(
                    "non-positive M or S on day {} (M={}, S={})",
                    row.day, row.m, row.s
                )));
            }
            if index > 0 && rows[index - 1].day >= row.day {
                return Err(GrowthError::InvalidReferenceData(format!(
                    "days not strictly increasing at day {}",
                    row.day
                )));
            }
        }

        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[ReferenceRow] {
        &self.rows
    }

    pub fn first_day(&self) -> u32 {
        self.rows[0].day
    }

    pub fn last_day(&self) -> u32 {
        self.rows[self.rows.len() - 1].day
    }
}
