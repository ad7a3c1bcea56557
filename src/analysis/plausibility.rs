use crate::error::{GrowthError, Result};
use serde::{Deserialize, Serialize};

/// Heights accepted for children up to `max_age_months`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlausibilityBand {
    pub max_age_months: f64,
    pub min_cm: f64,
    pub max_cm: f64,
}

/// Coarse physiological sanity bands, deliberately wider than WHO +/-6 SD.
/// Needs confirmation from a paediatric reviewer before clinical use.
pub fn default_bands() -> Vec<PlausibilityBand> {
    vec![
        PlausibilityBand { max_age_months: 3.0, min_cm: 35.0, max_cm: 72.0 },
        PlausibilityBand { max_age_months: 6.0, min_cm: 45.0, max_cm: 80.0 },
        PlausibilityBand { max_age_months: 12.0, min_cm: 50.0, max_cm: 90.0 },
        PlausibilityBand { max_age_months: 24.0, min_cm: 55.0, max_cm: 105.0 },
        PlausibilityBand { max_age_months: 36.0, min_cm: 62.0, max_cm: 115.0 },
        PlausibilityBand { max_age_months: 48.0, min_cm: 68.0, max_cm: 125.0 },
        PlausibilityBand { max_age_months: 61.0, min_cm: 72.0, max_cm: 135.0 },
    ]
}

/// Age-conditioned height envelope. Bands are ordered by `max_age_months`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlausibilityPolicy {
    bands: Vec<PlausibilityBand>,
}

impl Default for PlausibilityPolicy {
    fn default() -> Self {
        Self {
            bands: default_bands(),
        }
    }
}

impl PlausibilityPolicy {
    pub fn new(mut bands: Vec<PlausibilityBand>) -> Self {
        bands.sort_by(|a, b| a.max_age_months.total_cmp(&b.max_age_months));
        Self { bands }
    }

    pub fn bands(&self) -> &[PlausibilityBand] {
        &self.bands
    }

    pub fn band_for(&self, age_months: f64) -> Option<&PlausibilityBand> {
        self.bands.iter().find(|band| age_months <= band.max_age_months)
    }

    pub fn validate(&self, height_cm: f64, age_months: f64) -> Result<()> {
        let band = self.band_for(age_months).ok_or_else(|| {
            GrowthError::HeightRejected(format!(
                "no plausibility band covers age {age_months:.1} months"
            ))
        })?;

        if height_cm < band.min_cm || height_cm > band.max_cm {
            return Err(GrowthError::HeightRejected(format!(
                "{height_cm} cm is implausible at {age_months:.1} months (expected {}-{} cm)",
                band.min_cm, band.max_cm
            )));
        }

        Ok(())
    }
}

/// Fixed input bounds enforced by the entry boundary before the pipeline runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightEnvelope {
    pub min_cm: f64,
    pub max_cm: f64,
}

impl Default for HeightEnvelope {
    fn default() -> Self {
        Self {
            min_cm: 30.0,
            max_cm: 150.0,
        }
    }
}

impl HeightEnvelope {
    pub fn check(&self, height_cm: f64) -> Result<()> {
        if !height_cm.is_finite() || height_cm < self.min_cm || height_cm > self.max_cm {
            return Err(GrowthError::HeightRejected(format!(
                "height must be between {} and {} cm (got {height_cm})",
                self.min_cm, self.max_cm
            )));
        }
        Ok(())
    }
}
