use crate::error::{GrowthError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Oldest age covered by the WHO length/height-for-age tables.
pub const MAX_REFERENCE_AGE_DAYS: i64 = 1856;

/// Average Gregorian month length in days.
pub const DAYS_PER_MONTH: f64 = 30.4375;

/// Derive (age in whole days, age in average months) at measurement time.
/// The birth date counts from midnight.
pub fn compute_age(birth_date: NaiveDate, measured_at: NaiveDateTime) -> Result<(i64, f64)> {
    let born_at = birth_date.and_time(NaiveTime::MIN);
    let age_days = measured_at.signed_duration_since(born_at).num_days();

    if age_days <= 0 {
        return Err(GrowthError::InvalidAge {
            age_days,
            reason: "measurement must be taken after the birth date".to_string(),
        });
    }
    if age_days > MAX_REFERENCE_AGE_DAYS {
        return Err(GrowthError::InvalidAge {
            age_days,
            reason: format!(
                "exceeds the WHO reference range of {MAX_REFERENCE_AGE_DAYS} days (children 0-5 years)"
            ),
        });
    }

    Ok((age_days, age_in_months(age_days)))
}

pub fn age_in_months(age_days: i64) -> f64 {
    age_days as f64 / DAYS_PER_MONTH
}
