use crate::error::{GrowthError, Result};
use crate::models::reference::{LmsParams, ReferenceRow, ReferenceTable};

/// Resolve L, M and S for `age_days`.
///
/// A tabulated day is returned unchanged; otherwise each parameter is blended
/// linearly between the nearest rows below and above.
pub fn resolve_lms(age_days: i64, table: &ReferenceTable) -> Result<LmsParams> {
    let rows = table.rows();
    let day = u32::try_from(age_days).map_err(|_| GrowthError::OutOfRange { age_days })?;

    match rows.binary_search_by_key(&day, |row| row.day) {
        Ok(index) => Ok(LmsParams::from(&rows[index])),
        Err(insert_at) => {
            let lower = insert_at
                .checked_sub(1)
                .and_then(|i| rows.get(i))
                .ok_or(GrowthError::OutOfRange { age_days })?;
            let upper = rows
                .get(insert_at)
                .ok_or(GrowthError::OutOfRange { age_days })?;
            Ok(blend(lower, upper, day))
        }
    }
}

fn blend(lower: &ReferenceRow, upper: &ReferenceRow, day: u32) -> LmsParams {
    let fraction = f64::from(day - lower.day) / f64::from(upper.day - lower.day);
    let lerp = |lo: f64, hi: f64| lo + fraction * (hi - lo);

    LmsParams {
        l: lerp(lower.l, upper.l),
        m: lerp(lower.m, upper.m),
        s: lerp(lower.s, upper.s),
    }
}
