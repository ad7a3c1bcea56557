use crate::error::{GrowthError, Result};
use crate::models::reference::LmsParams;

/// WHO LMS transform of a height against the reference distribution for one age.
///
/// `Z = ((height / M)^L - 1) / (L * S)`, or `ln(height / M) / S` when `L == 0`.
pub fn compute_z_score(height_cm: f64, lms: LmsParams) -> Result<f64> {
    let LmsParams { l, m, s } = lms;

    if !(m.is_finite() && m > 0.0) || !(s.is_finite() && s > 0.0) || !l.is_finite() {
        return Err(GrowthError::InvalidReferenceData(format!(
            "LMS parameters out of domain (L={l}, M={m}, S={s})"
        )));
    }
    if !(height_cm.is_finite() && height_cm > 0.0) {
        return Err(GrowthError::HeightRejected(format!(
            "height must be a positive number (got {height_cm})"
        )));
    }

    let ratio = height_cm / m;
    let z = if l == 0.0 {
        ratio.ln() / s
    } else {
        (ratio.powf(l) - 1.0) / (l * s)
    };

    Ok(z)
}
