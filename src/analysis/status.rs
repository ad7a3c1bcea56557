use crate::models::measurement::GrowthStatus;

pub const SEVERE_THRESHOLD: f64 = -3.0;
pub const STUNTED_THRESHOLD: f64 = -2.0;
pub const TALL_THRESHOLD: f64 = 2.0;

/// Map a height-for-age Z-score to a status and advisory.
///
/// | z            | status  |
/// |--------------|---------|
/// | < -3         | SEVERE  |
/// | [-3, -2)     | STUNTED |
/// | [-2, 2]      | NORMAL  |
/// | > 2          | TALL    |
pub fn classify(z_score: f64) -> (GrowthStatus, &'static str) {
    let status = if z_score < SEVERE_THRESHOLD {
        GrowthStatus::Severe
    } else if z_score < STUNTED_THRESHOLD {
        GrowthStatus::Stunted
    } else if z_score <= TALL_THRESHOLD {
        GrowthStatus::Normal
    } else {
        GrowthStatus::Tall
    };

    (status, advisory(status))
}

pub fn advisory(status: GrowthStatus) -> &'static str {
    match status {
        GrowthStatus::Severe => {
            "Severely stunted. Seek immediate medical intervention from a health professional."
        }
        GrowthStatus::Stunted => {
            "Stunted. Nutrition intervention is needed; consult a health worker about the child's diet."
        }
        GrowthStatus::Normal => {
            "Growth is within the normal range. Continue balanced nutrition and routine monitoring."
        }
        GrowthStatus::Tall => {
            "Height is above the normal range. Keep monitoring growth at regular check-ups."
        }
    }
}

/// True for measurements that count as a stunting episode (stunted or severe).
pub fn is_stunting(z_score: f64) -> bool {
    z_score < STUNTED_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn boundaries_close_on_the_documented_side() {
        assert_eq!(classify(-3.0).0, GrowthStatus::Stunted);
        assert_eq!(classify(-3.0000001).0, GrowthStatus::Severe);
        assert_eq!(classify(-2.0).0, GrowthStatus::Normal);
        assert_eq!(classify(-2.0000001).0, GrowthStatus::Stunted);
        assert_eq!(classify(2.0).0, GrowthStatus::Normal);
        assert_eq!(classify(2.0000001).0, GrowthStatus::Tall);
    }

    #[test]
    fn worked_examples() {
        assert_eq!(classify(-1.47).0, GrowthStatus::Normal);
        assert_eq!(classify(-3.878).0, GrowthStatus::Severe);
    }

    #[test]
    fn each_status_has_its_own_advisory() {
        let (_, severe) = classify(-4.0);
        let (_, normal) = classify(0.0);
        assert!(severe.contains("immediate"));
        assert_ne!(severe, normal);
    }

    proptest! {
        #[test]
        fn bands_partition_the_real_line(z in -1.0e6f64..1.0e6) {
            let (status, _) = classify(z);
            let hits = [
                z < -3.0,
                (-3.0..-2.0).contains(&z),
                (-2.0..=2.0).contains(&z),
                z > 2.0,
            ];
            prop_assert_eq!(hits.iter().filter(|hit| **hit).count(), 1);
            let expected = match hits.iter().position(|hit| *hit) {
                Some(0) => GrowthStatus::Severe,
                Some(1) => GrowthStatus::Stunted,
                Some(2) => GrowthStatus::Normal,
                _ => GrowthStatus::Tall,
            };
            prop_assert_eq!(status, expected);
        }
    }
}
