use crate::analysis::history::HistoryTracker;
use crate::analysis::{age, interpolation, status, zscore};
use crate::commands::db::SqliteHistory;
use crate::commands::reference::{FileReferenceProvider, ReferenceProvider};
use crate::commands::settings::{load_effective_settings, EffectiveSettings};
use crate::error::{GrowthError, Result};
use crate::models::history::HistoryStore;
use crate::models::measurement::{Assessment, AssessmentRequest, Measurement};

/// A computed assessment and, independently, whether it reached the history store.
#[derive(Debug)]
pub struct AssessmentOutcome {
    pub assessment: Assessment,
    pub recorded: Result<()>,
}

/// Assess against the workspace's settings, reference tables and history database.
pub fn run_assessment(workspace_path: &str, request: &AssessmentRequest) -> Result<AssessmentOutcome> {
    let settings = load_effective_settings(workspace_path)?;
    let provider = FileReferenceProvider::new(
        settings.reference_dir.clone(),
        settings.reference_tables.clone(),
    );

    match SqliteHistory::open(workspace_path) {
        Ok(store) => {
            run_assessment_internal(request, &settings, &provider, &mut HistoryTracker::new(store))
        }
        Err(reason) => {
            let assessment = evaluate(request, &settings, &provider)?;
            log::warn!("assessment computed but history is unavailable: {reason}");
            Ok(AssessmentOutcome {
                assessment,
                recorded: Err(GrowthError::HistoryWriteFailed(reason)),
            })
        }
    }
}

/// Full pipeline: input bounds, age, plausibility, LMS lookup, Z-score,
/// classification, then the history append. Every rejection happens before
/// anything is written.
pub fn run_assessment_internal<P, S>(
    request: &AssessmentRequest,
    settings: &EffectiveSettings,
    provider: &P,
    tracker: &mut HistoryTracker<S>,
) -> Result<AssessmentOutcome>
where
    P: ReferenceProvider,
    S: HistoryStore,
{
    let assessment = evaluate(request, settings, provider)?;

    let recorded = tracker.append(&assessment.measurement);
    if let Err(err) = &recorded {
        log::warn!("assessment computed but not recorded: {err}");
    }

    Ok(AssessmentOutcome {
        assessment,
        recorded,
    })
}

/// Run every stage up to (not including) the history append.
pub fn evaluate<P: ReferenceProvider>(
    request: &AssessmentRequest,
    settings: &EffectiveSettings,
    provider: &P,
) -> Result<Assessment> {
    settings.input_envelope.check(request.height_cm)?;

    let (age_days, age_months) = age::compute_age(request.birth_date, request.measured_at)?;
    log::debug!("age {age_days} days ({age_months:.2} months)");

    settings.plausibility.validate(request.height_cm, age_months)?;

    let table = provider.load_table(request.sex)?;
    let lms = interpolation::resolve_lms(age_days, &table)?;
    let z_score = zscore::compute_z_score(request.height_cm, lms)?;
    let (growth_status, message) = status::classify(z_score);

    log::info!(
        "{}: {} cm at {age_days} days -> z={z_score:.2} ({growth_status})",
        request.subject_name,
        request.height_cm
    );

    Ok(Assessment {
        measurement: Measurement {
            timestamp: request.measured_at,
            sex: request.sex,
            age_days,
            age_months,
            height_cm: request.height_cm,
            z_score,
            status: growth_status,
            subject_name: request.subject_name.clone(),
            recorder_kind: settings.recorder_kind.clone(),
        },
        message: message.to_string(),
        lms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::reference::InMemoryReferenceProvider;
    use crate::models::history::MemoryHistory;
    use crate::models::measurement::GrowthStatus;
    use crate::models::profile::Sex;
    use crate::models::reference::{ReferenceRow, ReferenceTable};
    use chrono::NaiveDate;

    fn flat_table(m: f64) -> ReferenceTable {
        ReferenceTable::from_rows(vec![
            ReferenceRow { day: 0, l: 1.0, m, s: 0.04 },
            ReferenceRow { day: 1856, l: 1.0, m, s: 0.04 },
        ])
        .expect("table")
    }

    fn request(height_cm: f64, days_old: i64) -> AssessmentRequest {
        let birth_date = NaiveDate::from_ymd_opt(2022, 1, 22).expect("date");
        AssessmentRequest {
            birth_date,
            sex: Sex::Male,
            measured_at: (birth_date + chrono::Duration::days(days_old))
                .and_hms_opt(10, 0, 0)
                .expect("time"),
            height_cm,
            subject_name: "Agus".to_string(),
        }
    }

    struct BrokenStore;

    impl HistoryStore for BrokenStore {
        fn append(&mut self, _: &Measurement) -> std::result::Result<(), String> {
            Err("read-only volume".to_string())
        }

        fn read_all(&self) -> std::result::Result<Vec<Measurement>, String> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn worked_example_is_normal_and_recorded() {
        let provider = InMemoryReferenceProvider::default().with_table(Sex::Male, flat_table(85.0));
        let mut tracker = HistoryTracker::new(MemoryHistory::default());

        let outcome = run_assessment_internal(
            &request(80.0, 900),
            &EffectiveSettings::default(),
            &provider,
            &mut tracker,
        )
        .expect("assessment");

        let measurement = &outcome.assessment.measurement;
        assert!((measurement.z_score - (-1.470588)).abs() < 1e-5);
        assert_eq!(measurement.status, GrowthStatus::Normal);
        assert_eq!(measurement.age_days, 900);
        assert_eq!(measurement.recorder_kind, "caregiver");
        assert!(outcome.recorded.is_ok());
        assert_eq!(tracker.series().expect("series").len(), 1);
    }

    #[test]
    fn rejections_never_touch_history() {
        let provider = InMemoryReferenceProvider::default().with_table(Sex::Male, flat_table(85.0));
        let mut tracker = HistoryTracker::new(MemoryHistory::default());
        let settings = EffectiveSettings::default();

        let too_old = run_assessment_internal(&request(100.0, 1857), &settings, &provider, &mut tracker);
        assert!(matches!(too_old, Err(GrowthError::InvalidAge { age_days: 1857, .. })));

        let implausible = run_assessment_internal(&request(120.0, 30), &settings, &provider, &mut tracker);
        assert!(matches!(implausible, Err(GrowthError::HeightRejected(_))));

        let off_form = run_assessment_internal(&request(20.0, 30), &settings, &provider, &mut tracker);
        assert!(matches!(off_form, Err(GrowthError::HeightRejected(_))));

        assert!(tracker.series().expect("series").is_empty());
    }

    #[test]
    fn missing_table_is_not_replaced_by_other_sex() {
        let provider = InMemoryReferenceProvider::default().with_table(Sex::Male, flat_table(85.0));
        let mut tracker = HistoryTracker::new(MemoryHistory::default());
        let mut girl = request(80.0, 900);
        girl.sex = Sex::Female;

        let err = run_assessment_internal(&girl, &EffectiveSettings::default(), &provider, &mut tracker)
            .expect_err("no female table");
        assert!(matches!(err, GrowthError::ReferenceDataUnavailable(_)));
    }

    #[test]
    fn write_failure_is_reported_alongside_result() {
        let provider = InMemoryReferenceProvider::default().with_table(Sex::Male, flat_table(85.0));
        let mut tracker = HistoryTracker::new(BrokenStore);

        let outcome = run_assessment_internal(
            &request(80.0, 900),
            &EffectiveSettings::default(),
            &provider,
            &mut tracker,
        )
        .expect("computed despite write failure");

        assert_eq!(outcome.assessment.measurement.status, GrowthStatus::Normal);
        assert_eq!(
            outcome.recorded,
            Err(GrowthError::HistoryWriteFailed("read-only volume".to_string()))
        );
    }

    #[test]
    fn short_table_surfaces_out_of_range() {
        let short = ReferenceTable::from_rows(vec![
            ReferenceRow { day: 0, l: 1.0, m: 50.0, s: 0.04 },
            ReferenceRow { day: 100, l: 1.0, m: 60.0, s: 0.04 },
        ])
        .expect("table");
        let provider = InMemoryReferenceProvider::default().with_table(Sex::Male, short);

        let err = evaluate(&request(80.0, 900), &EffectiveSettings::default(), &provider)
            .expect_err("table ends at day 100");
        assert_eq!(err, GrowthError::OutOfRange { age_days: 900 });
    }
}
