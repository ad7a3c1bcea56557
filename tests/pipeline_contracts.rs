use chrono::NaiveDate;
use growthlens_lib::commands::assess::run_assessment;
use growthlens_lib::commands::history::get_history;
use growthlens_lib::commands::settings::{get_settings, save_settings};
use growthlens_lib::commands::workspace::open_workspace;
use growthlens_lib::error::GrowthError;
use growthlens_lib::models::history::Trend;
use growthlens_lib::models::measurement::{AssessmentRequest, GrowthStatus};
use growthlens_lib::models::profile::Sex;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

const BOYS_TABLE: &str = "Day,L,M,S,SD2neg,SD2\n\
0,1,49.8842,0.03795,46.1,53.7\n\
365,1,75.7,0.03,71.0,80.5\n\
730,1,87.1,0.0351,81.0,93.2\n\
1856,1,110.0,0.0406,101.1,118.9\n";

fn create_workspace_with_boys_table() -> (TempDir, String) {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let workspace_path = temp_dir.path().to_string_lossy().to_string();

    let data_dir = temp_dir.path().join("data");
    fs::create_dir_all(&data_dir).expect("create data dir");
    fs::write(
        data_dir.join("lhfa-boys-zscore-expanded-tables.csv"),
        BOYS_TABLE,
    )
    .expect("write boys table");

    (temp_dir, workspace_path)
}

fn boy_measured_at_day(days_old: i64, height_cm: f64) -> AssessmentRequest {
    let birth_date = NaiveDate::from_ymd_opt(2022, 1, 22).expect("birth date");
    AssessmentRequest {
        birth_date,
        sex: Sex::Male,
        measured_at: (birth_date + chrono::Duration::days(days_old))
            .and_hms_opt(9, 15, 0)
            .expect("measured at"),
        height_cm,
        subject_name: "Agus".to_string(),
    }
}

#[test]
fn open_workspace_initializes_state_and_reports_metadata() {
    let (tmp, workspace_path) = create_workspace_with_boys_table();

    let meta = open_workspace(&workspace_path).expect("open workspace");

    assert_eq!(meta.path, workspace_path);
    assert_eq!(meta.measurement_count, 0);
    assert!(meta.last_measured_at.is_none());
    assert!(meta.reference_dir.ends_with("data"));
    assert!(tmp.path().join(".growthlens/settings.json").exists());
    assert!(tmp.path().join(".growthlens/history.db").exists());
}

#[test]
fn open_workspace_rejects_missing_directory() {
    let (tmp, _) = create_workspace_with_boys_table();
    let missing = tmp.path().join("nope").to_string_lossy().to_string();

    let err = open_workspace(&missing).expect_err("missing directory");
    assert!(err.to_string().contains("PATH_NOT_FOUND"));
}

#[test]
fn settings_round_trip_and_merge_partial_updates() {
    let (_tmp, workspace_path) = create_workspace_with_boys_table();

    let initial = get_settings(&workspace_path).expect("load settings");
    assert!(initial.get("plausibilityBands").is_some());

    let saved = save_settings(
        &workspace_path,
        json!({
            "recorderKind": "health_worker",
            "profile": { "name": "Agus", "sex": "male", "birthDate": "2022-01-22" }
        }),
    )
    .expect("save settings");

    assert_eq!(saved["recorderKind"], json!("health_worker"));
    assert_eq!(saved["profile"]["name"], json!("Agus"));
    assert_eq!(saved["heightInputMinCm"], initial["heightInputMinCm"]);
    assert_eq!(get_settings(&workspace_path).expect("reload"), saved);
}

#[test]
fn assessments_are_persisted_and_trend_is_tracked() {
    let (_tmp, workspace_path) = create_workspace_with_boys_table();
    open_workspace(&workspace_path).expect("open workspace");

    // Exactly on a tabulated day: LMS must come back untouched.
    let first = run_assessment(&workspace_path, &boy_measured_at_day(730, 80.0))
        .expect("first assessment");
    assert!(first.recorded.is_ok());
    assert_eq!(first.assessment.lms.m, 87.1);
    assert_eq!(first.assessment.measurement.status, GrowthStatus::Stunted);

    let second = run_assessment(&workspace_path, &boy_measured_at_day(800, 86.0))
        .expect("second assessment");
    assert!(second.recorded.is_ok());
    assert!(second.assessment.lms.m > 87.1 && second.assessment.lms.m < 110.0);

    let report = get_history(&workspace_path).expect("history");
    assert_eq!(report.summary.count, 2);
    assert_eq!(report.summary.stunting_episode_count, 1);
    assert_eq!(
        report.summary.last_z_score,
        Some(second.assessment.measurement.z_score)
    );
    assert_eq!(report.trend, Trend::Up);
    assert!(report.trend_advisory.is_some());
    assert_eq!(report.records.records()[0], first.assessment.measurement);

    let meta = open_workspace(&workspace_path).expect("reopen workspace");
    assert_eq!(meta.measurement_count, 2);
    assert_eq!(
        meta.last_measured_at,
        Some(second.assessment.measurement.timestamp)
    );
}

#[test]
fn failed_assessments_leave_history_untouched() {
    let (_tmp, workspace_path) = create_workspace_with_boys_table();
    open_workspace(&workspace_path).expect("open workspace");

    let too_old = run_assessment(&workspace_path, &boy_measured_at_day(1857, 110.0));
    assert!(matches!(too_old, Err(GrowthError::InvalidAge { .. })));

    let implausible = run_assessment(&workspace_path, &boy_measured_at_day(10, 110.0));
    assert!(matches!(implausible, Err(GrowthError::HeightRejected(_))));

    let mut girl = boy_measured_at_day(400, 75.0);
    girl.sex = Sex::Female;
    let no_table = run_assessment(&workspace_path, &girl);
    assert!(matches!(no_table, Err(GrowthError::ReferenceDataUnavailable(_))));

    let report = get_history(&workspace_path).expect("history");
    assert_eq!(report.summary.count, 0);
    assert_eq!(report.trend, Trend::None);
    assert!(report.trend_advisory.is_none());
}

#[test]
fn last_tabulated_day_is_accepted() {
    let (_tmp, workspace_path) = create_workspace_with_boys_table();

    let outcome = run_assessment(&workspace_path, &boy_measured_at_day(1856, 110.0))
        .expect("day 1856 is in range");
    assert_eq!(outcome.assessment.measurement.age_days, 1856);
    assert!(outcome.assessment.measurement.z_score.abs() < 1e-9);
    assert_eq!(outcome.assessment.measurement.status, GrowthStatus::Normal);
}

#[test]
fn configured_table_names_are_honoured() {
    let (tmp, workspace_path) = create_workspace_with_boys_table();
    fs::create_dir_all(tmp.path().join("who")).expect("create who dir");
    fs::write(
        tmp.path().join("who/girls.json"),
        r#"[{"Day":0,"L":1,"M":49.1477,"S":0.0379},{"Day":1856,"L":1,"M":109.4,"S":0.0415}]"#,
    )
    .expect("write girls table");

    save_settings(
        &workspace_path,
        json!({ "referenceDir": "who", "referenceTables": { "female": "girls.json" } }),
    )
    .expect("save settings");

    let mut girl = boy_measured_at_day(1856, 109.4);
    girl.sex = Sex::Female;
    let outcome = run_assessment(&workspace_path, &girl).expect("girls table from settings");
    assert!(outcome.assessment.measurement.z_score.abs() < 1e-9);
}

#[test]
fn history_of_fresh_workspace_is_empty() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let workspace_path = tmp.path().to_string_lossy().to_string();

    let report = get_history(&workspace_path).expect("history of unused workspace");

    assert!(report.records.is_empty());
    assert_eq!(report.summary.count, 0);
    assert_eq!(report.summary.last_z_score, None);
    assert_eq!(report.trend, Trend::None);
    assert!(report.trend_advisory.is_none());
}

#[test]
fn corrupt_settings_file_is_reported_and_left_untouched() {
    let (tmp, workspace_path) = create_workspace_with_boys_table();
    save_settings(
        &workspace_path,
        json!({
            "referenceTables": { "male": "my-boys.csv" },
            "profile": { "name": "Agus", "sex": "male", "birthDate": "2022-01-22" }
        }),
    )
    .expect("save settings");

    let settings_file = tmp.path().join(".growthlens/settings.json");
    let mut corrupted = fs::read(&settings_file).expect("read settings");
    corrupted.push(b',');
    fs::write(&settings_file, &corrupted).expect("corrupt settings");

    let err = get_settings(&workspace_path).expect_err("corrupt settings");
    assert!(matches!(err, GrowthError::Settings(ref msg) if msg.contains("not valid JSON")));

    let update = save_settings(&workspace_path, json!({ "recorderKind": "health_worker" }));
    assert!(matches!(update, Err(GrowthError::Settings(_))));

    let assessed = run_assessment(&workspace_path, &boy_measured_at_day(730, 80.0));
    assert!(matches!(assessed, Err(GrowthError::Settings(_))));

    assert_eq!(fs::read(&settings_file).expect("reread settings"), corrupted);
}
