use crate::analysis::plausibility::{default_bands, HeightEnvelope, PlausibilityBand, PlausibilityPolicy};
use crate::error::{GrowthError, Result};
use crate::models::profile::{Sex, SubjectProfile};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const SETTINGS_SCHEMA_VERSION: i64 = 2;

#[derive(Debug, Clone)]
pub struct EffectiveSettings {
    pub reference_dir: PathBuf,
    pub reference_tables: HashMap<Sex, String>,
    pub input_envelope: HeightEnvelope,
    pub plausibility: PlausibilityPolicy,
    pub recorder_kind: String,
    pub profile: Option<SubjectProfile>,
}

impl Default for EffectiveSettings {
    fn default() -> Self {
        Self::from_value(Path::new("."), &default_settings())
    }
}

impl EffectiveSettings {
    /// Build from an already migrated and sanitized settings document.
    pub fn from_value(workspace: &Path, settings: &Value) -> Self {
        let reference_dir = settings
            .get("referenceDir")
            .and_then(Value::as_str)
            .unwrap_or("data");

        let mut reference_tables = HashMap::new();
        for sex in [Sex::Male, Sex::Female] {
            if let Some(name) = settings["referenceTables"].get(sex.as_str()).and_then(Value::as_str) {
                reference_tables.insert(sex, name.to_string());
            }
        }

        let defaults = HeightEnvelope::default();
        let input_envelope = HeightEnvelope {
            min_cm: settings
                .get("heightInputMinCm")
                .and_then(Value::as_f64)
                .unwrap_or(defaults.min_cm),
            max_cm: settings
                .get("heightInputMaxCm")
                .and_then(Value::as_f64)
                .unwrap_or(defaults.max_cm),
        };

        let bands = settings
            .get("plausibilityBands")
            .cloned()
            .and_then(|v| serde_json::from_value::<Vec<PlausibilityBand>>(v).ok())
            .filter(|bands| !bands.is_empty())
            .unwrap_or_else(default_bands);

        Self {
            reference_dir: workspace.join(reference_dir),
            reference_tables,
            input_envelope,
            plausibility: PlausibilityPolicy::new(bands),
            recorder_kind: settings
                .get("recorderKind")
                .and_then(Value::as_str)
                .unwrap_or("caregiver")
                .to_string(),
            profile: settings
                .get("profile")
                .cloned()
                .and_then(|v| serde_json::from_value::<SubjectProfile>(v).ok()),
        }
    }
}

pub fn get_settings(workspace_path: &str) -> Result<Value> {
    load_settings_from_disk(workspace_path)
}

pub fn save_settings(workspace_path: &str, settings: Value) -> Result<Value> {
    save_settings_to_disk(workspace_path, settings)
}

pub fn load_effective_settings(workspace_path: &str) -> Result<EffectiveSettings> {
    let settings = load_settings_from_disk(workspace_path)?;
    Ok(EffectiveSettings::from_value(Path::new(workspace_path), &settings))
}

pub fn load_settings_from_disk(workspace_path: &str) -> Result<Value> {
    let path = settings_path(workspace_path);
    ensure_state_dir(workspace_path)?;

    let original = if path.exists() {
        let raw = fs::read_to_string(&path)
            .map_err(|e| GrowthError::Settings(format!("Failed to read settings.json: {e}")))?;
        serde_json::from_str::<Value>(&raw)
            .map_err(|e| GrowthError::Settings(format!("settings.json is not valid JSON: {e}")))?
    } else {
        json!({})
    };

    let migrated = migrate_settings(original.clone());
    if migrated != original || !path.exists() {
        write_settings_file(&path, &migrated)?;
    }

    Ok(migrated)
}

pub fn save_settings_to_disk(workspace_path: &str, settings: Value) -> Result<Value> {
    let path = settings_path(workspace_path);
    ensure_state_dir(workspace_path)?;

    let mut merged = load_settings_from_disk(workspace_path)?;
    merge_settings(&mut merged, &settings);

    let migrated = migrate_settings(merged);
    write_settings_file(&path, &migrated)?;
    Ok(migrated)
}

fn settings_path(workspace_path: &str) -> PathBuf {
    crate::commands::db::state_dir(workspace_path).join("settings.json")
}

fn ensure_state_dir(workspace_path: &str) -> Result<()> {
    fs::create_dir_all(crate::commands::db::state_dir(workspace_path))
        .map_err(|e| GrowthError::Settings(format!("Failed to create .growthlens directory: {e}")))
}

fn write_settings_file(path: &Path, settings: &Value) -> Result<()> {
    let raw = serde_json::to_string_pretty(settings)
        .map_err(|e| GrowthError::Settings(format!("Failed to serialize settings: {e}")))?;
    fs::write(path, raw)
        .map_err(|e| GrowthError::Settings(format!("Failed to write settings.json: {e}")))
}

fn migrate_settings(input: Value) -> Value {
    let mut out = match input {
        Value::Object(map) => Value::Object(map),
        _ => Value::Object(Map::new()),
    };

    let version = out
        .get("schema_version")
        .and_then(Value::as_i64)
        .unwrap_or(0);

    if version < 1 {
        // Pre-v1 documents kept a single {min, max} object for the form bounds.
        migrate_height_range(&mut out);
    }

    if version < 2 {
        // V2 reads CSV/JSON exports instead of the WHO .xlsx workbooks.
        migrate_workbook_names(&mut out);
    }

    deep_merge_defaults(&mut out, &default_settings());
    sanitize_settings(&mut out);
    if let Some(obj) = out.as_object_mut() {
        obj.insert("schema_version".to_string(), json!(SETTINGS_SCHEMA_VERSION));
    }

    if version < SETTINGS_SCHEMA_VERSION {
        log::info!("migrated settings from schema {version} to {SETTINGS_SCHEMA_VERSION}");
    }

    out
}

fn default_settings() -> Value {
    json!({
        "schema_version": SETTINGS_SCHEMA_VERSION,
        "referenceDir": "data",
        "referenceTables": {
            "male": "lhfa-boys-zscore-expanded-tables.csv",
            "female": "lhfa-girls-zscore-expanded-tables.csv"
        },
        "heightInputMinCm": 30.0,
        "heightInputMaxCm": 150.0,
        "plausibilityBands": default_bands(),
        "recorderKind": "caregiver"
    })
}

fn deep_merge_defaults(target: &mut Value, defaults: &Value) {
    let (Some(target_obj), Some(default_obj)) = (target.as_object_mut(), defaults.as_object()) else {
        return;
    };

    for (key, default_value) in default_obj {
        match target_obj.get_mut(key) {
            Some(existing) => {
                if existing.is_object() && default_value.is_object() {
                    deep_merge_defaults(existing, default_value);
                }
            }
            None => {
                target_obj.insert(key.clone(), default_value.clone());
            }
        }
    }
}

fn merge_settings(target: &mut Value, incoming: &Value) {
    match (target, incoming) {
        (Value::Object(target_obj), Value::Object(incoming_obj)) => {
            for (key, value) in incoming_obj {
                if let Some(existing) = target_obj.get_mut(key) {
                    merge_settings(existing, value);
                } else {
                    target_obj.insert(key.clone(), value.clone());
                }
            }
        }
        (target_slot, incoming_value) => {
            *target_slot = incoming_value.clone();
        }
    }
}

fn migrate_height_range(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };
    let Some(range) = obj.remove("heightRange") else {
        return;
    };

    if let Some(min) = range.get("min").and_then(Value::as_f64) {
        obj.entry("heightInputMinCm").or_insert(json!(min));
    }
    if let Some(max) = range.get("max").and_then(Value::as_f64) {
        obj.entry("heightInputMaxCm").or_insert(json!(max));
    }
}

fn migrate_workbook_names(settings: &mut Value) {
    let Some(tables) = settings.get_mut("referenceTables").and_then(Value::as_object_mut) else {
        return;
    };

    for value in tables.values_mut() {
        if let Some(name) = value.as_str() {
            if let Some(stem) = name.strip_suffix(".xlsx") {
                *value = json!(format!("{stem}.csv"));
            }
        }
    }
}

fn sanitize_settings(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };

    ensure_string(obj, "referenceDir", "data");
    ensure_string(obj, "recorderKind", "caregiver");

    // Clamp the form bounds, keeping min below max.
    clamp_f64(obj, "heightInputMinCm", 10.0, 60.0, 30.0);
    clamp_f64(obj, "heightInputMaxCm", 100.0, 250.0, 150.0);

    sanitize_reference_tables(obj);
    sanitize_bands(obj);
    sanitize_profile(obj);
}

fn sanitize_reference_tables(obj: &mut Map<String, Value>) {
    let defaults = default_settings();
    let tables = obj
        .entry("referenceTables".to_string())
        .or_insert_with(|| json!({}));

    if !tables.is_object() {
        *tables = defaults["referenceTables"].clone();
        return;
    }

    if let Some(table_obj) = tables.as_object_mut() {
        for sex in [Sex::Male, Sex::Female] {
            let valid = table_obj
                .get(sex.as_str())
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string);
            let name = valid.unwrap_or_else(|| {
                defaults["referenceTables"][sex.as_str()]
                    .as_str()
                    .unwrap_or_default()
                    .to_string()
            });
            table_obj.insert(sex.as_str().to_string(), json!(name));
        }
    }
}

fn sanitize_bands(obj: &mut Map<String, Value>) {
    let parsed = obj
        .get("plausibilityBands")
        .cloned()
        .and_then(|v| serde_json::from_value::<Vec<PlausibilityBand>>(v).ok())
        .map(|bands| {
            bands
                .into_iter()
                .filter(|b| {
                    b.max_age_months.is_finite()
                        && b.max_age_months > 0.0
                        && b.min_cm.is_finite()
                        && b.max_cm.is_finite()
                        && b.min_cm < b.max_cm
                })
                .collect::<Vec<_>>()
        })
        .filter(|bands| !bands.is_empty());

    let bands = match parsed {
        Some(bands) => PlausibilityPolicy::new(bands).bands().to_vec(),
        None => default_bands(),
    };
    obj.insert("plausibilityBands".to_string(), json!(bands));
}

fn sanitize_profile(obj: &mut Map<String, Value>) {
    let Some(profile) = obj.get("profile") else {
        return;
    };
    if profile.is_null() {
        return;
    }
    if serde_json::from_value::<SubjectProfile>(profile.clone()).is_err() {
        log::warn!("dropping malformed profile from settings");
        obj.remove("profile");
    }
}

fn clamp_f64(map: &mut Map<String, Value>, key: &str, min: f64, max: f64, default: f64) {
    let raw = map
        .get(key)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
        .unwrap_or(default);
    map.insert(key.to_string(), json!(raw.clamp(min, max)));
}

fn ensure_string(map: &mut Map<String, Value>, key: &str, default: &str) {
    let value = map
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string();
    map.insert(key.to_string(), json!(value));
}
