use crate::models::history::HistoryStore;
use crate::models::measurement::Measurement;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Result};
use std::path::Path;

const DB_SCHEMA_VERSION: i64 = 2;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;

    let mut version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version < 1 {
        apply_migration_1(conn)?;
        version = 1;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version < 2 {
        apply_migration_2(conn)?;
        version = 2;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version > DB_SCHEMA_VERSION {
        log::warn!("history database is at schema {version}, newer than {DB_SCHEMA_VERSION}");
    }

    Ok(())
}

fn apply_migration_1(conn: &Connection) -> Result<()> {
    log::debug!("applying history schema migration 1");
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS measurements (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recorded_at TEXT NOT NULL,
            sex TEXT NOT NULL CHECK(sex IN ('male', 'female')),
            age_days INTEGER NOT NULL,
            age_months REAL NOT NULL,
            height_cm REAL NOT NULL,
            z_score REAL NOT NULL,
            status TEXT NOT NULL CHECK(status IN ('SEVERE', 'STUNTED', 'NORMAL', 'TALL')),
            subject_name TEXT NOT NULL,
            recorder_kind TEXT NOT NULL
        );
        ",
    )
}

fn apply_migration_2(conn: &Connection) -> Result<()> {
    log::debug!("applying history schema migration 2");
    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_measurements_recorded_at ON measurements(recorded_at);
        CREATE INDEX IF NOT EXISTS idx_measurements_subject ON measurements(subject_name);
        ",
    )
}

pub fn state_dir(workspace_path: &str) -> std::path::PathBuf {
    Path::new(workspace_path).join(".growthlens")
}

pub fn get_db_connection(workspace_path: &str) -> Result<Connection> {
    let db_path = state_dir(workspace_path).join("history.db");
    let conn = Connection::open(db_path)?;
    initialize_schema(&conn)?;
    Ok(conn)
}

/// Durable history backed by the workspace's SQLite database.
pub struct SqliteHistory {
    conn: Connection,
}

impl SqliteHistory {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn open(workspace_path: &str) -> std::result::Result<Self, String> {
        get_db_connection(workspace_path)
            .map(Self::new)
            .map_err(|e| format!("DB error: {e}"))
    }
}

impl HistoryStore for SqliteHistory {
    fn append(&mut self, measurement: &Measurement) -> std::result::Result<(), String> {
        self.conn
            .execute(
                "INSERT INTO measurements (recorded_at, sex, age_days, age_months, height_cm, z_score, status, subject_name, recorder_kind) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    measurement.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                    measurement.sex.as_str(),
                    measurement.age_days,
                    measurement.age_months,
                    measurement.height_cm,
                    measurement.z_score,
                    measurement.status.as_str(),
                    measurement.subject_name,
                    measurement.recorder_kind,
                ],
            )
            .map_err(|e| format!("Insert error: {e}"))?;

        log::debug!("stored measurement #{}", self.conn.last_insert_rowid());
        Ok(())
    }

    fn read_all(&self) -> std::result::Result<Vec<Measurement>, String> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT recorded_at, sex, age_days, age_months, height_cm, z_score, status, subject_name, recorder_kind FROM measurements ORDER BY id ASC",
            )
            .map_err(|e| format!("Query error: {e}"))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(StoredRow {
                    recorded_at: row.get(0)?,
                    sex: row.get(1)?,
                    age_days: row.get(2)?,
                    age_months: row.get(3)?,
                    height_cm: row.get(4)?,
                    z_score: row.get(5)?,
                    status: row.get(6)?,
                    subject_name: row.get(7)?,
                    recorder_kind: row.get(8)?,
                })
            })
            .map_err(|e| format!("Map error: {e}"))?;

        let measurements = rows
            .map(|row| row.map_err(|e| format!("Row error: {e}"))?.into_measurement())
            .collect::<std::result::Result<Vec<_>, String>>()?;
        Ok(measurements)
    }
}

struct StoredRow {
    recorded_at: String,
    sex: String,
    age_days: i64,
    age_months: f64,
    height_cm: f64,
    z_score: f64,
    status: String,
    subject_name: String,
    recorder_kind: String,
}

impl StoredRow {
    fn into_measurement(self) -> std::result::Result<Measurement, String> {
        let timestamp = NaiveDateTime::parse_from_str(&self.recorded_at, TIMESTAMP_FORMAT)
            .map_err(|e| format!("Bad timestamp {:?}: {e}", self.recorded_at))?;

        Ok(Measurement {
            timestamp,
            sex: self.sex.parse()?,
            age_days: self.age_days,
            age_months: self.age_months,
            height_cm: self.height_cm,
            z_score: self.z_score,
            status: self.status.parse()?,
            subject_name: self.subject_name,
            recorder_kind: self.recorder_kind,
        })
    }
}
