use crate::commands::db::{get_db_connection, state_dir, SqliteHistory};
use crate::error::{GrowthError, Result};
use crate::models::history::HistoryStore;
use crate::models::workspace::WorkspaceMeta;
use std::fs;
use std::path::Path;

/// Prepare `.growthlens/` (settings and history database) and describe the workspace.
pub fn open_workspace(path: &str) -> Result<WorkspaceMeta> {
    if !Path::new(path).is_dir() {
        return Err(GrowthError::Settings(format!(
            "PATH_NOT_FOUND: {path} is not a directory"
        )));
    }

    fs::create_dir_all(state_dir(path)).map_err(|e| {
        GrowthError::Settings(format!("INIT_FAILED: Could not create .growthlens directory: {e}"))
    })?;

    let settings = crate::commands::settings::load_effective_settings(path)?;

    let conn = get_db_connection(path).map_err(|e| {
        GrowthError::HistoryReadFailed(format!("INIT_FAILED: Could not initialize database: {e}"))
    })?;
    let store = SqliteHistory::new(conn);
    let records = store.read_all().map_err(GrowthError::HistoryReadFailed)?;

    if !settings.reference_dir.is_dir() {
        log::warn!(
            "reference directory {} does not exist yet",
            settings.reference_dir.display()
        );
    }

    Ok(WorkspaceMeta {
        path: path.to_string(),
        reference_dir: settings.reference_dir.to_string_lossy().to_string(),
        measurement_count: records.len(),
        last_measured_at: records.last().map(|m| m.timestamp),
    })
}
