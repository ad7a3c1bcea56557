use crate::analysis::history::HistoryTracker;
use crate::commands::db::{state_dir, SqliteHistory};
use crate::error::{GrowthError, Result};
use crate::models::history::HistoryReport;
use std::fs;

/// Records, summary and trend for the workspace's history database.
/// A workspace that has never recorded anything reports an empty history.
pub fn get_history(workspace_path: &str) -> Result<HistoryReport> {
    fs::create_dir_all(state_dir(workspace_path)).map_err(|e| {
        GrowthError::HistoryReadFailed(format!("Failed to create state directory: {e}"))
    })?;
    let store = SqliteHistory::open(workspace_path).map_err(GrowthError::HistoryReadFailed)?;
    HistoryTracker::new(store).report()
}
