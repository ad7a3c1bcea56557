use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceMeta {
    pub path: String,
    pub reference_dir: String,
    pub measurement_count: usize,
    pub last_measured_at: Option<NaiveDateTime>,
}
