use thiserror::Error;

/// Every way a growth assessment can be refused or fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GrowthError {
    #[error("invalid age ({age_days} days): {reason}")]
    InvalidAge { age_days: i64, reason: String },

    #[error("height rejected: {0}")]
    HeightRejected(String),

    #[error("age {age_days} days is outside the reference table coverage")]
    OutOfRange { age_days: i64 },

    #[error("invalid reference data: {0}")]
    InvalidReferenceData(String),

    #[error("reference data unavailable: {0}")]
    ReferenceDataUnavailable(String),

    #[error("failed to write history: {0}")]
    HistoryWriteFailed(String),

    #[error("failed to read history: {0}")]
    HistoryReadFailed(String),

    #[error("settings error: {0}")]
    Settings(String),

    #[error("failed to write output: {0}")]
    Output(String),
}

impl GrowthError {
    /// Stable machine-readable kind, used by the CLI's JSON error output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidAge { .. } => "INVALID_AGE",
            Self::HeightRejected(_) => "HEIGHT_REJECTED",
            Self::OutOfRange { .. } => "OUT_OF_RANGE",
            Self::InvalidReferenceData(_) => "INVALID_REFERENCE_DATA",
            Self::ReferenceDataUnavailable(_) => "REFERENCE_DATA_UNAVAILABLE",
            Self::HistoryWriteFailed(_) => "HISTORY_WRITE_FAILED",
            Self::HistoryReadFailed(_) => "HISTORY_READ_FAILED",
            Self::Settings(_) => "SETTINGS",
            Self::Output(_) => "OUTPUT",
        }
    }
}

pub type Result<T> = std::result::Result<T, GrowthError>;
