use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorrectorError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Initialization error: {0}")]
    Initialization(String),

    #[error("Container not found in event: {name}")]
    Retrieval { name: String },

    #[error("Failed to apply systematic variation: {variation}")]
    CalibrationApply { variation: String },

    #[error("Calibration table error: {0}")]
    CalibrationFile(String),

    #[error("Output key already recorded: {key}")]
    Record { key: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CorrectorError {
    /// Setup-time errors abort the whole run; the per-event classes only
    /// abort the event that raised them.
    pub fn is_setup_error(&self) -> bool {
        match self {
            CorrectorError::Configuration(_) => true,
            CorrectorError::Initialization(_) => true,
            CorrectorError::CalibrationFile(_) => true,
            CorrectorError::Io(_) => true,
            CorrectorError::Json(_) => true,
            CorrectorError::Retrieval { .. } => false,
            CorrectorError::CalibrationApply { .. } => false,
            CorrectorError::Record { .. } => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CorrectorError>;
