//! Domain error types.

/// Top-level error type for timescore.
#[derive(Debug, thiserror::Error)]
pub enum TimingError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid input {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("storage error: {reason}")]
    Storage { reason: String },

    #[error("no timing data for market {market}")]
    NoData { market: String },

    #[error("summary service error: {reason}")]
    Summary { reason: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TimingError {
    /// Shorthand for rejecting a non-finite number at the engine boundary.
    pub fn non_finite(field: &str, value: f64) -> Self {
        TimingError::InvalidInput {
            field: field.to_string(),
            reason: format!("expected a finite number, got {value}"),
        }
    }
}

impl From<&TimingError> for std::process::ExitCode {
    fn from(err: &TimingError) -> Self {
        let code: u8 = match err {
            TimingError::Io(_) | TimingError::Json(_) => 1,
            TimingError::ConfigParse { .. }
            | TimingError::ConfigMissing { .. }
            | TimingError::ConfigInvalid { .. } => 2,
            TimingError::Storage { .. } => 3,
            TimingError::InvalidInput { .. } => 4,
            TimingError::NoData { .. } => 5,
            TimingError::Summary { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
