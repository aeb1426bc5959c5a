use std::path::PathBuf;

use thiserror::Error;

/// Failure classes surfaced by the pipeline stages and the predictor.
///
/// Stage functions return `anyhow::Result`; these variants travel inside it so
/// callers can `downcast_ref::<ForecastError>()` when they need to branch.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("{what} not found at {}", path.display())]
    MissingFile { what: &'static str, path: PathBuf },

    #[error("failed to load {what} from {}: {reason}", path.display())]
    Load {
        what: &'static str,
        path: PathBuf,
        reason: String,
    },

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("invalid year range: start year {start} is after end year {end}")]
    InvalidRange { start: i32, end: i32 },

    #[error("year range {start}-{end} spans more than {max} years")]
    RangeTooLong { start: i32, end: i32, max: i64 },

    #[error("not enough data: need at least {needed}, found {found}")]
    InsufficientData { needed: usize, found: usize },
}

impl ForecastError {
    pub fn missing(what: &'static str, path: impl Into<PathBuf>) -> Self {
        ForecastError::MissingFile {
            what,
            path: path.into(),
        }
    }

    pub fn load(what: &'static str, path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ForecastError::Load {
            what,
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
