use std::time::Duration;
use thiserror::Error;

/// Failure taxonomy of a run. Anything not listed here (a stale button, a
/// selector lookup that throws) is swallowed and logged where it happens.
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("browser initialization failed: {0}")]
    Initialization(String),

    #[error("session not initialized")]
    NotInitialized,

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("navigation to {url} timed out after {}s", timeout.as_secs())]
    NavigationTimeout { url: String, timeout: Duration },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("browser error: {0}")]
    Browser(String),

    #[error("persistence failed: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ScoutError {
    /// Errors that abort a run before any extraction happens.
    pub fn is_pre_extraction(&self) -> bool {
        matches!(
            self,
            ScoutError::Initialization(_)
                | ScoutError::NotInitialized
                | ScoutError::Authentication(_)
                | ScoutError::NavigationTimeout { .. }
        )
    }
}

pub type ScoutResult<T> = Result<T, ScoutError>;
