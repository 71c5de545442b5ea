use collector::SourceUnavailable;
use sheets::{AuthError, SheetError};

/// Why a synchronization run stopped.
#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    #[error("configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    #[error(transparent)]
    Source(#[from] SourceUnavailable),

    #[error(transparent)]
    Sheet(#[from] SheetError),
}

impl SyncError {
    /// Short name of the failed step, used as a metric tag.
    pub fn operation(&self) -> &'static str {
        match self {
            SyncError::ConfigurationMissing(_) => "configuration",
            SyncError::Unauthorized(_) => "authorize",
            SyncError::Source(_) => "fetch",
            SyncError::Sheet(e) => e.operation(),
        }
    }
}
