use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

/// Rows of cell values, outer vector is rows.
pub type Grid = Vec<Vec<Value>>;

#[derive(thiserror::Error, Debug)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("invalid backend URL: {0}")]
    InvalidUrl(String),
    #[error(transparent)]
    InvalidRange(#[from] crate::a1::InvalidRange),
    #[error("no sheet named '{0}'")]
    SheetNotFound(String),
    #[error("a sheet named '{0}' already exists")]
    DuplicateSheet(String),
}

/// The remote document store holding the report spreadsheets.
///
/// Ranges are A1 notation including the sheet name (see [`crate::a1`]).
#[async_trait]
pub trait SpreadsheetBackend: Send + Sync {
    /// Titles of every sheet in the document.
    async fn sheet_titles(&self, document_id: &str) -> Result<Vec<String>, BackendError>;

    async fn create_sheet(&self, document_id: &str, title: &str) -> Result<(), BackendError>;

    /// Values of `range` up to its last non-empty row.
    async fn read_range(&self, document_id: &str, range: &str) -> Result<Grid, BackendError>;

    /// Overwrites `range` with `values` in one call.
    async fn write_range(
        &self,
        document_id: &str,
        range: &str,
        values: Grid,
    ) -> Result<(), BackendError>;
}
