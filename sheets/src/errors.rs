use crate::backend::BackendError;

/// Failures of the sheet-level operations, tagged with their target.
#[derive(thiserror::Error, Debug)]
pub enum SheetError {
    #[error("could not create sheet '{sheet_name}' in document {document_id}: {cause}")]
    SheetCreateFailed {
        document_id: String,
        sheet_name: String,
        #[source]
        cause: BackendError,
    },

    #[error("could not append to sheet '{sheet_name}' in document {document_id}: {cause}")]
    AppendFailed {
        document_id: String,
        sheet_name: String,
        #[source]
        cause: BackendError,
    },
}

impl SheetError {
    pub fn operation(&self) -> &'static str {
        match self {
            SheetError::SheetCreateFailed { .. } => "create sheet",
            SheetError::AppendFailed { .. } => "append rows",
        }
    }
}
