//! Append-only row writing.
//!
//! The append cursor is the number of rows returned for column A plus one. A
//! header is written only when that cursor is the first row, so re-running an
//! append never rewrites existing rows or repeats the header. The block is
//! written with a single range update sized to the rows being added.

use crate::a1::SheetRange;
use crate::backend::{BackendError, Grid, SpreadsheetBackend};
use crate::errors::SheetError;
use shared::row::Row;
use std::sync::Arc;

/// What an append call wrote.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AppendSummary {
    /// First sheet row written (1-based), the header row when one was written.
    pub start_row: usize,
    pub records: usize,
    pub header_written: bool,
}

#[derive(Clone)]
pub struct RowWriter {
    backend: Arc<dyn SpreadsheetBackend>,
}

impl RowWriter {
    pub fn new(backend: Arc<dyn SpreadsheetBackend>) -> Self {
        Self { backend }
    }

    /// The first unused row, counting the rows returned for column A.
    pub async fn next_empty_row(
        &self,
        document_id: &str,
        sheet_name: &str,
    ) -> Result<usize, BackendError> {
        let range = SheetRange::column(sheet_name, 1).to_string();
        let rows = self.backend.read_range(document_id, &range).await?;
        Ok(rows.len() + 1)
    }

    /// Appends `records` below the existing content of the sheet.
    ///
    /// Returns `None` without touching the backend when there is nothing to
    /// write.
    pub async fn append<R: Row + Sync>(
        &self,
        document_id: &str,
        sheet_name: &str,
        records: &[R],
    ) -> Result<Option<AppendSummary>, SheetError> {
        if records.is_empty() {
            return Ok(None);
        }

        let failed = |cause| SheetError::AppendFailed {
            document_id: document_id.to_string(),
            sheet_name: sheet_name.to_string(),
            cause,
        };

        let next_row = self
            .next_empty_row(document_id, sheet_name)
            .await
            .map_err(failed)?;
        let header_written = next_row == 1;

        let mut block: Grid = Vec::with_capacity(records.len() + 1);
        if header_written {
            block.push(R::header());
        }
        block.extend(records.iter().map(R::cells));

        let range = SheetRange::block(sheet_name, next_row, block.len(), R::COLUMNS.len());
        self.backend
            .write_range(document_id, &range.to_string(), block)
            .await
            .map_err(failed)?;

        let summary = AppendSummary {
            start_row: next_row,
            records: records.len(),
            header_written,
        };
        tracing::info!(
            document_id,
            sheet_name,
            start_row = summary.start_row,
            records = summary.records,
            header_written,
            "Appended rows"
        );

        Ok(Some(summary))
    }
}
