//! In-process spreadsheet backend.
//!
//! Mirrors the behavior the writer relies on from the remote service: column
//! reads stop at the last non-empty row, duplicate sheet titles are rejected
//! and writes to missing sheets fail. Used for dry runs and tests.

use crate::a1::SheetRange;
use crate::backend::{BackendError, Grid, SpreadsheetBackend};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    SheetTitles,
    CreateSheet,
    ReadRange,
    WriteRange,
}

/// A backend call as observed by the memory backend.
#[derive(Clone, Debug, PartialEq)]
pub enum BackendCall {
    SheetTitles {
        document_id: String,
    },
    CreateSheet {
        document_id: String,
        title: String,
    },
    ReadRange {
        document_id: String,
        range: String,
    },
    WriteRange {
        document_id: String,
        range: String,
        values: Grid,
    },
}

#[derive(Default)]
struct State {
    // Sheets per document, in creation order
    documents: HashMap<String, Vec<(String, Grid)>>,
    calls: Vec<BackendCall>,
    failures: Vec<(Operation, Option<String>)>,
}

impl State {
    fn sheet_mut(&mut self, document_id: &str, title: &str) -> Result<&mut Grid, BackendError> {
        self.documents
            .entry(document_id.to_string())
            .or_default()
            .iter_mut()
            .find(|(name, _)| name == title)
            .map(|(_, grid)| grid)
            .ok_or_else(|| BackendError::SheetNotFound(title.to_string()))
    }

    fn check_failure(&self, operation: Operation, document_id: &str) -> Result<(), BackendError> {
        let injected = self.failures.iter().any(|(op, doc)| {
            *op == operation && doc.as_deref().is_none_or(|doc| doc == document_id)
        });
        if injected {
            return Err(BackendError::Status {
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: format!("{operation:?} unavailable for {document_id}"),
            });
        }
        Ok(())
    }
}

fn is_empty_cell(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Documents are created implicitly on first use.
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking test thread must not hide the recorded state
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adds a sheet with existing content.
    pub fn insert_sheet(&self, document_id: &str, title: &str, rows: Grid) {
        self.lock()
            .documents
            .entry(document_id.to_string())
            .or_default()
            .push((title.to_string(), rows));
    }

    /// Makes every later `operation` fail, for one document or for all.
    pub fn fail_on(&self, operation: Operation, document_id: Option<&str>) {
        self.lock()
            .failures
            .push((operation, document_id.map(str::to_string)));
    }

    pub fn sheet(&self, document_id: &str, title: &str) -> Option<Grid> {
        self.lock()
            .documents
            .get(document_id)?
            .iter()
            .find(|(name, _)| name == title)
            .map(|(_, grid)| grid.clone())
    }

    pub fn titles(&self, document_id: &str) -> Vec<String> {
        self.lock()
            .documents
            .get(document_id)
            .map(|sheets| sheets.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    pub fn writes(&self) -> Vec<BackendCall> {
        self.calls()
            .into_iter()
            .filter(|call| {
                matches!(
                    call,
                    BackendCall::CreateSheet { .. } | BackendCall::WriteRange { .. }
                )
            })
            .collect()
    }
}

#[async_trait]
impl SpreadsheetBackend for MemoryBackend {
    async fn sheet_titles(&self, document_id: &str) -> Result<Vec<String>, BackendError> {
        let mut state = self.lock();
        state.calls.push(BackendCall::SheetTitles {
            document_id: document_id.to_string(),
        });
        state.check_failure(Operation::SheetTitles, document_id)?;

        Ok(state
            .documents
            .get(document_id)
            .map(|sheets| sheets.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default())
    }

    async fn create_sheet(&self, document_id: &str, title: &str) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.calls.push(BackendCall::CreateSheet {
            document_id: document_id.to_string(),
            title: title.to_string(),
        });
        state.check_failure(Operation::CreateSheet, document_id)?;

        let sheets = state.documents.entry(document_id.to_string()).or_default();
        if sheets.iter().any(|(name, _)| name == title) {
            return Err(BackendError::DuplicateSheet(title.to_string()));
        }
        sheets.push((title.to_string(), Grid::new()));
        Ok(())
    }

    async fn read_range(&self, document_id: &str, range: &str) -> Result<Grid, BackendError> {
        let mut state = self.lock();
        state.calls.push(BackendCall::ReadRange {
            document_id: document_id.to_string(),
            range: range.to_string(),
        });
        state.check_failure(Operation::ReadRange, document_id)?;

        let range = SheetRange::parse(range)?;
        let first_column = range.start.column - 1;
        let last_column = range.end.map_or(first_column, |end| end.column - 1);
        let first_row = range.start.row.map_or(0, |row| row - 1);
        let grid = state.sheet_mut(document_id, &range.sheet)?;

        let mut rows: Grid = grid
            .iter()
            .skip(first_row)
            .map(|row| {
                let mut cells: Vec<Value> = row
                    .iter()
                    .skip(first_column)
                    .take(last_column.saturating_sub(first_column) + 1)
                    .cloned()
                    .collect();
                while cells.last().is_some_and(is_empty_cell) {
                    cells.pop();
                }
                cells
            })
            .collect();
        while rows.last().is_some_and(|row| row.is_empty()) {
            rows.pop();
        }

        Ok(rows)
    }

    async fn write_range(
        &self,
        document_id: &str,
        range: &str,
        values: Grid,
    ) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.calls.push(BackendCall::WriteRange {
            document_id: document_id.to_string(),
            range: range.to_string(),
            values: values.clone(),
        });
        state.check_failure(Operation::WriteRange, document_id)?;

        let parsed = SheetRange::parse(range)?;
        let start_row = parsed
            .start
            .row
            .ok_or_else(|| crate::a1::InvalidRange(range.to_string()))?
            - 1;
        let start_column = parsed.start.column - 1;
        let grid = state.sheet_mut(document_id, &parsed.sheet)?;

        for (offset, row) in values.into_iter().enumerate() {
            let index = start_row + offset;
            if grid.len() <= index {
                grid.resize(index + 1, Vec::new());
            }
            let target = &mut grid[index];
            if target.len() < start_column + row.len() {
                target.resize(start_column + row.len(), Value::Null);
            }
            for (column, value) in row.into_iter().enumerate() {
                target[start_column + column] = value;
            }
        }

        Ok(())
    }
}
