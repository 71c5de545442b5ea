use crate::backend::SpreadsheetBackend;
use crate::errors::SheetError;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SheetStatus {
    Created,
    Existing,
}

/// Makes sure target sheets exist before rows are appended.
///
/// The sheet list is read first and an existing title counts as success, so
/// running twice on the same day reuses that day's sheets.
#[derive(Clone)]
pub struct SheetManager {
    backend: Arc<dyn SpreadsheetBackend>,
}

impl SheetManager {
    pub fn new(backend: Arc<dyn SpreadsheetBackend>) -> Self {
        Self { backend }
    }

    pub async fn ensure_sheet(
        &self,
        document_id: &str,
        sheet_name: &str,
    ) -> Result<SheetStatus, SheetError> {
        let failed = |cause| SheetError::SheetCreateFailed {
            document_id: document_id.to_string(),
            sheet_name: sheet_name.to_string(),
            cause,
        };

        let titles = self
            .backend
            .sheet_titles(document_id)
            .await
            .map_err(failed)?;
        if titles.iter().any(|title| title == sheet_name) {
            tracing::debug!(document_id, sheet_name, "Sheet already exists");
            return Ok(SheetStatus::Existing);
        }

        self.backend
            .create_sheet(document_id, sheet_name)
            .await
            .map_err(failed)?;
        tracing::info!(document_id, sheet_name, "Created sheet");

        Ok(SheetStatus::Created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendError;
    use crate::memory::{BackendCall, MemoryBackend, Operation};

    #[tokio::test]
    async fn test_creates_missing_sheet() {
        let backend = Arc::new(MemoryBackend::new());
        let manager = SheetManager::new(backend.clone());

        let status = manager.ensure_sheet("doc", "13 - 20 May 2024").await.unwrap();

        assert_eq!(status, SheetStatus::Created);
        assert_eq!(backend.titles("doc"), vec!["13 - 20 May 2024"]);
    }

    #[tokio::test]
    async fn test_existing_sheet_is_reused() {
        let backend = Arc::new(MemoryBackend::new());
        backend.insert_sheet("doc", "All Time (20 May 2024)", vec![]);
        let manager = SheetManager::new(backend.clone());

        let status = manager
            .ensure_sheet("doc", "All Time (20 May 2024)")
            .await
            .unwrap();

        assert_eq!(status, SheetStatus::Existing);
        assert_eq!(
            backend.calls(),
            vec![BackendCall::SheetTitles {
                document_id: "doc".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_twice_on_same_day() {
        let backend = Arc::new(MemoryBackend::new());
        let manager = SheetManager::new(backend.clone());

        manager.ensure_sheet("doc", "S").await.unwrap();
        let status = manager.ensure_sheet("doc", "S").await.unwrap();

        assert_eq!(status, SheetStatus::Existing);
        assert_eq!(backend.titles("doc"), vec!["S"]);
    }

    #[tokio::test]
    async fn test_create_failure() {
        let backend = Arc::new(MemoryBackend::new());
        backend.fail_on(Operation::CreateSheet, None);
        let manager = SheetManager::new(backend);

        let err = manager.ensure_sheet("doc", "S").await.unwrap_err();
        match err {
            SheetError::SheetCreateFailed {
                document_id,
                sheet_name,
                cause,
            } => {
                assert_eq!(document_id, "doc");
                assert_eq!(sheet_name, "S");
                assert!(matches!(cause, BackendError::Status { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
