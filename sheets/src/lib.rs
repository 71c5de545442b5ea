//! Spreadsheet side of the synchronization: naming, sheet management and
//! append-only row writing against a spreadsheet backend.

pub mod a1;
pub mod auth;
pub mod backend;
pub mod errors;
pub mod google;
pub mod manager;
pub mod memory;
pub mod naming;
pub mod writer;

pub use auth::{AccessToken, AuthError, Credential};
pub use backend::{BackendError, Grid, SpreadsheetBackend};
pub use errors::SheetError;
pub use google::GoogleSheetsClient;
pub use manager::{SheetManager, SheetStatus};
pub use memory::MemoryBackend;
pub use naming::SheetNames;
pub use writer::{AppendSummary, RowWriter};
