mod auth;
mod client;
mod reference;

pub use client::SheetsClient;
pub use reference::{SpreadsheetRef, WorksheetInfo, WorksheetSelector};

// Re-export clear_tokens for CLI usage
pub use auth::clear_tokens as clear_sheets_tokens;

#[cfg(test)]
pub(crate) use reference::test_helpers;

use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait WorksheetSource {
    /// List the tabs of a spreadsheet in display order.
    async fn worksheets(&self, spreadsheet_id: &str) -> Result<Vec<WorksheetInfo>>;

    /// Read every cell of a tab as rows of strings.
    async fn read_values(
        &self,
        spreadsheet_id: &str,
        worksheet: &WorksheetInfo,
    ) -> Result<Vec<Vec<String>>>;
}
