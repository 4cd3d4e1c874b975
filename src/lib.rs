//! Fetch a Google Sheets worksheet into a Polars [`DataFrame`].
//!
//! ```no_run
//! use gsheet_frame::{WorksheetSelector, fetch_sheet_as_polars};
//!
//! # async fn run() -> gsheet_frame::error::Result<()> {
//! let df = fetch_sheet_as_polars(
//!     "1MYnMn4p3nRk51T4sMYyzUrKYAcgaMJsnTvu5AGv9UBo",
//!     WorksheetSelector::Gid(0),
//! )
//! .await?;
//! println!("{df}");
//! # Ok(())
//! # }
//! ```

pub mod blocking;
pub mod config;
pub mod error;
pub mod fetch;
pub mod frame;
pub mod session;
pub mod sheets;

pub use fetch::fetch_worksheet;
pub use sheets::{SheetsClient, SpreadsheetRef, WorksheetInfo, WorksheetSelector, WorksheetSource};

use crate::config::Config;
use crate::error::Result;
use crate::session::Session;
use polars::prelude::DataFrame;

static SESSION: Session<SheetsClient> = Session::new();

/// Authenticated client shared by the whole process.
///
/// The first call loads the config and acquires credentials, running the
/// consent flow if no cached token is usable. Later calls reuse the client.
pub async fn shared_client() -> Result<&'static SheetsClient> {
    SESSION
        .client(|| async {
            let config = Config::load()?;
            SheetsClient::new(&config.google).await
        })
        .await
}

/// Fetch one worksheet as a table whose columns come from the header row.
pub async fn fetch_sheet_as_polars(
    spreadsheet_id: &str,
    selector: WorksheetSelector,
) -> Result<DataFrame> {
    let reference = SpreadsheetRef::new(spreadsheet_id, selector)?;
    let client = shared_client().await?;
    fetch_worksheet(client, &reference).await
}
