use crate::error::{AppError, Result};
use crate::frame::grid_to_dataframe;
use crate::sheets::{SpreadsheetRef, WorksheetSource};
use polars::prelude::DataFrame;
use tracing::{info, instrument};

/// Read the selected worksheet of a spreadsheet into a [`DataFrame`].
///
/// Errors from the source are passed through unchanged; an empty worksheet is
/// an error rather than an empty table.
#[instrument(
    name = "Fetching worksheet",
    skip_all,
    fields(spreadsheet = %reference.spreadsheet_id, selector = %reference.selector)
)]
pub async fn fetch_worksheet<S>(source: &S, reference: &SpreadsheetRef) -> Result<DataFrame>
where
    S: WorksheetSource + Sync,
{
    info!("Opening Google Sheet");
    let worksheets = source.worksheets(&reference.spreadsheet_id).await?;
    let worksheet = reference.selector.resolve(&worksheets)?;

    info!(title = %worksheet.title, gid = worksheet.gid, "Reading worksheet");
    let grid = source
        .read_values(&reference.spreadsheet_id, worksheet)
        .await?;

    if grid.is_empty() {
        return Err(AppError::EmptyWorksheet(worksheet.title.clone()));
    }

    let df = grid_to_dataframe(&grid)?;
    info!(
        rows = df.height(),
        columns = df.width(),
        "Successfully loaded worksheet"
    );

    Ok(df)
}
