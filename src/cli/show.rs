use clap::Subcommand;
use gsheet_frame::config::Config;
use gsheet_frame::error::Result;
use gsheet_frame::{SheetsClient, SpreadsheetRef, WorksheetSource};
use tracing::info;

#[derive(Subcommand, Debug)]
pub enum ShowResource {
    /// Show configuration, client secret and token cache paths
    Paths,
    /// List the worksheets of a spreadsheet
    Worksheets {
        /// Spreadsheet URL or ID
        sheet: SpreadsheetRef,
    },
}

impl ShowResource {
    pub async fn execute(&self) -> Result<()> {
        match self {
            ShowResource::Paths => show_paths(),
            ShowResource::Worksheets { sheet } => show_worksheets(sheet).await,
        }
    }
}

fn show_paths() -> Result<()> {
    let config_path = Config::config_file()?;
    let config = Config::load()?;

    info!(path = ?config_path, "Config path");
    info!(path = ?config.google.client_secrets_path()?, "Client secret path");
    info!(path = ?config.google.token_cache_path()?, "Token cache path");

    Ok(())
}

async fn show_worksheets(sheet: &SpreadsheetRef) -> Result<()> {
    let config = Config::load()?;
    let client = SheetsClient::new(&config.google).await?;

    for worksheet in client.worksheets(&sheet.spreadsheet_id).await? {
        info!(
            title = %worksheet.title,
            gid = worksheet.gid,
            index = worksheet.index,
            "Worksheet"
        );
    }

    Ok(())
}
