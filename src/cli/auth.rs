use gsheet_frame::config::Config;
use gsheet_frame::error::Result;
use gsheet_frame::sheets::{SheetsClient, clear_sheets_tokens};
use tracing::info;

pub async fn execute(reset: bool) -> Result<()> {
    let config = Config::load()?;

    if reset {
        clear_sheets_tokens(&config.google)?;
    }

    let _client = SheetsClient::new(&config.google).await?;

    info!("Google Sheets authentication verified");

    Ok(())
}
