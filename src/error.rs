use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Google Sheets API error: {0}")]
    Sheets(String),

    #[error(
        "Spreadsheet not found: {0}\n\n\
         Possible causes:\n\
         1. The sheet ID is incorrect\n\
         2. The sheet is not shared with your Google account\n\
         3. The sheet has been deleted"
    )]
    SpreadsheetNotFound(String),

    #[error("Worksheet {selector} not found. Available worksheets (title, gid): {available}")]
    WorksheetNotFound { selector: String, available: String },

    #[error("Worksheet '{0}' is empty")]
    EmptyWorksheet(String),

    #[error("OAuth2 authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("DataFrame error: {0}")]
    DataFrame(#[from] polars::prelude::PolarsError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
