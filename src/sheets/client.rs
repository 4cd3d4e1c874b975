use super::{WorksheetInfo, WorksheetSource};
use crate::config::GoogleConfig;
use crate::error::{AppError, Result};
use crate::sheets::auth::create_and_verify_authenticator;
use async_trait::async_trait;
use google_sheets4::api::{Scope, Sheets};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use tracing::{debug, instrument};

// Read-only access to spreadsheets the user can see
pub(crate) const AUTH_SCOPE: Scope = Scope::SpreadsheetReadonly;

const WORKSHEET_FIELDS: &str = "sheets.properties(sheetId,index,title)";

pub struct SheetsClient {
    hub: Sheets<HttpsConnector<HttpConnector>>,
}

impl SheetsClient {
    /// Create a new SheetsClient with authenticated access
    ///
    /// Cached tokens are reused or refreshed; the interactive consent flow
    /// only runs when neither works.
    #[instrument(name = "Authenticating to Google Sheets", skip_all)]
    pub async fn new(config: &GoogleConfig) -> Result<Self> {
        let auth = create_and_verify_authenticator(config).await?;

        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()?
            .https_or_http()
            .enable_http1()
            .build();

        let client = Client::builder(hyper_util::rt::TokioExecutor::new()).build(connector);

        Ok(Self {
            hub: Sheets::new(client, auth),
        })
    }
}

#[async_trait]
impl WorksheetSource for SheetsClient {
    #[instrument(name = "Listing worksheets", skip(self))]
    async fn worksheets(&self, spreadsheet_id: &str) -> Result<Vec<WorksheetInfo>> {
        let (_, spreadsheet) = self
            .hub
            .spreadsheets()
            .get(spreadsheet_id)
            .include_grid_data(false)
            .param("fields", WORKSHEET_FIELDS)
            .add_scope(AUTH_SCOPE)
            .doit()
            .await
            .map_err(|e| spreadsheet_error(spreadsheet_id, e))?;

        let worksheets: Vec<WorksheetInfo> = spreadsheet
            .sheets
            .unwrap_or_default()
            .into_iter()
            .filter_map(|sheet| sheet.properties)
            .enumerate()
            .map(|(position, props)| WorksheetInfo {
                // Zero-valued fields may be omitted from the response
                gid: props.sheet_id.unwrap_or_default(),
                index: props
                    .index
                    .and_then(|i| usize::try_from(i).ok())
                    .unwrap_or(position),
                title: props.title.unwrap_or_default(),
            })
            .collect();

        debug!(count = worksheets.len(), "Found worksheets");
        Ok(worksheets)
    }

    #[instrument(name = "Fetching worksheet values", skip(self, worksheet), fields(worksheet = %worksheet.title))]
    async fn read_values(
        &self,
        spreadsheet_id: &str,
        worksheet: &WorksheetInfo,
    ) -> Result<Vec<Vec<String>>> {
        let range = sheet_range(&worksheet.title);
        let (_, response) = self
            .hub
            .spreadsheets()
            .values_get(spreadsheet_id, &range)
            .major_dimension("ROWS")
            .value_render_option("FORMATTED_VALUE")
            .add_scope(AUTH_SCOPE)
            .doit()
            .await
            .map_err(|e| {
                AppError::Sheets(read_failure_message(&worksheet.title, &e.to_string()))
            })?;

        // Values are Option<Vec<Vec<serde_json::Value>>>
        let rows = response
            .values
            .unwrap_or_default()
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect();

        Ok(rows)
    }
}

/// A1 range covering a whole tab. Titles are always quoted so that names
/// containing spaces or looking like cell references are read literally.
fn sheet_range(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

fn cell_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn read_failure_message(title: &str, cause: &str) -> String {
    format!(
        "Failed to read worksheet '{}': {}\n\n\
         Possible causes:\n\
         1. API rate limit exceeded (requests per minute per user)\n\
         2. Google Sheets API not enabled in your Cloud project\n\
         3. Temporary API outage\n\n\
         To fix:\n\
         1. Wait a few seconds and try again\n\
         2. Enable the Google Sheets API in the Google Cloud console",
        title, cause
    )
}

fn api_status(err: &google_sheets4::Error) -> Option<u64> {
    match err {
        google_sheets4::Error::BadRequest(body) => body.get("error")?.get("code")?.as_u64(),
        _ => None,
    }
}

fn spreadsheet_error(spreadsheet_id: &str, err: google_sheets4::Error) -> AppError {
    match api_status(&err) {
        Some(404) => AppError::SpreadsheetNotFound(spreadsheet_id.to_string()),
        _ => AppError::Sheets(format!(
            "Failed to open spreadsheet '{}': {}",
            spreadsheet_id, err
        )),
    }
}
