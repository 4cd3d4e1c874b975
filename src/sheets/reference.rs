use crate::error::{AppError, Result};
use std::fmt;
use std::str::FromStr;
use url::Url;

const SHEETS_HOST: &str = "docs.google.com";

/// One tab of a spreadsheet as reported by the Sheets API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorksheetInfo {
    pub gid: i32,
    pub index: usize,
    pub title: String,
}

/// Picks a worksheet either by its tab identifier or by its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorksheetSelector {
    /// The `gid` shown in the sheet URL
    Gid(i32),
    /// Zero-based position of the tab
    Index(usize),
}

impl Default for WorksheetSelector {
    fn default() -> Self {
        WorksheetSelector::Index(0)
    }
}

impl fmt::Display for WorksheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorksheetSelector::Gid(gid) => write!(f, "gid {}", gid),
            WorksheetSelector::Index(index) => write!(f, "index {}", index),
        }
    }
}

impl WorksheetSelector {
    pub fn resolve<'a>(&self, worksheets: &'a [WorksheetInfo]) -> Result<&'a WorksheetInfo> {
        let found = match *self {
            WorksheetSelector::Gid(gid) => worksheets.iter().find(|w| w.gid == gid),
            WorksheetSelector::Index(index) => worksheets.get(index),
        };

        found.ok_or_else(|| AppError::WorksheetNotFound {
            selector: self.to_string(),
            available: describe_worksheets(worksheets),
        })
    }
}

pub(crate) fn describe_worksheets(worksheets: &[WorksheetInfo]) -> String {
    let pairs = worksheets
        .iter()
        .map(|w| format!("('{}', {})", w.title, w.gid))
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{}]", pairs)
}

/// A spreadsheet identifier together with the worksheet to read from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetRef {
    pub spreadsheet_id: String,
    pub selector: WorksheetSelector,
}

impl SpreadsheetRef {
    pub fn new(spreadsheet_id: impl Into<String>, selector: WorksheetSelector) -> Result<Self> {
        let spreadsheet_id = spreadsheet_id.into();
        if spreadsheet_id.trim().is_empty() {
            return Err(AppError::Config(
                "Spreadsheet ID must not be empty".to_string(),
            ));
        }

        Ok(Self {
            spreadsheet_id,
            selector,
        })
    }

    /// Parse a browser URL such as
    /// `https://docs.google.com/spreadsheets/d/<id>/edit#gid=<gid>`.
    ///
    /// Without a `gid` the first tab is selected, matching what the browser opens.
    pub fn from_url(input: &str) -> Result<Self> {
        let url = Url::parse(input)
            .map_err(|e| AppError::Config(format!("Invalid spreadsheet URL '{}': {}", input, e)))?;

        if url.host_str() != Some(SHEETS_HOST) {
            return Err(AppError::Config(format!(
                "Not a Google Sheets URL: {}",
                input
            )));
        }

        let segments: Vec<&str> = url.path_segments().map(|s| s.collect()).unwrap_or_default();
        if segments.first() != Some(&"spreadsheets") {
            return Err(AppError::Config(format!(
                "Not a Google Sheets URL: {}",
                input
            )));
        }

        let spreadsheet_id = segments
            .iter()
            .position(|segment| *segment == "d")
            .and_then(|pos| segments.get(pos + 1))
            .ok_or_else(|| AppError::Config(format!("No spreadsheet ID in URL: {}", input)))?;

        let selector = match gid_from_url(&url)? {
            Some(gid) => WorksheetSelector::Gid(gid),
            None => WorksheetSelector::default(),
        };

        Self::new(*spreadsheet_id, selector)
    }

    pub fn url(&self) -> String {
        let base = format!(
            "https://{}/spreadsheets/d/{}/edit",
            SHEETS_HOST, self.spreadsheet_id
        );
        match self.selector {
            WorksheetSelector::Gid(gid) => format!("{}#gid={}", base, gid),
            WorksheetSelector::Index(_) => base,
        }
    }
}

// The gid normally lives in the fragment, but shared links sometimes carry it in the query.
fn gid_from_url(url: &Url) -> Result<Option<i32>> {
    let from_fragment = url.fragment().and_then(|fragment| {
        url::form_urlencoded::parse(fragment.as_bytes())
            .find(|(key, _)| key == "gid")
            .map(|(_, value)| value.into_owned())
    });
    let from_query = || {
        url.query_pairs()
            .find(|(key, _)| key == "gid")
            .map(|(_, value)| value.into_owned())
    };

    match from_fragment.or_else(from_query) {
        Some(value) => value
            .parse::<i32>()
            .map(Some)
            .map_err(|e| AppError::Config(format!("Invalid gid '{}': {}", value, e))),
        None => Ok(None),
    }
}

impl FromStr for SpreadsheetRef {
    type Err = AppError;

    /// Accepts either a full URL or a bare spreadsheet ID.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.starts_with("http://") || s.starts_with("https://") {
            Self::from_url(s)
        } else {
            Self::new(s, WorksheetSelector::default())
        }
    }
}
