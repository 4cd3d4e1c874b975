use clap::Args;
use gsheet_frame::config::Config;
use gsheet_frame::error::{AppError, Result};
use gsheet_frame::{
    SheetsClient, SpreadsheetRef, WorksheetSelector, WorksheetSource, fetch_worksheet,
};
use indicatif::ProgressStyle;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{Span, info, instrument};
use tracing_indicatif::span_ext::IndicatifSpanExt;
use tracing_indicatif::suspend_tracing_indicatif;

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Spreadsheet URL or ID
    pub sheet: SpreadsheetRef,

    /// Worksheet gid, overriding any gid in the URL
    #[arg(long, conflicts_with_all = ["index", "pick"])]
    pub gid: Option<i32>,

    /// Zero-based worksheet position
    #[arg(long, conflicts_with = "pick")]
    pub index: Option<usize>,

    /// Choose the worksheet from a list
    #[arg(long)]
    pub pick: bool,

    /// Only print the first N rows
    #[arg(long, short = 'n')]
    pub rows: Option<usize>,

    /// Write to a .csv or .parquet file instead of printing
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

impl FetchArgs {
    pub fn selector(&self) -> WorksheetSelector {
        match (self.gid, self.index) {
            (Some(gid), _) => WorksheetSelector::Gid(gid),
            (None, Some(index)) => WorksheetSelector::Index(index),
            (None, None) => self.sheet.selector,
        }
    }
}

pub async fn execute(args: &FetchArgs) -> Result<()> {
    let config = Config::load()?;
    let client = SheetsClient::new(&config.google).await?;

    let selector = match args.pick {
        true => pick_worksheet(&client, &args.sheet.spreadsheet_id).await?,
        false => args.selector(),
    };
    let reference = SpreadsheetRef {
        selector,
        ..args.sheet.clone()
    };

    let mut df = download(&client, &reference).await?;

    match &args.output {
        Some(path) => {
            write_dataframe(&mut df, path)?;
            info!(path = ?path, url = %reference.url(), "Saved worksheet");
        }
        None => match args.rows {
            Some(n) => println!("{}", df.head(Some(n))),
            None => println!("{}", df),
        },
    }

    Ok(())
}

#[instrument(name = "Downloading worksheet", skip_all)]
async fn download(client: &SheetsClient, reference: &SpreadsheetRef) -> Result<DataFrame> {
    let span = Span::current();
    span.pb_set_style(
        &ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
            .map_err(|e| AppError::Other(e.into()))?,
    );
    span.pb_set_message(&format!(
        "{} ({})",
        reference.spreadsheet_id, reference.selector
    ));

    fetch_worksheet(client, reference).await
}

async fn pick_worksheet(client: &SheetsClient, spreadsheet_id: &str) -> Result<WorksheetSelector> {
    let worksheets = client.worksheets(spreadsheet_id).await?;
    if worksheets.is_empty() {
        return Err(AppError::Sheets(format!(
            "Spreadsheet '{}' has no worksheets",
            spreadsheet_id
        )));
    }

    let labels: Vec<String> = worksheets
        .iter()
        .map(|w| format!("{} (gid {})", w.title, w.gid))
        .collect();

    let chosen = tokio::task::spawn_blocking(move || {
        suspend_tracing_indicatif(|| {
            labels
                .into_iter()
                .fold(
                    dialoguer::Select::new().with_prompt("Worksheet"),
                    |select, label| select.item(label),
                )
                .default(0)
                .interact()
        })
    })
    .await
    .map_err(|e| AppError::Other(e.into()))?
    .map_err(|e| AppError::Other(e.into()))?;

    Ok(WorksheetSelector::Gid(worksheets[chosen].gid))
}

fn write_dataframe(df: &mut DataFrame, path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("csv") => {
            let mut file = File::create(path)?;
            CsvWriter::new(&mut file).include_header(true).finish(df)?;
        }
        Some("parquet") => {
            let file = File::create(path)?;
            ParquetWriter::new(file).finish(df)?;
        }
        _ => {
            return Err(AppError::Config(format!(
                "Unsupported output format for {:?}, use .csv or .parquet",
                path
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        df!(
            "Date" => ["2025-01-01", "2025-01-02"],
            "Amount" => ["12.50", "3.20"],
        )
        .unwrap()
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("gsheet-frame-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_write_csv() {
        let path = temp_path("out.csv");
        let mut df = sample();

        write_dataframe(&mut df, &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(contents, "Date,Amount\n2025-01-01,12.50\n2025-01-02,3.20\n");
    }

    #[test]
    fn test_write_parquet() {
        let path = temp_path("out.parquet");
        let mut df = sample();

        write_dataframe(&mut df, &path).unwrap();

        let written = ParquetReader::new(File::open(&path).unwrap()).finish().unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(written.equals(&sample()));
    }

    #[test]
    fn test_write_unknown_format() {
        let path = temp_path("out.xlsx");
        let mut df = sample();

        let result = write_dataframe(&mut df, &path);

        assert!(matches!(result, Err(AppError::Config(_))));
        assert!(!path.exists());
    }
}
