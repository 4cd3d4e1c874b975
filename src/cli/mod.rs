mod auth;
mod fetch;
mod show;

use clap::{Parser, Subcommand};
use gsheet_frame::error::Result;

pub use fetch::FetchArgs;
pub use show::ShowResource;

#[derive(Parser, Debug)]
#[command(name = "gsheet-frame")]
#[command(about = "Fetch Google Sheets worksheets as Polars DataFrames", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Fetch(args) => fetch::execute(args).await,
            Commands::Auth { reset } => auth::execute(*reset).await,
            Commands::Show { resource } => resource.execute().await,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a worksheet and print it or write it to a file
    Fetch(FetchArgs),
    /// Authenticate with Google Sheets
    Auth {
        /// Delete cached tokens first, forcing a new consent flow
        #[arg(long)]
        reset: bool,
    },
    Show {
        #[command(subcommand)]
        resource: ShowResource,
    },
}
