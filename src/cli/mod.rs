pub mod discover;
pub mod local;
pub mod paths;
pub mod products;
pub mod tree;

use clap::{Parser, Subcommand};
use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::client::{HttpTransport, QueryClient};
use crate::error::Result;
use crate::export::WrittenReport;
use crate::join::JoinStrategy;
use crate::models::ReportRow;
use crate::retry::{Retry, ThreadSleeper};
use crate::settings::{read_token, Settings, DEFAULT_ROOT};
use crate::source::InspectionSource;

#[derive(Parser)]
#[command(
    name = "loctree",
    about = "Warehouse location tree and stock reports from the SQL inspection endpoint."
)]
pub struct Cli {
    /// Directory for the token file and all inputs/outputs
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<String>,
    /// Bearer token file (default: <data-dir>/auth_token.txt)
    #[arg(long = "token-file", global = true)]
    pub token_file: Option<String>,
    /// Inspection API base URL
    #[arg(long = "base-url", global = true)]
    pub base_url: Option<String>,
    /// Log more (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover every location under ROOT and save descendants_{ROOT}.json.
    Discover {
        /// Root location code
        #[arg(default_value_t = DEFAULT_ROOT)]
        root: i64,
    },
    /// Build LOCAL_PATH for each discovered location; saves descendants_{ROOT}_paths.json.
    Paths {
        /// Root location code
        #[arg(default_value_t = DEFAULT_ROOT)]
        root: i64,
    },
    /// Join product stock onto the saved paths; saves descendants_{ROOT}_products.*.
    Products {
        /// Root location code
        #[arg(default_value_t = DEFAULT_ROOT)]
        root: i64,
        #[command(flatten)]
        join: JoinArgs,
    },
    /// Discover, build paths and join stock in one run; saves tree_{ROOT}_products.*.
    Tree {
        /// Root location code
        #[arg(default_value_t = DEFAULT_ROOT)]
        root: i64,
        #[command(flatten)]
        join: JoinArgs,
    },
    /// Full report for one location with partner and last purchases; saves report_{CODE}_everything.*.
    Local {
        /// Location code
        code: i64,
        /// Tree whose saved paths file supplies LOCAL_PATH, when present
        #[arg(long = "tree-root", default_value_t = DEFAULT_ROOT)]
        tree_root: i64,
    },
}

#[derive(clap::Args, Debug, Clone, Copy)]
pub struct JoinArgs {
    /// Query stock one location at a time instead of in one batch
    #[arg(long = "per-location")]
    pub per_location: bool,
    /// Add each product's most recent purchase price
    #[arg(long = "last-purchase")]
    pub last_purchase: bool,
}

impl JoinArgs {
    pub fn strategy(&self) -> JoinStrategy {
        if self.per_location {
            JoinStrategy::PerLocation
        } else {
            JoinStrategy::Batched
        }
    }
}

pub type HttpSource = InspectionSource<HttpTransport, ThreadSleeper>;

/// Read the token and build a source against the configured endpoint.
pub(crate) fn open_source(settings: &Settings) -> Result<HttpSource> {
    let token = read_token(settings)?;
    let transport = HttpTransport::new(settings.query_url(), token, settings.timeout());
    let client = QueryClient::new(transport, Retry::with_attempts(settings.max_attempts));
    Ok(InspectionSource::new(client))
}

pub(crate) fn print_written(written: &WrittenReport, rows: usize) {
    println!(
        "Wrote {} {} {} rows: {rows}",
        written.json.display(),
        written.csv.display(),
        written.text.display()
    );
}

pub fn format_summary(title: &str, rows: &[ReportRow]) -> String {
    let mut locations: Vec<i64> = rows.iter().map(|r| r.location).collect();
    locations.dedup();
    let empty = rows.iter().filter(|r| r.stock.product.is_none()).count();
    let total: f64 = rows.iter().map(|r| r.stock.total_stock).sum();
    let max_depth = rows.iter().map(|r| r.depth).max().unwrap_or(0);

    let mut table = Table::new();
    table.set_header(vec!["", "Count"]);
    table.add_row(vec![Cell::new("Locations"), Cell::new(locations.len())]);
    table.add_row(vec![Cell::new("Report rows"), Cell::new(rows.len())]);
    table.add_row(vec![Cell::new("Locations without stock"), Cell::new(empty)]);
    table.add_row(vec![Cell::new("Deepest level"), Cell::new(max_depth)]);
    table.add_row(vec![Cell::new("Total stock".bold()), Cell::new(total)]);

    let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M");
    format!("{} ({stamp})\n{table}", title.bold())
}
