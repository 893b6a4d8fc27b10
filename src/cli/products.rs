use std::collections::BTreeMap;

use crate::error::Result;
use crate::export::write_report;
use crate::join::{fetch_last_purchases, fetch_stock, join_rows};
use crate::models::{PathRow, ReportRow};
use crate::settings::{ensure_data_dir, Settings};
use crate::source::LocationSource;
use crate::stages::{descendants_products_stem, read_paths};

use super::{format_summary, open_source, print_written, JoinArgs};

/// Stock (and optionally last purchases) joined onto already-built paths.
pub(crate) fn build_rows(source: &dyn LocationSource, paths: &[PathRow], join: JoinArgs) -> Vec<ReportRow> {
    let codes: Vec<i64> = paths.iter().map(|p| p.code).collect();
    let stock = fetch_stock(source, &codes, join.strategy());
    let purchases = if join.last_purchase {
        fetch_last_purchases(source, &stock)
    } else {
        BTreeMap::new()
    };
    join_rows(paths, stock, &purchases)
}

pub fn run(settings: &Settings, root: i64, join: JoinArgs) -> Result<()> {
    let dir = ensure_data_dir(settings)?;
    let paths = read_paths(&dir, root)?;
    let source = open_source(settings)?;
    let rows = build_rows(&source, &paths, join);
    let written = write_report(&dir, &descendants_products_stem(root), &rows)?;
    println!("{}", format_summary(&format!("Descendants of {root}"), &rows));
    print_written(&written, rows.len());
    Ok(())
}
