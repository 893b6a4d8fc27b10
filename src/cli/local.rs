use crate::error::Result;
use crate::export::write_report;
use crate::join::location_report;
use crate::models::PathRow;
use crate::paths::path_to_root;
use crate::settings::{ensure_data_dir, Settings};
use crate::source::LocationSource;
use crate::stages::{location_report_stem, read_paths};

use super::{open_source, print_written};

pub fn run(settings: &Settings, code: i64, tree_root: i64) -> Result<()> {
    let dir = ensure_data_dir(settings)?;
    let source = open_source(settings)?;

    let saved = match read_paths(&dir, tree_root) {
        Ok(rows) => rows.into_iter().find(|r| r.code == code),
        Err(e) => {
            tracing::debug!("no saved paths for tree {tree_root}: {e}");
            None
        }
    };
    let path = saved.or_else(|| {
        source
            .location(code)
            .map(|node| PathRow::new(&node, &path_to_root(&source, &node)))
    });

    let rows = location_report(&source, code, path.as_ref())?;
    let written = write_report(&dir, &location_report_stem(code), &rows)?;
    print_written(&written, rows.len());
    Ok(())
}
