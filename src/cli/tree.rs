use crate::discover::discover_descendants;
use crate::error::Result;
use crate::export::write_report;
use crate::paths::{assemble_paths, path_rows};
use crate::settings::{ensure_data_dir, Settings};
use crate::stages::tree_products_stem;

use super::products::build_rows;
use super::{format_summary, open_source, print_written, JoinArgs};

pub fn run(settings: &Settings, root: i64, join: JoinArgs) -> Result<()> {
    let dir = ensure_data_dir(settings)?;
    let source = open_source(settings)?;
    let nodes = discover_descendants(&source, root)?;
    let paths = assemble_paths(&source, &nodes);
    let rows = build_rows(&source, &path_rows(&nodes, &paths), join);
    let written = write_report(&dir, &tree_products_stem(root), &rows)?;
    println!("{}", format_summary(&format!("Tree {root}"), &rows));
    print_written(&written, rows.len());
    Ok(())
}
