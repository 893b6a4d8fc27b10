use crate::error::Result;
use crate::paths::{assemble_paths, path_rows};
use crate::settings::{ensure_data_dir, Settings};
use crate::stages::{read_descendants, write_paths};

use super::open_source;

pub fn run(settings: &Settings, root: i64) -> Result<()> {
    let dir = ensure_data_dir(settings)?;
    let nodes = read_descendants(&dir, root)?.into_map();
    let source = open_source(settings)?;
    let paths = assemble_paths(&source, &nodes);
    let rows = path_rows(&nodes, &paths);
    let path = write_paths(&dir, root, &rows)?;
    println!("Wrote {} paths: {}", path.display(), rows.len());
    Ok(())
}
