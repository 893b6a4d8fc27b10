use crate::discover::discover_descendants;
use crate::error::Result;
use crate::settings::{ensure_data_dir, Settings};
use crate::stages::write_descendants;

use super::open_source;

pub fn run(settings: &Settings, root: i64) -> Result<()> {
    let dir = ensure_data_dir(settings)?;
    let source = open_source(settings)?;
    let nodes = discover_descendants(&source, root)?;
    let path = write_descendants(&dir, root, &nodes)?;
    println!("Wrote {} nodes: {}", path.display(), nodes.len());
    Ok(())
}
