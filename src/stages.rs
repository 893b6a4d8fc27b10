use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LoctreeError, Result};
use crate::models::{LocationNode, PathRow};

/// Output of `discover`, input of `paths`.
#[derive(Debug, Serialize, Deserialize)]
pub struct DescendantsFile {
    pub start_local: i64,
    pub count: usize,
    pub nodes: Vec<LocationNode>,
}

impl DescendantsFile {
    pub fn new(root: i64, nodes: &BTreeMap<i64, LocationNode>) -> Self {
        Self {
            start_local: root,
            count: nodes.len(),
            nodes: nodes.values().cloned().collect(),
        }
    }

    pub fn into_map(self) -> BTreeMap<i64, LocationNode> {
        self.nodes.into_iter().map(|n| (n.code, n)).collect()
    }
}

pub fn descendants_path(dir: &Path, root: i64) -> PathBuf {
    dir.join(format!("descendants_{root}.json"))
}

pub fn paths_path(dir: &Path, root: i64) -> PathBuf {
    dir.join(format!("descendants_{root}_paths.json"))
}

pub fn descendants_products_stem(root: i64) -> String {
    format!("descendants_{root}_products")
}

pub fn tree_products_stem(root: i64) -> String {
    format!("tree_{root}_products")
}

pub fn location_report_stem(code: i64) -> String {
    format!("report_{code}_everything")
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, hint: &str) -> Result<T> {
    if !path.exists() {
        return Err(LoctreeError::MissingInput {
            path: path.display().to_string(),
            hint: hint.to_string(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn write_descendants(dir: &Path, root: i64, nodes: &BTreeMap<i64, LocationNode>) -> Result<PathBuf> {
    let path = descendants_path(dir, root);
    write_json(&path, &DescendantsFile::new(root, nodes))?;
    Ok(path)
}

pub fn read_descendants(dir: &Path, root: i64) -> Result<DescendantsFile> {
    read_json(
        &descendants_path(dir, root),
        &format!("Run `loctree discover {root}` to create it."),
    )
}

pub fn write_paths(dir: &Path, root: i64, rows: &[PathRow]) -> Result<PathBuf> {
    let path = paths_path(dir, root);
    write_json(&path, rows)?;
    Ok(path)
}

pub fn read_paths(dir: &Path, root: i64) -> Result<Vec<PathRow>> {
    read_json(
        &paths_path(dir, root),
        &format!("Run `loctree paths {root}` to create it."),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes() -> BTreeMap<i64, LocationNode> {
        [
            LocationNode { code: 101010, parent: Some(101000), name: "ALMOX".into() },
            LocationNode { code: 101000, parent: Some(0), name: "DEPOSITO".into() },
        ]
        .into_iter()
        .map(|n| (n.code, n))
        .collect()
    }

    #[test]
    fn test_descendants_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_descendants(dir.path(), 101000, &nodes()).unwrap();
        assert!(path.ends_with("descendants_101000.json"));
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["start_local"], 101000);
        assert_eq!(raw["count"], 2);
        assert_eq!(raw["nodes"][0]["CODLOCAL"], 101000);
        assert_eq!(raw["nodes"][1]["DESCRLOCAL"], "ALMOX");

        let back = read_descendants(dir.path(), 101000).unwrap().into_map();
        assert_eq!(back, nodes());
    }

    #[test]
    fn test_reads_files_written_by_older_runs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            descendants_path(dir.path(), 7),
            r#"{"start_local": 7, "count": 1,
                "nodes": [{"CODLOCAL": 8, "CODLOCALPAI": 7, "DESCRLOCAL": "X"}]}"#,
        )
        .unwrap();
        let file = read_descendants(dir.path(), 7).unwrap();
        assert_eq!(file.nodes[0].parent, Some(7));
    }

    #[test]
    fn test_missing_input_names_producing_command() {
        let dir = tempfile::tempdir().unwrap();
        let msg = read_paths(dir.path(), 101000).unwrap_err().to_string();
        assert!(msg.contains("descendants_101000_paths.json"), "got: {msg}");
        assert!(msg.contains("loctree paths 101000"), "got: {msg}");
    }

    #[test]
    fn test_paths_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![PathRow {
            code: 101010,
            name: "ALMOX".into(),
            path: "DEPOSITO > ALMOX".into(),
            code_path: "101000.101010".into(),
            depth: 1,
        }];
        write_paths(dir.path(), 101000, &rows).unwrap();
        assert_eq!(read_paths(dir.path(), 101000).unwrap(), rows);
    }
}
