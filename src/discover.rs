use std::collections::{BTreeMap, BTreeSet};

use crate::error::{LoctreeError, Result};
use crate::models::LocationNode;
use crate::source::LocationSource;

/// Every location under `root`, plus the root itself, keyed by code.
///
/// Expands one level per round trip: all children of the current frontier
/// are fetched in a single query, so the number of queries tracks the depth
/// of the tree rather than its size. The root is fetched separately since it
/// never comes back as anyone's child; a missing root is an error.
pub fn discover_descendants(
    source: &dyn LocationSource,
    root: i64,
) -> Result<BTreeMap<i64, LocationNode>> {
    let mut seen = BTreeSet::from([root]);
    let mut frontier = vec![root];
    let mut nodes = BTreeMap::new();
    let mut level = 0;

    while !frontier.is_empty() {
        level += 1;
        let children = source.children_of(&frontier);
        let mut next = BTreeSet::new();
        for child in children {
            if seen.insert(child.code) {
                next.insert(child.code);
            }
            nodes.insert(child.code, child);
        }
        tracing::debug!(level, frontier = frontier.len(), new = next.len(), "expanded level");
        frontier = next.into_iter().collect();
    }

    let root_node = source.location(root).ok_or(LoctreeError::MissingRoot(root))?;
    nodes.insert(root, root_node);
    tracing::info!(root, levels = level, nodes = nodes.len(), "descendants discovered");
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::tests::MemorySource;

    fn warehouse() -> MemorySource {
        MemorySource::default()
            .node(1, 0, "EMPRESA")
            .node(101000, 1, "DEPOSITO")
            .node(101010, 101000, "ALMOX")
            .node(101020, 101000, "EXPEDICAO")
            .node(101011, 101010, "PRATELEIRA A")
            .node(101012, 101010, "PRATELEIRA B")
            .node(101111, 101011, "GAVETA 1")
            .node(200000, 1, "OUTRO DEPOSITO")
    }

    #[test]
    fn test_discovers_whole_subtree_including_root() {
        let src = warehouse();
        let nodes = discover_descendants(&src, 101000).unwrap();
        let codes: Vec<i64> = nodes.keys().copied().collect();
        assert_eq!(codes, vec![101000, 101010, 101011, 101012, 101020, 101111]);
        assert_eq!(nodes[&101000].name, "DEPOSITO");
    }

    #[test]
    fn test_round_trips_bounded_by_depth() {
        let src = warehouse();
        discover_descendants(&src, 101000).unwrap();
        // Three populated levels below the root plus the empty terminating one.
        assert_eq!(src.child_queries.get(), 4);
    }

    #[test]
    fn test_leaf_root_is_alone() {
        let src = warehouse();
        let nodes = discover_descendants(&src, 101111).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(src.child_queries.get(), 1);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let src = warehouse();
        let err = discover_descendants(&src, 999).unwrap_err();
        assert!(matches!(err, LoctreeError::MissingRoot(999)));
    }

    #[test]
    fn test_cycle_terminates() {
        let src = MemorySource::default().node(10, 20, "A").node(20, 10, "B");
        let nodes = discover_descendants(&src, 10).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(src.child_queries.get(), 2);
    }
}
