use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::models::{LocationNode, PathInfo, PathRow};
use crate::source::LocationSource;

/// Resolves parent codes from, in order: the discovered nodes, a cache of
/// prefetched and previously fetched parents, and finally a single-row
/// lookup against the source.
struct ParentResolver<'a> {
    source: &'a dyn LocationSource,
    nodes: &'a BTreeMap<i64, LocationNode>,
    cache: HashMap<i64, LocationNode>,
    misses: HashSet<i64>,
}

impl<'a> ParentResolver<'a> {
    fn new(source: &'a dyn LocationSource, nodes: &'a BTreeMap<i64, LocationNode>) -> Self {
        Self {
            source,
            nodes,
            cache: HashMap::new(),
            misses: HashSet::new(),
        }
    }

    /// Fetch, in one query, every parent referenced by `nodes` that is not
    /// itself one of `nodes`.
    fn prefetch(&mut self) {
        let missing: Vec<i64> = self
            .nodes
            .values()
            .filter_map(LocationNode::parent_code)
            .filter(|p| !self.nodes.contains_key(p))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if missing.is_empty() {
            return;
        }
        let fetched = self.source.locations(&missing);
        tracing::debug!(requested = missing.len(), fetched = fetched.len(), "prefetched parents");
        for node in fetched {
            self.cache.insert(node.code, node);
        }
    }

    fn resolve(&mut self, code: i64) -> Option<LocationNode> {
        if let Some(node) = self.nodes.get(&code).or_else(|| self.cache.get(&code)) {
            return Some(node.clone());
        }
        if self.misses.contains(&code) {
            return None;
        }
        match self.source.location(code) {
            Some(node) => {
                self.cache.insert(code, node.clone());
                Some(node)
            }
            None => {
                self.misses.insert(code);
                None
            }
        }
    }

    /// Walk parent pointers up from `node`. The walk ends at a root, at a
    /// parent that cannot be resolved, or at a code already on the walk.
    fn walk(&mut self, node: &LocationNode) -> PathInfo {
        let mut names = vec![node.name.clone()];
        let mut codes = vec![node.code];
        let mut on_walk = HashSet::from([node.code]);
        let mut parent = node.parent_code();

        while let Some(code) = parent {
            if !on_walk.insert(code) {
                tracing::warn!(location = node.code, repeated = code, "parent cycle; path cut");
                break;
            }
            let Some(ancestor) = self.resolve(code) else {
                tracing::debug!(location = node.code, parent = code, "unresolved parent; path truncated");
                break;
            };
            parent = ancestor.parent_code();
            codes.push(ancestor.code);
            names.push(ancestor.name);
        }

        names.reverse();
        codes.reverse();
        PathInfo {
            depth: codes.len() - 1,
            names,
            codes,
        }
    }
}

/// Path of every node in `nodes`, keyed by code.
pub fn assemble_paths(
    source: &dyn LocationSource,
    nodes: &BTreeMap<i64, LocationNode>,
) -> BTreeMap<i64, PathInfo> {
    let mut resolver = ParentResolver::new(source, nodes);
    resolver.prefetch();
    nodes
        .values()
        .map(|node| (node.code, resolver.walk(node)))
        .collect()
}

/// Path of a single location that was not part of a discovered tree.
pub fn path_to_root(source: &dyn LocationSource, node: &LocationNode) -> PathInfo {
    let empty = BTreeMap::new();
    ParentResolver::new(source, &empty).walk(node)
}

/// Stage rows for the paths file, ordered by code.
pub fn path_rows(
    nodes: &BTreeMap<i64, LocationNode>,
    paths: &BTreeMap<i64, PathInfo>,
) -> Vec<PathRow> {
    nodes
        .values()
        .filter_map(|node| paths.get(&node.code).map(|info| PathRow::new(node, info)))
        .collect()
}
