//! File Graph - in-memory dependency graph over absolute file paths
//!
//! Nodes are files, edges are `composes`/`@value`/`:external` references.
//! Ordering queries are deterministic: dependencies precede dependents, and
//! files with no ordering constraint between them sort lexicographically by
//! path, independent of insertion order.

use crate::edge::{Edge, EdgeKind};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

/// Directed dependency graph over file paths.
#[derive(Debug, Default)]
pub struct FileGraph {
    nodes: BTreeSet<PathBuf>,
    edges_from: BTreeMap<PathBuf, Vec<Edge>>,
}

impl FileGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `file` with its complete set of outgoing edges, replacing
    /// any edges recorded by a previous version of the file. Duplicate
    /// edges collapse; edge targets become nodes as well.
    pub fn add(&mut self, file: &Path, edges: Vec<Edge>) {
        self.nodes.insert(file.to_path_buf());

        let mut seen = HashSet::new();
        let mut deduped = Vec::with_capacity(edges.len());
        for edge in edges {
            debug_assert_eq!(edge.from, file);
            self.nodes.insert(edge.to.clone());
            if seen.insert((edge.to.clone(), edge.kind)) {
                deduped.push(edge);
            }
        }

        tracing::debug!(file = %file.display(), edges = deduped.len(), "graph edges replaced");
        self.edges_from.insert(file.to_path_buf(), deduped);
    }

    /// Remove files and every edge they own or that references them.
    /// Unknown paths are ignored. Returns the paths actually removed.
    pub fn remove(&mut self, files: &[PathBuf]) -> Vec<PathBuf> {
        let mut removed = Vec::new();

        for file in files {
            if !self.nodes.remove(file) {
                continue;
            }
            self.edges_from.remove(file);
            for edges in self.edges_from.values_mut() {
                edges.retain(|e| &e.to != file);
            }
            removed.push(file.clone());
        }

        removed
    }

    /// True when `file` is a known node.
    pub fn contains(&self, file: &Path) -> bool {
        self.nodes.contains(file)
    }

    /// Outgoing edges of a file.
    pub fn edges(&self, file: &Path) -> &[Edge] {
        self.edges_from
            .get(file)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Outgoing edges of a specific kind.
    pub fn edges_by_kind(&self, file: &Path, kind: EdgeKind) -> Vec<&Edge> {
        self.edges(file).iter().filter(|e| e.kind == kind).collect()
    }

    /// Would adding edges from `file` to `targets` close a cycle?
    ///
    /// True when any target can already reach `file` through existing
    /// edges. Used to reject circular compositions before they are
    /// committed to the graph.
    pub fn would_cycle(&self, file: &Path, targets: &[PathBuf]) -> Option<PathBuf> {
        for target in targets {
            if target == file || self.reachable(target).contains(file) {
                return Some(target.clone());
            }
        }
        None
    }

    /// Transitive dependencies of `file` (excluding itself), ordered so a
    /// file's dependencies always precede it, ties broken lexicographically.
    pub fn dependencies_of(&self, file: &Path) -> Vec<PathBuf> {
        let mut reach = self.reachable(file);
        reach.remove(file);
        self.topo_order()
            .into_iter()
            .filter(|p| reach.contains(p))
            .collect()
    }

    /// Every known file in dependency-then-lexicographic order.
    pub fn dependencies(&self) -> Vec<PathBuf> {
        self.topo_order()
    }

    /// Files that transitively depend on `file`, in the same global order.
    pub fn dependents_of(&self, file: &Path) -> Vec<PathBuf> {
        let mut reach: HashSet<PathBuf> = HashSet::new();
        let mut stack = vec![file.to_path_buf()];

        while let Some(current) = stack.pop() {
            for (source, edges) in &self.edges_from {
                if reach.contains(source) {
                    continue;
                }
                if edges.iter().any(|e| e.to == current) {
                    reach.insert(source.clone());
                    stack.push(source.clone());
                }
            }
        }

        self.topo_order()
            .into_iter()
            .filter(|p| reach.contains(p))
            .collect()
    }

    /// Set of nodes reachable from `file` following outgoing edges,
    /// including `file` itself.
    fn reachable(&self, file: &Path) -> HashSet<PathBuf> {
        let mut reach = HashSet::new();
        let mut stack = vec![file.to_path_buf()];

        while let Some(current) = stack.pop() {
            if !reach.insert(current.clone()) {
                continue;
            }
            for edge in self.edges(&current) {
                stack.push(edge.to.clone());
            }
        }

        reach
    }

    /// Deterministic topological order: repeatedly emit the
    /// lexicographically-smallest file whose dependencies have all been
    /// emitted. Dependencies come first; the result is stable across
    /// insertion order. Quadratic, but graphs here are file-count sized.
    fn topo_order(&self) -> Vec<PathBuf> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut emitted: HashSet<&PathBuf> = HashSet::new();

        while order.len() < self.nodes.len() {
            let next = self.nodes.iter().find(|node| {
                !emitted.contains(*node)
                    && self.edges(node).iter().all(|e| {
                        !self.nodes.contains(&e.to) || emitted.contains(&e.to) || e.to == **node
                    })
            });

            match next {
                Some(node) => {
                    emitted.insert(node);
                    order.push(node.clone());
                }
                // Unreachable while insertion rejects cycles.
                None => break,
            }
        }

        order
    }
}
