use ahash::HashMap;
use std::path::{Path, PathBuf};

/// Parent → dependency edges recorded as imports resolve. Edges are only ever
/// appended.
#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
  edges: HashMap<PathBuf, Vec<PathBuf>>,
}

impl DependencyGraph {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record that `parent` imports `dependency`. Duplicates are kept.
  pub fn add_edge(&mut self, parent: &Path, dependency: &Path) {
    self
      .edges
      .entry(parent.to_path_buf())
      .or_default()
      .push(dependency.to_path_buf());
  }

  /// Whether `dependency` already lists `parent` as one of its own imports.
  ///
  /// Only mutual (one-hop) references are caught; `a → b → c → a` is not.
  pub fn is_circular(&self, parent: &Path, dependency: &Path) -> bool {
    self
      .edges
      .get(dependency)
      .map_or(false, |deps| deps.iter().any(|dep| dep == parent))
  }

  /// Dependencies of `parent` in insertion order.
  pub fn dependencies(&self, parent: &Path) -> &[PathBuf] {
    self.edges.get(parent).map(Vec::as_slice).unwrap_or(&[])
  }

  /// All parents with at least one edge.
  pub fn parents(&self) -> impl Iterator<Item = &Path> {
    self.edges.keys().map(|p| p.as_path())
  }

  pub fn is_empty(&self) -> bool {
    self.edges.is_empty()
  }
}
