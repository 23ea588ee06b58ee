use ahash::HashMap;
use std::path::{Path, PathBuf};

/// Raw specifier → resolved file, for the lifetime of one importer.
///
/// Keys are the specifier exactly as the host passed it, so a specifier reused
/// from a different referrer gets the first resolution back.
#[derive(Clone, Debug, Default)]
pub struct ImportCache {
  entries: HashMap<String, PathBuf>,
}

impl ImportCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, specifier: &str) -> Option<&Path> {
    self.entries.get(specifier).map(|p| p.as_path())
  }

  pub fn set(&mut self, specifier: &str, resolved: PathBuf) {
    self.entries.insert(specifier.to_string(), resolved);
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}
