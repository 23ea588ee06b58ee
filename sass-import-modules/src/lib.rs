//! Resolve Sass `@import` specifiers to files on disk.
//!
//! An [`Importer`] turns a bare specifier plus the path of the importing file
//! into a concrete file by running an ordered plan of resolvers
//! ([`ResolverKind`]) over a list of search directories:
//!
//! - `local`: `<dir>/<specifier><ext>`
//! - `partial`: `<dir>/<path>/_<name><ext>`
//! - `tilde`: `~pkg/file` looked up in `node_modules`
//! - `node`: package lookup in `node_modules`
//!
//! The first match wins. Results are memoized per importer, and a file that
//! would import its own importer is swapped for an empty stand-in stylesheet.
//!
//! ```no_run
//! use sass_import_modules::{CallContext, Importer, ImporterOptions};
//! use std::path::Path;
//!
//! let importer = Importer::new(ImporterOptions::with_cwd("/proj"));
//! let result = importer
//!   .resolve("variables", Path::new("/proj/index.scss"), &CallContext::default())
//!   .unwrap();
//! ```

pub mod cache;
pub mod chain;
pub mod config;
pub mod error;
pub mod fs;
pub mod graph;
pub mod importer;
pub mod package;
pub mod path;
pub mod strategy;

pub use cache::ImportCache;
pub use chain::{build_plan, ChainOutcome, ResolverChain, ResolverEntry, Step};
pub use config::{default_stand_in, ImporterConfig, ImporterOptions, DEFAULT_EXTENSIONS};
pub use error::{ConfigError, ProbeError, ResolveError};
pub use fs::{RealFs, ResolveFs};
pub use graph::DependencyGraph;
pub use importer::{importer, BoundImporter, CallContext, ImportResult, Importer};
pub use package::{NodePackageResolver, PackageResolve};
pub use path::extend;
pub use strategy::ResolverKind;

#[cfg(test)]
pub(crate) mod test_support {
  use crate::error::ProbeError;
  use crate::fs::ResolveFs;
  use crate::package::PackageResolve;
  use parking_lot::Mutex;
  use std::collections::{BTreeMap, BTreeSet};
  use std::io;
  use std::path::{Path, PathBuf};
  use std::sync::atomic::{AtomicUsize, Ordering};

  /// In-memory filesystem that records every probe.
  #[derive(Debug, Default)]
  pub struct FakeFs {
    files: BTreeMap<PathBuf, String>,
    denied: BTreeSet<PathBuf>,
    probed: Mutex<Vec<PathBuf>>,
    reads: AtomicUsize,
  }

  impl FakeFs {
    pub fn insert(&mut self, path: &str, contents: &str) {
      self.files.insert(PathBuf::from(path), contents.to_string());
    }

    /// Probing `path` fails with a permission error.
    pub fn deny(&mut self, path: &str) {
      self.denied.insert(PathBuf::from(path));
    }

    pub fn probed(&self) -> Vec<PathBuf> {
      self.probed.lock().clone()
    }

    pub fn probe_count(&self) -> usize {
      self.probed.lock().len()
    }

    pub fn reads(&self) -> usize {
      self.reads.load(Ordering::Relaxed)
    }
  }

  impl ResolveFs for FakeFs {
    fn exists(&self, path: &Path) -> io::Result<bool> {
      self.probed.lock().push(path.to_path_buf());
      if self.denied.contains(path) {
        return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
      }
      Ok(self.files.contains_key(path))
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
      self.reads.fetch_add(1, Ordering::Relaxed);
      self
        .files
        .get(path)
        .cloned()
        .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }
  }

  /// Package capability answering from a fixed specifier table.
  #[derive(Debug, Default)]
  pub struct FakePackages {
    resolved: BTreeMap<String, PathBuf>,
    failing: BTreeSet<String>,
    requests: Mutex<Vec<String>>,
  }

  impl FakePackages {
    pub fn insert(&mut self, specifier: &str, resolved: &str) {
      self
        .resolved
        .insert(specifier.to_string(), PathBuf::from(resolved));
    }

    pub fn fail(&mut self, specifier: &str) {
      self.failing.insert(specifier.to_string());
    }

    pub fn requests(&self) -> Vec<String> {
      self.requests.lock().clone()
    }
  }

  impl PackageResolve for FakePackages {
    fn resolve_package(
      &self,
      specifier: &str,
      base_dir: &Path,
      _extensions: &[String],
    ) -> Result<Option<PathBuf>, ProbeError> {
      self.requests.lock().push(specifier.to_string());
      if self.failing.contains(specifier) {
        return Err(ProbeError::new(
          base_dir.join("node_modules").join(specifier),
          io::Error::new(io::ErrorKind::InvalidData, "broken package"),
        ));
      }
      Ok(self.resolved.get(specifier).cloned())
    }
  }
}
