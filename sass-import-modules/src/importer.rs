use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, debug_span};

use crate::cache::ImportCache;
use crate::chain::{build_plan, search_contexts, ChainOutcome, ResolverChain, ResolverEntry};
use crate::config::ImporterOptions;
use crate::error::{ConfigError, ResolveError};
use crate::fs::{RealFs, ResolveFs};
use crate::graph::DependencyGraph;
use crate::package::{NodePackageResolver, PackageResolve};
use crate::path::{absolutize, parent_dir};

/// What the importer hands back to the host for one import.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ImportResult {
  #[serde(rename = "file")]
  FilePath(PathBuf),
  #[serde(rename = "contents")]
  Contents(String),
}

impl ImportResult {
  pub fn file_path(&self) -> Option<&Path> {
    match self {
      ImportResult::FilePath(path) => Some(path),
      ImportResult::Contents(_) => None,
    }
  }
}

/// Per-call context supplied by the host.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CallContext {
  #[serde(default)]
  pub include_paths: Vec<PathBuf>,
}

impl CallContext {
  pub fn with_include_paths(include_paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
    Self {
      include_paths: include_paths.into_iter().map(Into::into).collect(),
    }
  }
}

#[derive(Debug, Default)]
struct ImporterState {
  cache: ImportCache,
  graph: DependencyGraph,
}

/// Resolves `@import` specifiers to files on disk.
///
/// The cache and dependency graph live as long as the importer. Calls are
/// serialized: a resolution holds the state lock from cache lookup to cache
/// store.
#[derive(Debug)]
pub struct Importer<F = RealFs, P = NodePackageResolver<RealFs>> {
  fs: F,
  packages: P,
  options: ImporterOptions,
  state: Mutex<ImporterState>,
}

/// Importer with default options on the real filesystem, rooted at the
/// process working directory.
pub fn importer() -> Result<Importer, ConfigError> {
  Ok(Importer::new(ImporterOptions::from_env()?))
}

impl Importer<RealFs, NodePackageResolver<RealFs>> {
  pub fn new(options: ImporterOptions) -> Self {
    Self::with_capabilities(RealFs, NodePackageResolver::new(), options)
  }
}

impl<F: ResolveFs + Clone> Importer<F, NodePackageResolver<F>> {
  /// Probe through `fs`, including for package lookups.
  pub fn with_fs(fs: F, options: ImporterOptions) -> Self {
    let packages = NodePackageResolver::with_fs(fs.clone());
    Self::with_capabilities(fs, packages, options)
  }
}

impl<F: ResolveFs, P: PackageResolve> Importer<F, P> {
  pub fn with_capabilities(fs: F, packages: P, options: ImporterOptions) -> Self {
    Self {
      fs,
      packages,
      options,
      state: Mutex::new(ImporterState::default()),
    }
  }

  pub fn options(&self) -> &ImporterOptions {
    &self.options
  }

  pub fn stand_in(&self) -> &Path {
    &self.options.stand_in
  }

  /// The ordered plan a lookup from `referrer` would run.
  pub fn plan(&self, referrer: &Path, context: &CallContext) -> Vec<ResolverEntry> {
    let cwd = &self.options.cwd;
    let include_paths: Vec<PathBuf> = context
      .include_paths
      .iter()
      .map(|p| absolutize(p, cwd))
      .collect();
    let referrer_dir = absolutize(parent_dir(referrer), cwd);
    let bases = search_contexts(&include_paths, &referrer_dir, &self.options.paths);
    build_plan(&self.options.resolvers, &bases)
  }

  /// Resolve `specifier` imported from `referrer`.
  ///
  /// `Ok(None)` means nothing matched and the host should fall back to its own
  /// lookup. A file that would close a mutual import is replaced by the
  /// stand-in.
  pub fn resolve(
    &self,
    specifier: &str,
    referrer: &Path,
    context: &CallContext,
  ) -> Result<Option<ImportResult>, ResolveError> {
    let span = debug_span!("resolve", specifier, referrer = %referrer.display());
    let _guard = span.enter();

    let parent = absolutize(referrer, &self.options.cwd);
    let mut state = self.state.lock();

    let resolved = match state.cache.get(specifier) {
      Some(cached) => {
        debug!(resolved = %cached.display(), "resolving from cache");
        cached.to_path_buf()
      }
      None => {
        let plan = self.plan(referrer, context);
        let chain = ResolverChain::new(&self.fs, &self.packages, &self.options.extensions);
        match chain.run(specifier, &plan) {
          ChainOutcome::Found(found) => found,
          ChainOutcome::NotFound => {
            debug!("no resolver matched");
            return Ok(None);
          }
          ChainOutcome::Failed(cause) => {
            return Err(ResolveError::NotResolved {
              specifier: specifier.to_string(),
              referrer: referrer.to_path_buf(),
              cause,
            });
          }
        }
      }
    };

    if state.graph.is_circular(&parent, &resolved) {
      debug!(resolved = %resolved.display(), "found circular dependency, mocking empty file");
      return Ok(Some(ImportResult::FilePath(self.options.stand_in.clone())));
    }

    state.graph.add_edge(&parent, &resolved);
    state.cache.set(specifier, resolved.clone());
    debug!(resolved = %resolved.display(), "resolved");
    Ok(Some(ImportResult::FilePath(resolved)))
  }

  /// Bind a per-call context, giving the callback-style entry point hosts call.
  pub fn bind(&self, context: CallContext) -> BoundImporter<'_, F, P> {
    BoundImporter {
      importer: self,
      context,
    }
  }

  /// Files `parent` has been resolved to import, in resolution order.
  pub fn dependencies(&self, parent: &Path) -> Vec<PathBuf> {
    let parent = absolutize(parent, &self.options.cwd);
    self.state.lock().graph.dependencies(&parent).to_vec()
  }

  /// Snapshot of the whole dependency graph, parents sorted.
  pub fn dependency_graph(&self) -> Vec<(PathBuf, Vec<PathBuf>)> {
    let state = self.state.lock();
    let mut graph: Vec<_> = state
      .graph
      .parents()
      .map(|parent| (parent.to_path_buf(), state.graph.dependencies(parent).to_vec()))
      .collect();
    graph.sort();
    graph
  }

  pub fn cached(&self, specifier: &str) -> Option<PathBuf> {
    self.state.lock().cache.get(specifier).map(Path::to_path_buf)
  }
}

/// An [`Importer`] bound to the context of one host compilation.
pub struct BoundImporter<'a, F, P> {
  importer: &'a Importer<F, P>,
  context: CallContext,
}

impl<'a, F: ResolveFs, P: PackageResolve> BoundImporter<'a, F, P> {
  pub fn context(&self) -> &CallContext {
    &self.context
  }

  /// Resolve and hand the result to `done`. `done` runs exactly once unless
  /// resolution fails, in which case the error is returned instead.
  pub fn resolve(
    &self,
    specifier: &str,
    referrer: &Path,
    done: impl FnOnce(Option<ImportResult>),
  ) -> Result<(), ResolveError> {
    let result = self.importer.resolve(specifier, referrer, &self.context)?;
    done(result);
    Ok(())
  }
}
