//! The resolution plan and the loop that runs it.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ProbeError;
use crate::fs::ResolveFs;
use crate::package::PackageResolve;
use crate::strategy::ResolverKind;

/// One (resolver, base directory) pair of a resolution plan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolverEntry {
  pub resolver: ResolverKind,
  pub base: PathBuf,
}

/// Outcome of a single plan entry.
#[derive(Debug)]
pub enum Step {
  Found(PathBuf),
  NotFound,
  Error(ProbeError),
}

/// Outcome of a whole plan.
#[derive(Debug)]
pub enum ChainOutcome {
  Found(PathBuf),
  /// Nothing matched and nothing failed.
  NotFound,
  /// Nothing matched and at least one entry failed; holds the first failure.
  Failed(ProbeError),
}

/// Build the resolver-major cross product of `resolvers` and `bases`: every
/// base for the first resolver, then every base for the second, and so on.
pub fn build_plan(resolvers: &[ResolverKind], bases: &[PathBuf]) -> Vec<ResolverEntry> {
  resolvers
    .iter()
    .flat_map(|&resolver| {
      bases.iter().map(move |base| ResolverEntry {
        resolver,
        base: base.clone(),
      })
    })
    .collect()
}

/// Runs a plan strictly in order against a pair of capabilities.
pub struct ResolverChain<'a, F, P> {
  fs: &'a F,
  packages: &'a P,
  extensions: &'a [String],
}

impl<'a, F: ResolveFs, P: PackageResolve> ResolverChain<'a, F, P> {
  pub fn new(fs: &'a F, packages: &'a P, extensions: &'a [String]) -> Self {
    Self {
      fs,
      packages,
      extensions,
    }
  }

  pub fn step(&self, entry: &ResolverEntry, specifier: &str) -> Step {
    match entry
      .resolver
      .attempt(self.fs, self.packages, &entry.base, specifier, self.extensions)
    {
      Ok(Some(found)) => Step::Found(found),
      Ok(None) => Step::NotFound,
      Err(err) => Step::Error(err),
    }
  }

  /// Try each entry in order; the first match wins. Errors are remembered and
  /// only reported once the plan is exhausted without a match.
  pub fn run(&self, specifier: &str, plan: &[ResolverEntry]) -> ChainOutcome {
    let mut first_error = None;
    for (idx, entry) in plan.iter().enumerate() {
      debug!(
        specifier,
        resolver = entry.resolver.name(),
        base = %entry.base.display(),
        remaining = plan.len() - idx - 1,
        "lookup"
      );
      match self.step(entry, specifier) {
        Step::Found(found) => return ChainOutcome::Found(found),
        Step::NotFound => {}
        Step::Error(err) => {
          debug!(specifier, error = %err, "resolver step failed");
          first_error.get_or_insert(err);
        }
      }
    }
    match first_error {
      Some(err) => ChainOutcome::Failed(err),
      None => ChainOutcome::NotFound,
    }
  }
}

/// Search contexts for one call: per-call include paths, then the referrer's
/// directory, then the configured search paths.
pub fn search_contexts(include_paths: &[PathBuf], referrer_dir: &Path, paths: &[PathBuf]) -> Vec<PathBuf> {
  let mut bases = Vec::with_capacity(include_paths.len() + 1 + paths.len());
  bases.extend(include_paths.iter().cloned());
  bases.push(referrer_dir.to_path_buf());
  bases.extend(paths.iter().cloned());
  bases
}
