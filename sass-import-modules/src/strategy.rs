use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

use crate::error::ProbeError;
use crate::fs::ResolveFs;
use crate::package::PackageResolve;
use crate::path::{extend, normalize_path, partial_specifier};

/// The lookup strategies an importer can be configured with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolverKind {
  /// `<base>/<specifier><ext>` for each extension.
  Local,
  /// Like `Local`, with the basename prefixed by `_`.
  Partial,
  /// `~pkg/file` is looked up as `pkg/file` in `node_modules`.
  Tilde,
  /// Package lookup through the [`PackageResolve`] capability.
  Node,
}

impl ResolverKind {
  pub const DEFAULT_ORDER: [ResolverKind; 4] = [
    ResolverKind::Local,
    ResolverKind::Partial,
    ResolverKind::Tilde,
    ResolverKind::Node,
  ];

  pub fn name(self) -> &'static str {
    match self {
      ResolverKind::Local => "local",
      ResolverKind::Partial => "partial",
      ResolverKind::Tilde => "tilde",
      ResolverKind::Node => "node",
    }
  }

  pub fn parse(name: &str) -> Option<Self> {
    match name {
      "local" => Some(ResolverKind::Local),
      "partial" => Some(ResolverKind::Partial),
      "tilde" => Some(ResolverKind::Tilde),
      "node" => Some(ResolverKind::Node),
      _ => None,
    }
  }

  /// Attempt to resolve `specifier` against `base`.
  ///
  /// A miss is `Ok(None)`; only failures of the underlying probes are errors.
  pub fn attempt<F: ResolveFs, P: PackageResolve>(
    self,
    fs: &F,
    packages: &P,
    base: &Path,
    specifier: &str,
    extensions: &[String],
  ) -> Result<Option<PathBuf>, ProbeError> {
    match self {
      ResolverKind::Local => local(fs, base, specifier, extensions),
      ResolverKind::Partial => {
        let partial = partial_specifier(specifier);
        debug!(specifier, partial = %partial, "resolving as partial with prepended underscore");
        local(fs, base, &partial, extensions)
      }
      ResolverKind::Tilde => match specifier.strip_prefix('~') {
        Some(rest) => {
          debug!(specifier, "resolving ~ specifier through node_modules");
          node(packages, base, rest, extensions)
        }
        None => Ok(None),
      },
      ResolverKind::Node => node(packages, base, specifier, extensions),
    }
  }
}

impl fmt::Display for ResolverKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for ResolverKind {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    ResolverKind::parse(s).ok_or_else(|| format!("unknown resolver '{s}'"))
  }
}

fn local<F: ResolveFs>(
  fs: &F,
  base: &Path,
  specifier: &str,
  extensions: &[String],
) -> Result<Option<PathBuf>, ProbeError> {
  debug!(specifier, base = %base.display(), "resolving file locally");
  let mut tried: Vec<PathBuf> = Vec::with_capacity(extensions.len().max(1));
  let candidates: Vec<String> = if extensions.is_empty() {
    vec![specifier.to_string()]
  } else {
    extensions.iter().map(|ext| extend(specifier, ext)).collect()
  };

  for candidate in candidates {
    let path = normalize_path(&base.join(candidate));
    if tried.contains(&path) {
      continue;
    }
    if fs.exists(&path).map_err(|err| ProbeError::new(&path, err))? {
      return Ok(Some(path));
    }
    tried.push(path);
  }
  Ok(None)
}

fn node<P: PackageResolve>(
  packages: &P,
  base: &Path,
  specifier: &str,
  extensions: &[String],
) -> Result<Option<PathBuf>, ProbeError> {
  debug!(specifier, base = %base.display(), "resolving file from node_modules");
  if let Some(ext) = extensions.first() {
    let extended = extend(specifier, ext);
    if extended != specifier {
      // A failure of the extended lookup falls through to the bare specifier.
      if let Ok(Some(found)) = packages.resolve_package(&extended, base, extensions) {
        return Ok(Some(found));
      }
    }
  }
  packages.resolve_package(specifier, base, extensions)
}
