//! Node-style package resolution (`require.resolve` semantics) for stylesheet
//! lookups: relative paths, `node_modules` walking, `package.json` `main`, and
//! `index` files, each probed with the configured extensions.

use ahash::HashMap;
use parking_lot::Mutex;
use serde_json::Value;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::error::ProbeError;
use crate::fs::{RealFs, ResolveFs};
use crate::path::normalize_path;

const MAX_DEPTH: usize = 16;

/// Package resolution capability consumed by the `node` and `tilde` resolvers.
pub trait PackageResolve {
  /// Resolve `specifier` from `base_dir`, trying `extensions` in order.
  ///
  /// `Ok(None)` means nothing matched.
  fn resolve_package(
    &self,
    specifier: &str,
    base_dir: &Path,
    extensions: &[String],
  ) -> Result<Option<PathBuf>, ProbeError>;
}

impl<T: PackageResolve + ?Sized> PackageResolve for &T {
  fn resolve_package(
    &self,
    specifier: &str,
    base_dir: &Path,
    extensions: &[String],
  ) -> Result<Option<PathBuf>, ProbeError> {
    (**self).resolve_package(specifier, base_dir, extensions)
  }
}

/// Default [`PackageResolve`] implementation over a [`ResolveFs`].
#[derive(Debug)]
pub struct NodePackageResolver<F = RealFs> {
  fs: F,
  package_json_cache: Mutex<HashMap<PathBuf, Option<Arc<Value>>>>,
}

impl NodePackageResolver<RealFs> {
  pub fn new() -> Self {
    Self::with_fs(RealFs)
  }
}

impl Default for NodePackageResolver<RealFs> {
  fn default() -> Self {
    Self::new()
  }
}

impl<F: ResolveFs> NodePackageResolver<F> {
  pub fn with_fs(fs: F) -> Self {
    Self {
      fs,
      package_json_cache: Mutex::new(HashMap::default()),
    }
  }

  fn resolve_relative(
    &self,
    base_dir: &Path,
    specifier: &str,
    extensions: &[String],
  ) -> Result<Option<PathBuf>, ProbeError> {
    let candidate = normalize_path(&base_dir.join(specifier));
    if let Some(found) = self.load_as_file(&candidate, extensions)? {
      return Ok(Some(found));
    }
    self.load_as_directory(&candidate, extensions, 0)
  }

  fn resolve_node_modules(
    &self,
    base_dir: &Path,
    specifier: &str,
    extensions: &[String],
  ) -> Result<Option<PathBuf>, ProbeError> {
    for dir in base_dir.ancestors() {
      if dir.file_name().map_or(false, |name| name == "node_modules") {
        continue;
      }
      let candidate = normalize_path(&dir.join("node_modules").join(specifier));
      debug!(candidate = %candidate.display(), "probing node_modules");
      if let Some(found) = self.load_as_file(&candidate, extensions)? {
        return Ok(Some(found));
      }
      if let Some(found) = self.load_as_directory(&candidate, extensions, 0)? {
        return Ok(Some(found));
      }
    }
    Ok(None)
  }

  fn load_as_file(&self, candidate: &Path, extensions: &[String]) -> Result<Option<PathBuf>, ProbeError> {
    if let Some(found) = self.try_file(candidate)? {
      return Ok(Some(found));
    }
    for ext in extensions {
      let mut with_ext = OsString::from(candidate.as_os_str());
      with_ext.push(ext);
      if let Some(found) = self.try_file(Path::new(&with_ext))? {
        return Ok(Some(found));
      }
    }
    Ok(None)
  }

  fn load_as_directory(
    &self,
    dir: &Path,
    extensions: &[String],
    depth: usize,
  ) -> Result<Option<PathBuf>, ProbeError> {
    if depth > MAX_DEPTH {
      return Ok(None);
    }

    if let Some(manifest) = self.package_json(&dir.join("package.json"))? {
      if let Some(main) = manifest.get("main").and_then(|v| v.as_str()) {
        let main = match main {
          "" => None,
          "." | "./" => Some("./index"),
          other => Some(other),
        };
        if let Some(main) = main {
          let target = normalize_path(&dir.join(main));
          if let Some(found) = self.load_as_file(&target, extensions)? {
            return Ok(Some(found));
          }
          if target != dir {
            if let Some(found) = self.load_as_directory(&target, extensions, depth + 1)? {
              return Ok(Some(found));
            }
          }
        }
      }
    }

    self.load_as_file(&dir.join("index"), extensions)
  }

  fn try_file(&self, candidate: &Path) -> Result<Option<PathBuf>, ProbeError> {
    let exists = self
      .fs
      .exists(candidate)
      .map_err(|err| ProbeError::new(candidate, err))?;
    if !exists {
      return Ok(None);
    }
    Ok(Some(
      self
        .fs
        .canonicalize(candidate)
        .unwrap_or_else(|| candidate.to_path_buf()),
    ))
  }

  fn package_json(&self, path: &Path) -> Result<Option<Arc<Value>>, ProbeError> {
    if let Some(cached) = self.package_json_cache.lock().get(path) {
      return Ok(cached.clone());
    }

    let parsed = if self.fs.exists(path).map_err(|err| ProbeError::new(path, err))? {
      let raw = self
        .fs
        .read_to_string(path)
        .map_err(|err| ProbeError::new(path, err))?;
      let value = serde_json::from_str::<Value>(&raw)
        .map_err(|err| ProbeError::new(path, io::Error::new(io::ErrorKind::InvalidData, err)))?;
      Some(Arc::new(value))
    } else {
      None
    };

    self
      .package_json_cache
      .lock()
      .insert(path.to_path_buf(), parsed.clone());
    Ok(parsed)
  }
}

impl<F: ResolveFs> PackageResolve for NodePackageResolver<F> {
  fn resolve_package(
    &self,
    specifier: &str,
    base_dir: &Path,
    extensions: &[String],
  ) -> Result<Option<PathBuf>, ProbeError> {
    if specifier.is_empty() {
      return Ok(None);
    }
    if is_path_specifier(specifier) {
      self.resolve_relative(base_dir, specifier, extensions)
    } else {
      self.resolve_node_modules(base_dir, specifier, extensions)
    }
  }
}

fn is_path_specifier(specifier: &str) -> bool {
  specifier == "."
    || specifier == ".."
    || specifier.starts_with("./")
    || specifier.starts_with("../")
    || Path::new(specifier).is_absolute()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::FakeFs;

  fn exts() -> Vec<String> {
    vec![".scss".to_string(), ".css".to_string()]
  }

  #[test]
  fn resolves_main_from_package_json() {
    let mut fs = FakeFs::default();
    fs.insert("/proj/node_modules/test/package.json", r#"{ "main": "custom.scss" }"#);
    fs.insert("/proj/node_modules/test/custom.scss", "");

    let resolver = NodePackageResolver::with_fs(&fs);
    let found = resolver
      .resolve_package("test", Path::new("/proj/styles"), &exts())
      .unwrap();
    assert_eq!(found, Some(PathBuf::from("/proj/node_modules/test/custom.scss")));
  }

  #[test]
  fn resolves_files_inside_packages_with_extensions() {
    let mut fs = FakeFs::default();
    fs.insert("/proj/node_modules/test/file.css", "");
    fs.insert("/proj/node_modules/test/file.scss", "");

    let resolver = NodePackageResolver::with_fs(&fs);
    let found = resolver
      .resolve_package("test/file", Path::new("/proj"), &exts())
      .unwrap();
    assert_eq!(found, Some(PathBuf::from("/proj/node_modules/test/file.scss")));
  }

  #[test]
  fn falls_back_to_index_files() {
    let mut fs = FakeFs::default();
    fs.insert("/node_modules/grid/index.css", "");

    let resolver = NodePackageResolver::with_fs(&fs);
    let found = resolver
      .resolve_package("grid", Path::new("/a/b/c"), &exts())
      .unwrap();
    assert_eq!(found, Some(PathBuf::from("/node_modules/grid/index.css")));
  }

  #[test]
  fn nearest_node_modules_wins() {
    let mut fs = FakeFs::default();
    fs.insert("/node_modules/pkg/index.scss", "");
    fs.insert("/app/node_modules/pkg/index.scss", "");

    let resolver = NodePackageResolver::with_fs(&fs);
    let found = resolver
      .resolve_package("pkg", Path::new("/app/src"), &exts())
      .unwrap();
    assert_eq!(found, Some(PathBuf::from("/app/node_modules/pkg/index.scss")));
  }

  #[test]
  fn relative_specifiers_skip_node_modules() {
    let mut fs = FakeFs::default();
    fs.insert("/proj/node_modules/local/index.scss", "");
    fs.insert("/proj/local.scss", "");

    let resolver = NodePackageResolver::with_fs(&fs);
    let found = resolver
      .resolve_package("./local", Path::new("/proj"), &exts())
      .unwrap();
    assert_eq!(found, Some(PathBuf::from("/proj/local.scss")));
  }

  #[test]
  fn misses_are_not_errors() {
    let fs = FakeFs::default();
    let resolver = NodePackageResolver::with_fs(&fs);
    let found = resolver
      .resolve_package("nope", Path::new("/proj"), &exts())
      .unwrap();
    assert_eq!(found, None);
  }

  #[test]
  fn malformed_manifest_is_an_error() {
    let mut fs = FakeFs::default();
    fs.insert("/node_modules/broken/package.json", "{ main: ");

    let resolver = NodePackageResolver::with_fs(&fs);
    let err = resolver
      .resolve_package("broken", Path::new("/"), &exts())
      .unwrap_err();
    assert_eq!(err.path, PathBuf::from("/node_modules/broken/package.json"));
    assert_eq!(err.source.kind(), io::ErrorKind::InvalidData);
  }

  #[test]
  fn manifests_are_read_once() {
    let mut fs = FakeFs::default();
    fs.insert("/node_modules/pkg/package.json", r#"{ "main": "lib/main" }"#);
    fs.insert("/node_modules/pkg/lib/main.scss", "");

    let resolver = NodePackageResolver::with_fs(&fs);
    for _ in 0..3 {
      let found = resolver.resolve_package("pkg", Path::new("/"), &exts()).unwrap();
      assert_eq!(found, Some(PathBuf::from("/node_modules/pkg/lib/main.scss")));
    }
    assert_eq!(fs.reads(), 1);
  }
}
