use std::io;
use std::path::{Path, PathBuf};

/// Filesystem abstraction used for probing candidates, so hosts and tests can
/// resolve against something other than the local disk.
pub trait ResolveFs {
  /// Return `Ok(true)` if `path` is an existing regular file.
  ///
  /// A missing path (or a path running through a non-directory) is
  /// `Ok(false)`. Anything else the OS reports, such as a permission failure,
  /// is returned as an error.
  fn exists(&self, path: &Path) -> io::Result<bool>;

  /// Read a UTF-8 file. Only used for package manifests.
  fn read_to_string(&self, path: &Path) -> io::Result<String>;

  /// Canonicalise a resolved path. Returning `None` keeps the lexical path.
  fn canonicalize(&self, _path: &Path) -> Option<PathBuf> {
    None
  }
}

impl<T: ResolveFs + ?Sized> ResolveFs for &T {
  fn exists(&self, path: &Path) -> io::Result<bool> {
    (**self).exists(path)
  }

  fn read_to_string(&self, path: &Path) -> io::Result<String> {
    (**self).read_to_string(path)
  }

  fn canonicalize(&self, path: &Path) -> Option<PathBuf> {
    (**self).canonicalize(path)
  }
}

/// Real filesystem adapter.
#[derive(Clone, Copy, Debug, Default)]
pub struct RealFs;

impl ResolveFs for RealFs {
  fn exists(&self, path: &Path) -> io::Result<bool> {
    match std::fs::metadata(path) {
      Ok(meta) => Ok(meta.is_file()),
      Err(err) if is_absence(&err) => Ok(false),
      Err(err) => Err(err),
    }
  }

  fn read_to_string(&self, path: &Path) -> io::Result<String> {
    std::fs::read_to_string(path)
  }
}

fn is_absence(err: &io::Error) -> bool {
  matches!(
    err.kind(),
    io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
  )
}
