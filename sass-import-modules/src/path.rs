//! Pure path helpers shared by the resolvers.
//!
//! Nothing in here touches the disk; candidates built from these helpers are
//! handed to a [`crate::ResolveFs`] for probing.

use std::path::{Component, Path, PathBuf};

/// Prefix `ext` with `.` when it lacks one (`scss` → `.scss`).
pub fn normalize_extension(ext: &str) -> String {
  if ext.starts_with('.') {
    ext.to_string()
  } else {
    let mut normalized = String::with_capacity(ext.len() + 1);
    normalized.push('.');
    normalized.push_str(ext);
    normalized
  }
}

/// Whether the final component of `path` carries an extension of its own.
///
/// Dotfiles such as `.hidden` do not count.
pub fn has_extension(path: &str) -> bool {
  Path::new(path).extension().is_some()
}

/// Append `ext` to `path` unless it already has an extension or already
/// contains `ext`.
///
/// - `extend("second", ".scss")` → `second.scss`
/// - `extend("theme.css", ".scss")` → `theme.css`
/// - `extend("vendor/bootstrap.min", ".scss")` → unchanged
pub fn extend(path: &str, ext: &str) -> String {
  let ext = normalize_extension(ext);
  if has_extension(path) || path.contains(ext.as_str()) {
    return path.to_string();
  }
  let mut extended = String::with_capacity(path.len() + ext.len());
  extended.push_str(path);
  extended.push_str(&ext);
  extended
}

/// Rewrite the basename of `specifier` into its partial form, keeping the
/// directory (`foo/bar` → `foo/_bar`).
pub fn partial_specifier(specifier: &str) -> String {
  let trimmed = specifier.trim_end_matches('/');
  let (dir, name) = match trimmed.rfind('/') {
    Some(idx) => (&trimmed[..idx + 1], &trimmed[idx + 1..]),
    None => ("", trimmed),
  };
  let mut partial = String::with_capacity(trimmed.len() + 1);
  partial.push_str(dir);
  partial.push('_');
  partial.push_str(name);
  partial
}

/// Lexically normalise a path: `.` segments are dropped and `..` pops the
/// previous normal segment. Symlinks are not consulted.
pub fn normalize_path(path: &Path) -> PathBuf {
  let mut normalized = PathBuf::new();
  for component in path.components() {
    match component {
      Component::Prefix(prefix) => normalized.push(prefix.as_os_str()),
      Component::RootDir => normalized.push(Component::RootDir.as_os_str()),
      Component::CurDir => {}
      Component::ParentDir => {
        let popped = matches!(
          normalized.components().next_back(),
          Some(Component::Normal(_))
        ) && normalized.pop();
        if !popped && !normalized.has_root() {
          normalized.push("..");
        }
      }
      Component::Normal(part) => normalized.push(part),
    }
  }
  if normalized.as_os_str().is_empty() {
    normalized.push(".");
  }
  normalized
}

/// Join a relative `path` onto `cwd` and normalise the result.
pub fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
  if path.is_absolute() {
    normalize_path(path)
  } else {
    normalize_path(&cwd.join(path))
  }
}

/// Directory containing `file`; a bare file name yields an empty path.
pub fn parent_dir(file: &Path) -> &Path {
  file.parent().unwrap_or(Path::new(""))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extension_gets_a_leading_dot() {
    assert_eq!(normalize_extension("sass"), ".sass");
    assert_eq!(normalize_extension(".css"), ".css");
  }

  #[test]
  fn extend_appends_only_when_missing() {
    assert_eq!(extend("second", ".scss"), "second.scss");
    assert_eq!(extend("second", "scss"), "second.scss");
    assert_eq!(extend("theme.css", ".scss"), "theme.css");
    assert_eq!(extend("dir.v2/file", ".scss"), "dir.v2/file.scss");
    assert_eq!(extend("a.scss-themes/file", ".scss"), "a.scss-themes/file");
    assert_eq!(extend(".hidden", ".scss"), ".hidden.scss");
  }

  #[test]
  fn partial_keeps_directory() {
    assert_eq!(partial_specifier("foo/bar"), "foo/_bar");
    assert_eq!(partial_specifier("partial"), "_partial");
    assert_eq!(partial_specifier("../up/mixins"), "../up/_mixins");
  }

  #[test]
  fn normalize_resolves_dots_lexically() {
    assert_eq!(
      normalize_path(Path::new("/proj/./styles/../index.scss")),
      PathBuf::from("/proj/index.scss")
    );
    assert_eq!(normalize_path(Path::new("/../a")), PathBuf::from("/a"));
    assert_eq!(normalize_path(Path::new("../a/./b")), PathBuf::from("../a/b"));
    assert_eq!(normalize_path(Path::new("a/..")), PathBuf::from("."));
  }

  #[test]
  fn absolutize_joins_relative_paths_onto_cwd() {
    let cwd = Path::new("/work");
    assert_eq!(absolutize(Path::new("styles"), cwd), PathBuf::from("/work/styles"));
    assert_eq!(absolutize(Path::new("/abs/x"), cwd), PathBuf::from("/abs/x"));
    assert_eq!(absolutize(parent_dir(Path::new("stdin")), cwd), PathBuf::from("/work"));
  }
}
