//! Importer configuration and its serde representation.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::ConfigError;
use crate::path::{absolutize, normalize_extension};
use crate::strategy::ResolverKind;

pub const DEFAULT_EXTENSIONS: [&str; 2] = [".scss", ".css"];

/// File shipped with the crate that stands in for circular imports.
///
/// The path is fixed at build time, so a binary moved away from its source tree
/// must set `stand_in` itself.
pub fn default_stand_in() -> PathBuf {
  Path::new(env!("CARGO_MANIFEST_DIR")).join("circular.scss")
}

/// Validated importer options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImporterOptions {
  /// Search paths tried after the referrer's directory.
  pub paths: Vec<PathBuf>,
  /// Extensions in priority order, each starting with `.`.
  pub extensions: Vec<String>,
  pub resolvers: Vec<ResolverKind>,
  /// Directory relative paths are resolved against.
  pub cwd: PathBuf,
  /// Delivered instead of a file that would close a circular import.
  pub stand_in: PathBuf,
}

impl ImporterOptions {
  /// Defaults rooted at `cwd`: `cwd` as the only search path, `.scss` then
  /// `.css`, and every resolver in the default order.
  pub fn with_cwd(cwd: impl Into<PathBuf>) -> Self {
    let cwd = cwd.into();
    Self {
      paths: vec![cwd.clone()],
      extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
      resolvers: ResolverKind::DEFAULT_ORDER.to_vec(),
      cwd,
      stand_in: default_stand_in(),
    }
  }

  /// Defaults rooted at the process working directory.
  pub fn from_env() -> Result<Self, ConfigError> {
    let cwd = std::env::current_dir().map_err(ConfigError::CurrentDir)?;
    Ok(Self::with_cwd(cwd))
  }

  pub fn paths(mut self, paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
    self.paths = paths
      .into_iter()
      .map(|p| absolutize(&Into::<PathBuf>::into(p), &self.cwd))
      .collect();
    self
  }

  pub fn extensions(mut self, extensions: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
    self.extensions = extensions
      .into_iter()
      .map(|e| normalize_extension(e.as_ref()))
      .collect();
    self
  }

  pub fn resolvers(mut self, resolvers: impl IntoIterator<Item = ResolverKind>) -> Self {
    self.resolvers = resolvers.into_iter().collect();
    self
  }

  /// Set resolvers by name, dropping names that don't match a resolver.
  pub fn resolver_names(self, names: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
    let resolvers = parse_resolver_names(names);
    self.resolvers(resolvers)
  }

  pub fn stand_in(mut self, stand_in: impl Into<PathBuf>) -> Self {
    let stand_in: PathBuf = stand_in.into();
    self.stand_in = absolutize(&stand_in, &self.cwd);
    self
  }
}

fn parse_resolver_names(names: impl IntoIterator<Item = impl AsRef<str>>) -> Vec<ResolverKind> {
  names
    .into_iter()
    .filter_map(|name| {
      let name = name.as_ref();
      let parsed = ResolverKind::parse(name);
      if parsed.is_none() {
        warn!(resolver = name, "dropping unknown resolver");
      }
      parsed
    })
    .collect()
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum OneOrMany {
  One(String),
  Many(Vec<String>),
}

impl OneOrMany {
  pub fn into_vec(self) -> Vec<String> {
    match self {
      OneOrMany::One(one) => vec![one],
      OneOrMany::Many(many) => many,
    }
  }
}

/// Importer configuration as a host writes it.
///
/// ```json
/// { "paths": ["styles"], "extensions": [".scss"], "resolvers": ["local", "node"] }
/// ```
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImporterConfig {
  #[serde(default)]
  pub paths: Option<OneOrMany>,
  #[serde(default)]
  pub extensions: Option<Vec<String>>,
  /// Single extension; only used when `extensions` is absent.
  #[serde(default)]
  pub ext: Option<String>,
  #[serde(default)]
  pub resolvers: Option<Vec<String>>,
  #[serde(default)]
  pub stand_in: Option<PathBuf>,
}

impl ImporterConfig {
  pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
    serde_json::from_str(text).map_err(|source| ConfigError::Parse {
      origin: "importer config".to_string(),
      source,
    })
  }

  /// Read a JSON config file. Relative paths inside it resolve against the
  /// file's directory.
  pub fn from_path(path: &Path) -> Result<(Self, PathBuf), ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
      origin: path.display().to_string(),
      source,
    })?;
    let dir = path.parent().unwrap_or(Path::new("")).to_path_buf();
    Ok((config, dir))
  }

  /// Apply this config over the defaults rooted at `cwd`.
  pub fn into_options(self, cwd: impl Into<PathBuf>) -> ImporterOptions {
    let mut options = ImporterOptions::with_cwd(cwd);
    if let Some(paths) = self.paths {
      options = options.paths(paths.into_vec());
    }
    match (self.extensions, self.ext) {
      (Some(extensions), _) => options = options.extensions(extensions),
      (None, Some(ext)) => options = options.extensions([ext]),
      (None, None) => {}
    }
    if let Some(resolvers) = self.resolvers {
      options = options.resolver_names(resolvers);
    }
    if let Some(stand_in) = self.stand_in {
      options = options.stand_in(stand_in);
    }
    options
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_match_the_documented_ones() {
    let options = ImporterOptions::with_cwd("/proj");
    assert_eq!(options.paths, vec![PathBuf::from("/proj")]);
    assert_eq!(options.extensions, vec![".scss", ".css"]);
    assert_eq!(options.resolvers, ResolverKind::DEFAULT_ORDER.to_vec());
    assert!(options.stand_in.ends_with("circular.scss"));
  }

  #[test]
  fn extensions_are_normalized() {
    let options = ImporterOptions::with_cwd("/proj").extensions(["sass", ".css"]);
    assert_eq!(options.extensions, vec![".sass", ".css"]);
  }

  #[test]
  fn unknown_resolvers_are_dropped() {
    let options = ImporterOptions::with_cwd("/proj").resolver_names(["node", "glob", "local"]);
    assert_eq!(options.resolvers, vec![ResolverKind::Node, ResolverKind::Local]);
  }

  #[test]
  fn paths_accept_a_single_string() {
    let config = ImporterConfig::from_json_str(r#"{ "paths": "styles" }"#).unwrap();
    let options = config.into_options("/proj");
    assert_eq!(options.paths, vec![PathBuf::from("/proj/styles")]);
  }

  #[test]
  fn legacy_ext_is_used_without_extensions() {
    let config = ImporterConfig::from_json_str(r#"{ "ext": "sass" }"#).unwrap();
    assert_eq!(config.into_options("/proj").extensions, vec![".sass"]);

    let config =
      ImporterConfig::from_json_str(r#"{ "ext": "sass", "extensions": ["css"] }"#).unwrap();
    assert_eq!(config.into_options("/proj").extensions, vec![".css"]);
  }

  #[test]
  fn full_config_parses() {
    let config = ImporterConfig::from_json_str(
      r#"{
        "paths": ["/a", "b"],
        "extensions": [".scss"],
        "resolvers": ["partial", "local"],
        "standIn": "empty.scss"
      }"#,
    )
    .unwrap();
    let options = config.into_options("/proj");
    assert_eq!(options.paths, vec![PathBuf::from("/a"), PathBuf::from("/proj/b")]);
    assert_eq!(options.resolvers, vec![ResolverKind::Partial, ResolverKind::Local]);
    assert_eq!(options.stand_in, PathBuf::from("/proj/empty.scss"));
  }

  #[test]
  fn invalid_json_is_a_parse_error() {
    let err = ImporterConfig::from_json_str("{ paths: ").unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
  }
}
