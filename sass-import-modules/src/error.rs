use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// An underlying filesystem failure reported while probing a candidate.
///
/// A plain absence is never a `ProbeError`; see [`crate::ResolveFs::exists`].
#[derive(Debug, Error)]
#[error("failed to probe {}: {source}", path.display())]
pub struct ProbeError {
  pub path: PathBuf,
  #[source]
  pub source: io::Error,
}

impl ProbeError {
  pub fn new(path: impl Into<PathBuf>, source: io::Error) -> Self {
    Self {
      path: path.into(),
      source,
    }
  }
}

#[derive(Debug, Error)]
pub enum ResolveError {
  /// Every plan entry was tried, none matched, and at least one reported an
  /// error. `cause` is the first such error.
  #[error("Could not find file: {specifier} from parent {}", referrer.display())]
  NotResolved {
    specifier: String,
    referrer: PathBuf,
    #[source]
    cause: ProbeError,
  },
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
  #[error("failed to parse {origin}: {source}")]
  Parse {
    origin: String,
    #[source]
    source: serde_json::Error,
  },
  #[error("failed to resolve current directory: {0}")]
  CurrentDir(#[source] io::Error),
}
