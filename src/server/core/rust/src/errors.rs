/* src/server/core/rust/src/errors.rs */

use std::fmt;

use showcase_engine::{ManifestError, ManifestIssue};

/// What went wrong, independent of the transport that reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// No page is mounted at the requested path.
  NotFound,
  /// The request named a locale the site does not serve.
  UnknownLocale,
  /// The page manifest cannot be parsed or cannot be served.
  InvalidManifest,
}

impl ErrorKind {
  pub fn code(self) -> &'static str {
    match self {
      Self::NotFound => "NOT_FOUND",
      Self::UnknownLocale => "UNKNOWN_LOCALE",
      Self::InvalidManifest => "INVALID_MANIFEST",
    }
  }

  pub fn status(self) -> u16 {
    match self {
      Self::NotFound | Self::UnknownLocale => 404,
      Self::InvalidManifest => 500,
    }
  }
}

#[derive(Debug)]
pub struct ShowcaseError {
  kind: ErrorKind,
  message: String,
}

impl ShowcaseError {
  pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
    Self { kind, message: message.into() }
  }

  pub fn not_found(msg: impl Into<String>) -> Self {
    Self::new(ErrorKind::NotFound, msg)
  }

  pub fn unknown_locale(locale: &str) -> Self {
    Self::new(ErrorKind::UnknownLocale, format!("locale \"{locale}\" is not served"))
  }

  /// Route issues collected from a manifest, one per line.
  pub fn unservable_routes(issues: &[ManifestIssue]) -> Self {
    let lines: Vec<String> = issues.iter().map(ToString::to_string).collect();
    Self::new(ErrorKind::InvalidManifest, lines.join("\n"))
  }

  pub fn kind(&self) -> ErrorKind {
    self.kind
  }

  pub fn code(&self) -> &'static str {
    self.kind.code()
  }

  pub fn message(&self) -> &str {
    &self.message
  }

  pub fn status(&self) -> u16 {
    self.kind.status()
  }
}

impl fmt::Display for ShowcaseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.code(), self.message)
  }
}

impl std::error::Error for ShowcaseError {}

impl From<ManifestError> for ShowcaseError {
  fn from(err: ManifestError) -> Self {
    Self::new(ErrorKind::InvalidManifest, err.to_string())
  }
}
