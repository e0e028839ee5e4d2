/* src/server/engine/rust/src/markup.rs */

//! Rendered HTML fragments and the renderer contract every block variant implements.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Property bag handed to a block renderer. Absent manifest props mean an empty bag.
pub type Props = serde_json::Map<String, serde_json::Value>;

/// HTML fragment produced by a renderer. Content is emitted verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup(String);

impl Markup {
  pub fn new(html: impl Into<String>) -> Self {
    Self(html.into())
  }

  pub fn empty() -> Self {
    Self(String::new())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn into_string(self) -> String {
    self.0
  }
}

impl fmt::Display for Markup {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<String> for Markup {
  fn from(html: String) -> Self {
    Self(html)
  }
}

impl From<&str> for Markup {
  fn from(html: &str) -> Self {
    Self(html.to_string())
  }
}

#[derive(Debug, Clone, Error)]
pub enum RenderError {
  #[error("{0}")]
  Failed(String),

  #[error("renderer panicked: {0}")]
  Panicked(String),
}

impl RenderError {
  pub fn new(message: impl Into<String>) -> Self {
    Self::Failed(message.into())
  }

  pub fn message(&self) -> &str {
    match self {
      Self::Failed(m) | Self::Panicked(m) => m,
    }
  }
}

/// A concrete renderer for one block variant.
pub trait BlockRenderer: Send + Sync {
  fn render(&self, props: &Props) -> Result<Markup, RenderError>;
}

impl<F> BlockRenderer for F
where
  F: Fn(&Props) -> Result<Markup, RenderError> + Send + Sync,
{
  fn render(&self, props: &Props) -> Result<Markup, RenderError> {
    self(props)
  }
}

pub type SharedRenderer = Arc<dyn BlockRenderer>;

/// Renders nothing and never fails. Stands in for unknown block/variant pairs.
pub struct NoopRenderer;

impl BlockRenderer for NoopRenderer {
  fn render(&self, _props: &Props) -> Result<Markup, RenderError> {
    Ok(Markup::empty())
  }
}

pub const SPINNER_HTML: &str =
  r#"<div class="block-loading" role="status" aria-busy="true"><span class="spinner"></span></div>"#;

/// Generic loading indicator, used when neither caller nor registry names a placeholder.
pub struct Spinner;

impl BlockRenderer for Spinner {
  fn render(&self, _props: &Props) -> Result<Markup, RenderError> {
    Ok(Markup::new(SPINNER_HTML))
  }
}

/// Renders the same fragment regardless of props.
pub struct StaticRenderer(Markup);

impl StaticRenderer {
  pub fn new(html: impl Into<Markup>) -> Self {
    Self(html.into())
  }

  pub fn shared(html: impl Into<Markup>) -> SharedRenderer {
    Arc::new(Self::new(html))
  }
}

impl BlockRenderer for StaticRenderer {
  fn render(&self, _props: &Props) -> Result<Markup, RenderError> {
    Ok(self.0.clone())
  }
}
