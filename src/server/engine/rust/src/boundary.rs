/* src/server/engine/rust/src/boundary.rs */

//! Per-block fault isolation.
//!
//! A [`FaultBoundary`] runs one block's render. Errors and panics are captured
//! and replaced by fallback markup, so siblings and the page shell are never
//! affected. A faulted boundary stays faulted until its identity key changes.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::OnceLock;

use regex::Regex;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::markup::{Markup, RenderError};

/// Shown instead of the generic fallback when a block died from a render conflict.
pub const RENDER_CONFLICT_FALLBACK: &str = r#"<div class="block-fault" role="alert"><p>This section was changed by a browser extension, such as automatic page translation. Reload the page to restore it.</p></div>"#;

fn render_conflict_pattern() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(
      r"(?i)(failed to execute '(removeChild|insertBefore|replaceChild)' on 'Node')|(node to be (removed|replaced|inserted)[^.]* is not a child of this node)|(NotFoundError.*(removeChild|insertBefore))",
    )
    .expect("render conflict pattern")
  })
}

/// True when a failure message carries the signature of two render passes
/// mutating the same subtree.
pub fn is_render_conflict(message: &str) -> bool {
  render_conflict_pattern().is_match(message)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
  pub message: String,
  pub render_conflict: bool,
}

impl Fault {
  fn new(message: impl Into<String>) -> Self {
    let message = message.into();
    let render_conflict = is_render_conflict(&message);
    Self { message, render_conflict }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryState {
  Healthy,
  Faulted(Fault),
}

#[derive(Debug, Clone)]
pub struct FaultBoundary {
  key: String,
  state: BoundaryState,
  fallback: Option<Markup>,
}

impl FaultBoundary {
  pub fn new(key: impl Into<String>, fallback: Option<Markup>) -> Self {
    Self { key: key.into(), state: BoundaryState::Healthy, fallback }
  }

  pub fn key(&self) -> &str {
    &self.key
  }

  pub fn state(&self) -> &BoundaryState {
    &self.state
  }

  pub fn is_faulted(&self) -> bool {
    matches!(self.state, BoundaryState::Faulted(_))
  }

  /// Change identity. A different key discards any captured fault.
  pub fn set_key(&mut self, key: impl Into<String>) {
    let key = key.into();
    if key != self.key {
      self.key = key;
      self.state = BoundaryState::Healthy;
    }
  }

  /// Record a failure that happened outside `render`, e.g. a failed load.
  pub fn capture(&mut self, message: impl Into<String>, diagnostics: &Diagnostics) {
    let fault = Fault::new(message);
    diagnostics.emit(Diagnostic::BlockFault {
      block_key: self.key.clone(),
      message: fault.message.clone(),
      render_conflict: fault.render_conflict,
    });
    self.state = BoundaryState::Faulted(fault);
  }

  /// Run `child` while healthy; once faulted, only the fallback is produced.
  pub fn render<F>(&mut self, child: F, diagnostics: &Diagnostics) -> Markup
  where
    F: FnOnce() -> Result<Markup, RenderError>,
  {
    if self.is_faulted() {
      return self.fallback_markup();
    }
    let outcome = panic::catch_unwind(AssertUnwindSafe(child))
      .unwrap_or_else(|payload| Err(RenderError::Panicked(panic_message(payload.as_ref()))));
    match outcome {
      Ok(markup) => markup,
      Err(err) => {
        self.capture(err.message(), diagnostics);
        self.fallback_markup()
      }
    }
  }

  /// Markup shown while faulted.
  pub fn fallback_markup(&self) -> Markup {
    match self.state {
      BoundaryState::Faulted(ref fault) if fault.render_conflict => {
        Markup::new(RENDER_CONFLICT_FALLBACK)
      }
      _ => self.fallback.clone().unwrap_or_default(),
    }
  }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(s) = payload.downcast_ref::<&str>() {
    (*s).to_string()
  } else if let Some(s) = payload.downcast_ref::<String>() {
    s.clone()
  } else {
    "unknown panic".to_string()
  }
}
