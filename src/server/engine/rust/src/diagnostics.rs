/* src/server/engine/rust/src/diagnostics.rs */

//! Structured warnings for development builds.
//!
//! Nothing in the engine raises on bad configuration or failing blocks. Instead
//! it reports a [`Diagnostic`], which is logged through `tracing` and forwarded
//! to an optional [`DiagnosticSink`]. Production mode suppresses both.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
  #[default]
  Development,
  Production,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum Diagnostic {
  #[serde(rename_all = "camelCase")]
  UnknownPage { page_id: String },

  #[serde(rename_all = "camelCase")]
  UnknownVariant {
    block_type: String,
    variant_name: String,
    known: Vec<String>,
    suggestions: Vec<String>,
  },

  #[serde(rename_all = "camelCase")]
  BlockFault { block_key: String, message: String, render_conflict: bool },
}

pub trait DiagnosticSink: Send + Sync {
  fn report(&self, diagnostic: &Diagnostic);
}

/// Keeps every reported diagnostic in memory.
#[derive(Default)]
pub struct MemorySink {
  events: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn events(&self) -> Vec<Diagnostic> {
    self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
  }
}

impl DiagnosticSink for MemorySink {
  fn report(&self, diagnostic: &Diagnostic) {
    self.events.lock().unwrap_or_else(PoisonError::into_inner).push(diagnostic.clone());
  }
}

#[derive(Clone, Default)]
pub struct Diagnostics {
  mode: RuntimeMode,
  sink: Option<Arc<dyn DiagnosticSink>>,
}

impl Diagnostics {
  pub fn new(mode: RuntimeMode) -> Self {
    Self { mode, sink: None }
  }

  pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
    self.sink = Some(sink);
    self
  }

  pub fn mode(&self) -> RuntimeMode {
    self.mode
  }

  pub fn is_enabled(&self) -> bool {
    self.mode == RuntimeMode::Development
  }

  pub fn emit(&self, diagnostic: Diagnostic) {
    if !self.is_enabled() {
      return;
    }
    match &diagnostic {
      Diagnostic::UnknownPage { page_id } => {
        warn!(page_id = %page_id, "unknown page, rendering nothing");
      }
      Diagnostic::UnknownVariant { block_type, variant_name, known, suggestions } => {
        warn!(
          block_type = %block_type,
          variant = %variant_name,
          known = ?known,
          suggestions = ?suggestions,
          "unknown block variant, rendering nothing"
        );
      }
      Diagnostic::BlockFault { block_key, message, render_conflict } => {
        warn!(block = %block_key, render_conflict, error = %message, "block faulted, showing fallback");
      }
    }
    if let Some(ref sink) = self.sink {
      sink.report(&diagnostic);
    }
  }
}
