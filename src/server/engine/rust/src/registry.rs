/* src/server/engine/rust/src/registry.rs */

//! Block type -> variant name -> lazily loaded renderer.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;

use crate::markup::{BlockRenderer, SharedRenderer};

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Asynchronous zero-argument factory producing a renderer.
pub type LoaderFn = Arc<dyn Fn() -> BoxFuture<Result<SharedRenderer, LoadError>> + Send + Sync>;

/// A loader that failed. Cloned to every caller sharing the memoized result.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct LoadError {
  message: String,
}

impl LoadError {
  pub fn new(message: impl Into<String>) -> Self {
    Self { message: message.into() }
  }

  pub fn message(&self) -> &str {
    &self.message
  }
}

/// One renderable variant of one block type.
#[derive(Clone)]
pub struct VariantEntry {
  loader: LoaderFn,
  render_on_server: bool,
  use_suspense: bool,
  loading_placeholder: Option<SharedRenderer>,
}

impl VariantEntry {
  /// Entry backed by an async loader. The resolver invokes it at most once.
  pub fn lazy<F, Fut>(loader: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<SharedRenderer, LoadError>> + Send + 'static,
  {
    let loader: LoaderFn =
      Arc::new(move || -> BoxFuture<Result<SharedRenderer, LoadError>> { Box::pin(loader()) });
    Self { loader, render_on_server: true, use_suspense: false, loading_placeholder: None }
  }

  /// Entry whose renderer is available without waiting.
  pub fn ready<R: BlockRenderer + 'static>(renderer: R) -> Self {
    let renderer: SharedRenderer = Arc::new(renderer);
    Self::lazy(move || {
      let renderer = renderer.clone();
      async move { Ok::<SharedRenderer, LoadError>(renderer) }
    })
  }

  /// Skip server rendering; the server emits the loading placeholder instead.
  pub fn client_only(mut self) -> Self {
    self.render_on_server = false;
    self
  }

  /// Defer this variant behind a suspension scope even when the page does not ask for one.
  pub fn suspense(mut self) -> Self {
    self.use_suspense = true;
    self
  }

  pub fn placeholder(mut self, placeholder: SharedRenderer) -> Self {
    self.loading_placeholder = Some(placeholder);
    self
  }

  pub fn render_on_server(&self) -> bool {
    self.render_on_server
  }

  pub fn uses_suspense(&self) -> bool {
    self.use_suspense
  }

  pub fn loading_placeholder(&self) -> Option<&SharedRenderer> {
    self.loading_placeholder.as_ref()
  }

  pub(crate) fn loader(&self) -> &LoaderFn {
    &self.loader
  }
}

/// Static variant table, built once at startup and shared read-only afterwards.
/// Iteration follows registration order.
#[derive(Clone, Default)]
pub struct VariantRegistry {
  blocks: IndexMap<String, IndexMap<String, VariantEntry>>,
}

impl VariantRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a variant. Re-registering a pair replaces the entry and keeps its position.
  pub fn variant(
    mut self,
    block_type: impl Into<String>,
    name: impl Into<String>,
    entry: VariantEntry,
  ) -> Self {
    self.blocks.entry(block_type.into()).or_default().insert(name.into(), entry);
    self
  }

  pub fn get(&self, block_type: &str, variant: &str) -> Option<&VariantEntry> {
    self.blocks.get(block_type)?.get(variant)
  }

  pub fn contains_block(&self, block_type: &str) -> bool {
    self.blocks.contains_key(block_type)
  }

  pub fn block_types(&self) -> impl Iterator<Item = &str> {
    self.blocks.keys().map(String::as_str)
  }

  /// Known variant names for a block type, in registration order.
  pub fn variant_names(&self, block_type: &str) -> Vec<&str> {
    self
      .blocks
      .get(block_type)
      .map(|variants| variants.keys().map(String::as_str).collect())
      .unwrap_or_default()
  }

  /// Total number of registered variants across all block types.
  pub fn len(&self) -> usize {
    self.blocks.values().map(IndexMap::len).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}
