/* src/server/engine/rust/src/resolver.rs */

//! Component resolution: (block type, variant) -> memoized renderer handle.
//!
//! Resolution never fails. A pair missing from the registry resolves to a
//! no-op component and a development diagnostic with the closest known
//! variant names.
//!
//! The cache is append-only and written under a lock, so every key maps to
//! exactly one [`ResolvedComponent`] for the resolver's lifetime. Loaders are
//! single-flight: concurrent first loads of the same key share one execution.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::FutureExt;
use tokio::sync::OnceCell;

use crate::boundary::panic_message;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::markup::{Markup, NoopRenderer, Props, SharedRenderer, Spinner};
use crate::registry::{LoadError, LoaderFn, VariantEntry, VariantRegistry};
use crate::suggest::{closest, SUGGESTION_LIMIT};

/// Cache and fault-boundary identity for a block/variant pair.
pub fn cache_key(block_type: &str, variant: &str) -> String {
  format!("{block_type}:{variant}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
  Loading,
  Ready,
  Failed,
}

/// Memoized renderer for one (block type, variant) pair, owned by the cache.
pub struct ResolvedComponent {
  key: String,
  block_type: String,
  variant: String,
  loader: Option<LoaderFn>,
  render_on_server: bool,
  use_suspense: bool,
  placeholder: Option<SharedRenderer>,
  loaded: OnceCell<Result<SharedRenderer, LoadError>>,
}

impl ResolvedComponent {
  fn registered(block_type: &str, variant: &str, entry: &VariantEntry) -> Self {
    Self {
      key: cache_key(block_type, variant),
      block_type: block_type.to_string(),
      variant: variant.to_string(),
      loader: Some(entry.loader().clone()),
      render_on_server: entry.render_on_server(),
      use_suspense: entry.uses_suspense(),
      placeholder: entry.loading_placeholder().cloned(),
      loaded: OnceCell::new(),
    }
  }

  fn missing(block_type: &str, variant: &str) -> Self {
    let noop: SharedRenderer = Arc::new(NoopRenderer);
    Self {
      key: cache_key(block_type, variant),
      block_type: block_type.to_string(),
      variant: variant.to_string(),
      loader: None,
      render_on_server: true,
      use_suspense: false,
      placeholder: None,
      loaded: OnceCell::new_with(Some(Ok(noop))),
    }
  }

  pub fn key(&self) -> &str {
    &self.key
  }

  pub fn block_type(&self) -> &str {
    &self.block_type
  }

  pub fn variant(&self) -> &str {
    &self.variant
  }

  pub fn is_missing(&self) -> bool {
    self.loader.is_none()
  }

  pub fn state(&self) -> LoadState {
    match self.loaded.get() {
      None => LoadState::Loading,
      Some(Ok(_)) => LoadState::Ready,
      Some(Err(_)) => LoadState::Failed,
    }
  }

  /// Settled load result, if any, without waiting.
  pub fn peek(&self) -> Option<Result<SharedRenderer, LoadError>> {
    self.loaded.get().cloned()
  }

  /// Load the renderer. The first caller runs the loader; everyone else shares its result.
  /// A panicking loader settles as a failed load.
  pub async fn load(&self) -> Result<SharedRenderer, LoadError> {
    self
      .loaded
      .get_or_init(|| async {
        let Some(ref loader) = self.loader else {
          return Ok(Arc::new(NoopRenderer) as SharedRenderer);
        };
        let future = match panic::catch_unwind(AssertUnwindSafe(|| loader())) {
          Ok(future) => future,
          Err(payload) => return Err(loader_panicked(payload.as_ref())),
        };
        AssertUnwindSafe(future)
          .catch_unwind()
          .await
          .unwrap_or_else(|payload| Err(loader_panicked(payload.as_ref())))
      })
      .await
      .clone()
  }
}

fn loader_panicked(payload: &(dyn Any + Send)) -> LoadError {
  LoadError::new(format!("loader panicked: {}", panic_message(payload)))
}

/// Caller-level settings; they take precedence over the registry entry.
#[derive(Clone, Default)]
pub struct ResolveOverrides {
  pub render_on_server: Option<bool>,
  pub loading_placeholder: Option<SharedRenderer>,
}

/// A caller's view of a cached component with effective rendering settings.
#[derive(Clone)]
pub struct RendererHandle {
  component: Arc<ResolvedComponent>,
  render_on_server: bool,
  placeholder: SharedRenderer,
}

impl RendererHandle {
  fn new(component: Arc<ResolvedComponent>, overrides: &ResolveOverrides) -> Self {
    let render_on_server = overrides.render_on_server.unwrap_or(component.render_on_server);
    let placeholder = overrides
      .loading_placeholder
      .clone()
      .or_else(|| component.placeholder.clone())
      .unwrap_or_else(|| Arc::new(Spinner));
    Self { component, render_on_server, placeholder }
  }

  pub fn component(&self) -> &Arc<ResolvedComponent> {
    &self.component
  }

  pub fn key(&self) -> &str {
    self.component.key()
  }

  pub fn is_missing(&self) -> bool {
    self.component.is_missing()
  }

  pub fn state(&self) -> LoadState {
    self.component.state()
  }

  pub fn render_on_server(&self) -> bool {
    self.render_on_server
  }

  pub fn uses_suspense(&self) -> bool {
    self.component.use_suspense
  }

  pub async fn load(&self) -> Result<SharedRenderer, LoadError> {
    self.component.load().await
  }

  /// Loading placeholder markup. A failing placeholder renders nothing.
  pub fn render_placeholder(&self, props: &Props) -> Markup {
    self.placeholder.render(props).unwrap_or_default()
  }
}

/// Append-only memo of resolved components.
#[derive(Default)]
pub struct ResolutionCache {
  entries: Mutex<HashMap<String, Arc<ResolvedComponent>>>,
}

impl ResolutionCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn contains(&self, key: &str) -> bool {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner).contains_key(key)
  }

  /// Return the cached component for `key`, building it on first request.
  /// The flag is true when this call inserted it.
  fn get_or_insert_with(
    &self,
    key: &str,
    build: impl FnOnce() -> ResolvedComponent,
  ) -> (Arc<ResolvedComponent>, bool) {
    let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(existing) = entries.get(key) {
      return (existing.clone(), false);
    }
    let component = Arc::new(build());
    entries.insert(key.to_string(), component.clone());
    (component, true)
  }
}

pub struct ComponentResolver {
  registry: Arc<VariantRegistry>,
  cache: ResolutionCache,
  diagnostics: Diagnostics,
}

impl ComponentResolver {
  pub fn new(registry: Arc<VariantRegistry>) -> Self {
    Self { registry, cache: ResolutionCache::new(), diagnostics: Diagnostics::default() }
  }

  pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
    self.diagnostics = diagnostics;
    self
  }

  pub fn registry(&self) -> &VariantRegistry {
    &self.registry
  }

  pub fn cache(&self) -> &ResolutionCache {
    &self.cache
  }

  pub fn diagnostics(&self) -> &Diagnostics {
    &self.diagnostics
  }

  pub fn resolve(&self, block_type: &str, variant: &str) -> RendererHandle {
    self.resolve_with(block_type, variant, &ResolveOverrides::default())
  }

  pub fn resolve_with(
    &self,
    block_type: &str,
    variant: &str,
    overrides: &ResolveOverrides,
  ) -> RendererHandle {
    let key = cache_key(block_type, variant);
    let (component, inserted) =
      self.cache.get_or_insert_with(&key, || match self.registry.get(block_type, variant) {
        Some(entry) => ResolvedComponent::registered(block_type, variant, entry),
        None => ResolvedComponent::missing(block_type, variant),
      });
    if inserted && component.is_missing() {
      self.report_unknown(block_type, variant);
    }
    RendererHandle::new(component, overrides)
  }

  fn report_unknown(&self, block_type: &str, variant: &str) {
    if !self.diagnostics.is_enabled() {
      return;
    }
    let known = self.registry.variant_names(block_type);
    let suggestions = closest(variant, known.iter().copied(), SUGGESTION_LIMIT);
    self.diagnostics.emit(Diagnostic::UnknownVariant {
      block_type: block_type.to_string(),
      variant_name: variant.to_string(),
      known: known.iter().map(|s| s.to_string()).collect(),
      suggestions: suggestions.iter().map(|s| s.to_string()).collect(),
    });
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::time::Duration;

  use super::*;
  use crate::diagnostics::{MemorySink, RuntimeMode};
  use crate::markup::StaticRenderer;
  use crate::registry::BoxFuture;

  fn counting_entry(counter: Arc<AtomicUsize>, html: &'static str) -> VariantEntry {
    VariantEntry::lazy(move || {
      let counter = counter.clone();
      async move {
        counter.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok::<SharedRenderer, LoadError>(StaticRenderer::shared(html))
      }
    })
  }

  fn resolver_with(registry: VariantRegistry) -> (ComponentResolver, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let diagnostics = Diagnostics::new(RuntimeMode::Development).with_sink(sink.clone());
    (ComponentResolver::new(Arc::new(registry)).with_diagnostics(diagnostics), sink)
  }

  #[tokio::test]
  async fn repeated_resolution_shares_one_load() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry =
      VariantRegistry::new().variant("hero", "default", counting_entry(calls.clone(), "<h1>"));
    let (resolver, _) = resolver_with(registry);

    let first = resolver.resolve("hero", "default");
    let second = resolver.resolve("hero", "default");
    assert!(Arc::ptr_eq(first.component(), second.component()));
    assert_eq!(first.state(), LoadState::Loading);
    assert_eq!(calls.load(Ordering::SeqCst), 0, "resolution alone must not load");

    let (a, b) = tokio::join!(first.load(), second.load());
    assert!(a.is_ok() && b.is_ok());
    first.load().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(second.state(), LoadState::Ready);
    assert_eq!(resolver.cache().len(), 1);
    assert!(resolver.cache().contains("hero:default"));
  }

  #[tokio::test]
  async fn unknown_pair_is_silent_noop() {
    let (resolver, _) = resolver_with(VariantRegistry::new());
    let handle = resolver.resolve("nonexistent-type", "nonexistent-variant");
    assert!(handle.is_missing());
    assert_eq!(handle.state(), LoadState::Ready);
    let renderer = handle.load().await.unwrap();
    assert!(renderer.render(&Props::new()).unwrap().is_empty());
  }

  #[test]
  fn unknown_variant_reports_suggestions_once() {
    let registry = VariantRegistry::new()
      .variant("hero", "default", VariantEntry::ready(StaticRenderer::new("a")))
      .variant("hero", "compact", VariantEntry::ready(StaticRenderer::new("b")))
      .variant("hero", "expanded", VariantEntry::ready(StaticRenderer::new("c")));
    let (resolver, sink) = resolver_with(registry);

    resolver.resolve("hero", "defualt");
    resolver.resolve("hero", "defualt");

    let events = sink.events();
    assert_eq!(events.len(), 1);
    let Diagnostic::UnknownVariant { block_type, variant_name, known, suggestions } = &events[0]
    else {
      panic!("expected unknown-variant, got {:?}", events[0]);
    };
    assert_eq!(block_type, "hero");
    assert_eq!(variant_name, "defualt");
    assert_eq!(known, &vec!["default".to_string(), "compact".into(), "expanded".into()]);
    assert_eq!(suggestions.len(), 3);
    assert_eq!(suggestions[0], "default");
  }

  #[test]
  fn production_resolution_stays_quiet() {
    let sink = Arc::new(MemorySink::new());
    let resolver = ComponentResolver::new(Arc::new(VariantRegistry::new()))
      .with_diagnostics(Diagnostics::new(RuntimeMode::Production).with_sink(sink.clone()));
    assert!(resolver.resolve("hero", "x").is_missing());
    assert!(sink.events().is_empty());
  }

  #[tokio::test]
  async fn failed_loader_is_memoized() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let registry = VariantRegistry::new().variant(
      "pricing",
      "cards",
      VariantEntry::lazy(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Err::<SharedRenderer, _>(LoadError::new("network down")) }
      }),
    );
    let (resolver, _) = resolver_with(registry);
    let handle = resolver.resolve("pricing", "cards");
    assert_eq!(handle.load().await.err().unwrap().message(), "network down");
    assert!(handle.load().await.is_err());
    assert_eq!(handle.state(), LoadState::Failed);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  fn decode_chunk() -> Result<SharedRenderer, LoadError> {
    panic!("chunk decode failed")
  }

  #[tokio::test]
  async fn panicking_loader_settles_as_failed() {
    let registry = VariantRegistry::new()
      .variant(
        "pricing",
        "remote",
        VariantEntry::lazy(|| async {
          tokio::task::yield_now().await;
          decode_chunk()
        }),
      )
      .variant(
        "pricing",
        "eager",
        VariantEntry::lazy(|| -> BoxFuture<Result<SharedRenderer, LoadError>> {
          panic!("factory blew up")
        }),
      );
    let (resolver, _) = resolver_with(registry);

    let remote = resolver.resolve("pricing", "remote");
    let err = remote.load().await.err().unwrap();
    assert_eq!(err.message(), "loader panicked: chunk decode failed");
    assert_eq!(remote.state(), LoadState::Failed);
    assert!(remote.load().await.is_err());

    let eager = resolver.resolve("pricing", "eager");
    assert_eq!(eager.load().await.err().unwrap().message(), "loader panicked: factory blew up");
  }

  #[test]
  fn precedence_caller_over_entry_over_default() {
    let registry = VariantRegistry::new()
      .variant("hero", "plain", VariantEntry::ready(StaticRenderer::new("h")))
      .variant(
        "pricing",
        "table",
        VariantEntry::ready(StaticRenderer::new("t"))
          .client_only()
          .placeholder(StaticRenderer::shared("<p>entry</p>")),
      );
    let (resolver, _) = resolver_with(registry);
    let props = Props::new();

    let plain = resolver.resolve("hero", "plain");
    assert!(plain.render_on_server());
    assert_eq!(plain.render_placeholder(&props).as_str(), crate::markup::SPINNER_HTML);

    let table = resolver.resolve("pricing", "table");
    assert!(!table.render_on_server());
    assert_eq!(table.render_placeholder(&props).as_str(), "<p>entry</p>");

    let overridden = resolver.resolve_with(
      "pricing",
      "table",
      &ResolveOverrides {
        render_on_server: Some(true),
        loading_placeholder: Some(StaticRenderer::shared("<p>caller</p>")),
      },
    );
    assert!(overridden.render_on_server());
    assert_eq!(overridden.render_placeholder(&props).as_str(), "<p>caller</p>");
    assert!(Arc::ptr_eq(overridden.component(), table.component()));
  }
}
