/* src/server/engine/rust/src/compose.rs */

//! Page composition: manifest order -> resolved, boundary-wrapped blocks.
//!
//! Every slot keeps its declared position no matter how long its loader takes.
//! With the suspense contract a slot shows its fallback until its own loader
//! settles; siblings never wait for one another.

use std::sync::Arc;

use futures_util::future::join_all;
use futures_util::stream::{BoxStream, FuturesUnordered, StreamExt};
use serde::Serialize;

use crate::boundary::FaultBoundary;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::manifest::PageManifest;
use crate::markup::{Markup, Props, RenderError, SharedRenderer};
use crate::registry::LoadError;
use crate::resolver::{ComponentResolver, LoadState, RendererHandle};

#[derive(Debug, Clone, Default)]
pub struct ComposeOptions {
  /// Wrap every block in its own suspension scope.
  pub use_suspense: bool,
  /// Shown by suspended blocks until their loader settles. Defaults to nothing.
  pub fallback_ui: Option<Markup>,
  /// Shown by faulted blocks. Defaults to nothing.
  pub fault_fallback: Option<Markup>,
}

/// Cooperative suspension scope, nested inside a block's fault boundary.
#[derive(Debug, Clone)]
pub struct SuspenseScope {
  fallback: Markup,
}

impl SuspenseScope {
  pub fn fallback(&self) -> &Markup {
    &self.fallback
  }
}

/// One slot of a composed page.
pub struct WrappedBlock {
  index: usize,
  block_type: String,
  variant: Option<String>,
  props: Props,
  handle: RendererHandle,
  boundary: FaultBoundary,
  suspense: Option<SuspenseScope>,
  diagnostics: Diagnostics,
}

impl WrappedBlock {
  pub fn index(&self) -> usize {
    self.index
  }

  pub fn block_type(&self) -> &str {
    &self.block_type
  }

  pub fn variant(&self) -> Option<&str> {
    self.variant.as_deref()
  }

  /// Boundary identity, "{block_type}:{variant}".
  pub fn key(&self) -> &str {
    self.boundary.key()
  }

  pub fn props(&self) -> &Props {
    &self.props
  }

  pub fn props_mut(&mut self) -> &mut Props {
    &mut self.props
  }

  pub fn handle(&self) -> &RendererHandle {
    &self.handle
  }

  pub fn boundary(&self) -> &FaultBoundary {
    &self.boundary
  }

  pub fn suspense(&self) -> Option<&SuspenseScope> {
    self.suspense.as_ref()
  }

  pub fn is_suspended(&self) -> bool {
    self.suspense.is_some()
  }

  pub fn is_client_only(&self) -> bool {
    !self.handle.render_on_server()
  }

  pub fn state(&self) -> LoadState {
    self.handle.state()
  }

  /// Whatever this slot can show without waiting: content when loaded,
  /// otherwise the suspense fallback or the variant's loading placeholder.
  pub fn render_now(&mut self) -> Markup {
    if self.is_client_only() {
      return self.handle.render_placeholder(&self.props);
    }
    let settled = self.handle.component().peek();
    match settled {
      Some(loaded) => self.finish(loaded),
      None => self.pending_markup(),
    }
  }

  /// Wait for the loader, then render inside the fault boundary.
  pub async fn render(&mut self) -> Markup {
    if self.is_client_only() {
      return self.handle.render_placeholder(&self.props);
    }
    if self.boundary.is_faulted() {
      return self.boundary.fallback_markup();
    }
    let loaded = self.handle.load().await;
    self.finish(loaded)
  }

  /// Point this slot at another variant. A new key resets the fault boundary.
  pub fn swap(&mut self, handle: RendererHandle, variant: Option<String>) {
    self.boundary.set_key(handle.key());
    self.handle = handle;
    self.variant = variant;
  }

  pub fn summary(&self) -> BlockSummary {
    BlockSummary {
      key: self.key().to_string(),
      block_type: self.block_type.clone(),
      variant: self.variant.clone(),
      client_only: self.is_client_only(),
      suspended: self.is_suspended(),
    }
  }

  fn finish(&mut self, loaded: Result<SharedRenderer, LoadError>) -> Markup {
    let props = &self.props;
    self.boundary.render(
      || {
        let renderer = loaded.map_err(|e| RenderError::new(format!("load failed: {e}")))?;
        renderer.render(props)
      },
      &self.diagnostics,
    )
  }

  fn pending_markup(&self) -> Markup {
    match self.suspense {
      Some(ref scope) => scope.fallback.clone(),
      None => self.handle.render_placeholder(&self.props),
    }
  }
}

/// Client-facing description of a slot, embedded in hydration data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSummary {
  pub key: String,
  pub block_type: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub variant: Option<String>,
  pub client_only: bool,
  pub suspended: bool,
}

/// Late content for a suspended slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotFill {
  pub index: usize,
  pub key: String,
  pub markup: Markup,
}

/// Streamed rendering: an ordered shell now, fills as loaders settle.
pub struct StreamedPage {
  pub page_id: String,
  pub blocks: Vec<BlockSummary>,
  pub shell: Vec<Markup>,
  pub fills: BoxStream<'static, SlotFill>,
}

impl StreamedPage {
  /// Drain every fill and return the final markup in declared order.
  pub async fn settle(self) -> Vec<Markup> {
    let mut slots = self.shell;
    let mut fills = self.fills;
    while let Some(fill) = fills.next().await {
      if let Some(slot) = slots.get_mut(fill.index) {
        *slot = fill.markup;
      }
    }
    slots
  }
}

pub struct ComposedPage {
  page_id: String,
  blocks: Vec<WrappedBlock>,
}

impl ComposedPage {
  pub fn empty(page_id: impl Into<String>) -> Self {
    Self { page_id: page_id.into(), blocks: Vec::new() }
  }

  pub fn page_id(&self) -> &str {
    &self.page_id
  }

  pub fn len(&self) -> usize {
    self.blocks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.blocks.is_empty()
  }

  pub fn blocks(&self) -> &[WrappedBlock] {
    &self.blocks
  }

  pub fn blocks_mut(&mut self) -> &mut [WrappedBlock] {
    &mut self.blocks
  }

  pub fn summaries(&self) -> Vec<BlockSummary> {
    self.blocks.iter().map(WrappedBlock::summary).collect()
  }

  /// Render every block, loading concurrently. Output follows declared order.
  pub async fn render(&mut self) -> Vec<Markup> {
    join_all(self.blocks.iter_mut().map(|block| block.render())).await
  }

  /// Render non-suspended blocks into the shell and defer the rest to `fills`.
  pub async fn stream(self) -> StreamedPage {
    let blocks = self.summaries();
    let mut shell = Vec::with_capacity(self.blocks.len());
    let mut waiting = Vec::new();
    let mut deferred = Vec::new();

    for mut block in self.blocks {
      if !block.is_suspended() {
        shell.push(Markup::empty());
        waiting.push(block);
        continue;
      }
      shell.push(block.render_now());
      if block.state() == LoadState::Loading && !block.is_client_only() {
        deferred.push(block);
      }
    }

    let rendered = join_all(
      waiting.iter_mut().map(|block| async move { (block.index(), block.render().await) }),
    )
    .await;
    for (index, markup) in rendered {
      shell[index] = markup;
    }

    let fills: FuturesUnordered<_> = deferred
      .into_iter()
      .map(|mut block| async move {
        let markup = block.render().await;
        SlotFill { index: block.index(), key: block.key().to_string(), markup }
      })
      .collect();

    StreamedPage { page_id: self.page_id, blocks, shell, fills: fills.boxed() }
  }
}

/// Walks a page's declared order and wraps each resolved block.
pub struct PageComposer {
  resolver: Arc<ComponentResolver>,
  manifest: Arc<PageManifest>,
}

impl PageComposer {
  pub fn new(resolver: Arc<ComponentResolver>, manifest: Arc<PageManifest>) -> Self {
    Self { resolver, manifest }
  }

  pub fn resolver(&self) -> &Arc<ComponentResolver> {
    &self.resolver
  }

  pub fn manifest(&self) -> &Arc<PageManifest> {
    &self.manifest
  }

  /// Compose a page. An unknown page yields an empty composition.
  pub fn compose(&self, page_id: &str, options: &ComposeOptions) -> ComposedPage {
    let diagnostics = self.resolver.diagnostics();
    let Some(entry) = self.manifest.get(page_id) else {
      diagnostics.emit(Diagnostic::UnknownPage { page_id: page_id.to_string() });
      return ComposedPage::empty(page_id);
    };

    let blocks = entry
      .order
      .iter()
      .enumerate()
      .map(|(index, block_type)| {
        let variant = entry.variant_for(block_type);
        let handle = self.resolver.resolve(block_type, variant.unwrap_or_default());
        let boundary = FaultBoundary::new(handle.key(), options.fault_fallback.clone());
        let suspense = (options.use_suspense || handle.uses_suspense()).then(|| SuspenseScope {
          fallback: options.fallback_ui.clone().unwrap_or_default(),
        });
        WrappedBlock {
          index,
          block_type: block_type.clone(),
          variant: variant.map(String::from),
          props: entry.props_for(block_type),
          handle,
          boundary,
          suspense,
          diagnostics: diagnostics.clone(),
        }
      })
      .collect();

    ComposedPage { page_id: page_id.to_string(), blocks }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::time::Duration;

  use serde_json::json;

  use super::*;
  use crate::boundary::BoundaryState;
  use crate::diagnostics::{MemorySink, RuntimeMode};
  use crate::manifest::PageEntry;
  use crate::markup::StaticRenderer;
  use crate::registry::{VariantEntry, VariantRegistry};

  fn echo(tag: &'static str) -> VariantEntry {
    VariantEntry::ready(move |props: &Props| -> Result<Markup, RenderError> {
      let text = props.get("text").and_then(|v| v.as_str()).unwrap_or(tag);
      Ok(Markup::new(format!("<{tag}>{text}</{tag}>")))
    })
  }

  fn delayed(ms: u64, html: &'static str) -> VariantEntry {
    VariantEntry::lazy(move || async move {
      tokio::time::sleep(Duration::from_millis(ms)).await;
      Ok::<SharedRenderer, LoadError>(StaticRenderer::shared(html))
    })
  }

  fn composer(registry: VariantRegistry, manifest: PageManifest) -> (PageComposer, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let diagnostics = Diagnostics::new(RuntimeMode::Development).with_sink(sink.clone());
    let resolver = ComponentResolver::new(Arc::new(registry)).with_diagnostics(diagnostics);
    (PageComposer::new(Arc::new(resolver), Arc::new(manifest)), sink)
  }

  fn basic_registry() -> VariantRegistry {
    VariantRegistry::new()
      .variant("hero", "default", echo("h1"))
      .variant("pricing", "cards", echo("ul"))
      .variant("footer", "default", echo("footer"))
  }

  #[tokio::test]
  async fn order_is_preserved() {
    let manifest = PageManifest::new().page(
      "home",
      PageEntry::new()
        .block("footer", "default")
        .block("hero", "default")
        .block("pricing", "cards")
        .props("hero", json!({"text": "Welcome"})),
    );
    let (composer, _) = composer(basic_registry(), manifest);
    let mut page = composer.compose("home", &ComposeOptions::default());
    assert_eq!(page.len(), 3);
    let keys: Vec<&str> = page.blocks().iter().map(WrappedBlock::key).collect();
    assert_eq!(keys, vec!["footer:default", "hero:default", "pricing:cards"]);

    let html: Vec<String> = page.render().await.into_iter().map(Markup::into_string).collect();
    assert_eq!(html, vec!["<footer>footer</footer>", "<h1>Welcome</h1>", "<ul>ul</ul>"]);
  }

  #[tokio::test]
  async fn empty_order_and_duplicates() {
    let manifest = PageManifest::new()
      .page("blank", PageEntry::new())
      .page("twice", PageEntry::new().block("hero", "default").block("hero", "default"));
    let (composer, _) = composer(basic_registry(), manifest);

    assert!(composer.compose("blank", &ComposeOptions::default()).is_empty());

    let mut twice = composer.compose("twice", &ComposeOptions::default());
    assert_eq!(twice.len(), 2);
    twice.blocks_mut()[0].props_mut().insert("text".into(), "first".into());
    let html = twice.render().await;
    assert_eq!(html[0].as_str(), "<h1>first</h1>");
    assert_eq!(html[1].as_str(), "<h1>h1</h1>");
  }

  #[tokio::test]
  async fn unknown_page_is_empty_and_reported() {
    let (composer, sink) = composer(basic_registry(), PageManifest::new());
    let mut page = composer.compose("NONEXISTENT", &ComposeOptions::default());
    assert!(page.is_empty());
    assert!(page.render().await.is_empty());
    assert_eq!(sink.events(), vec![Diagnostic::UnknownPage { page_id: "NONEXISTENT".into() }]);
  }

  #[tokio::test]
  async fn missing_selection_renders_nothing() {
    let manifest =
      PageManifest::new().page("home", PageEntry::new().block("hero", "default").slot("banner"));
    let (composer, sink) = composer(basic_registry(), manifest);
    let mut page = composer.compose("home", &ComposeOptions::default());
    assert_eq!(page.blocks()[1].key(), "banner:");
    assert_eq!(page.blocks()[1].variant(), None);
    let html = page.render().await;
    assert_eq!(html[0].as_str(), "<h1>h1</h1>");
    assert!(html[1].is_empty());
    assert!(matches!(sink.events()[0], Diagnostic::UnknownVariant { .. }));
  }

  #[tokio::test]
  async fn fault_in_one_block_is_isolated() {
    let registry = basic_registry().variant(
      "broken",
      "default",
      VariantEntry::ready(|_: &Props| -> Result<Markup, RenderError> { panic!("boom") }),
    );
    let manifest = PageManifest::new().page(
      "home",
      PageEntry::new().block("hero", "default").block("broken", "default").block("footer", "default"),
    );
    let (composer, sink) = composer(registry, manifest);
    let options =
      ComposeOptions { fault_fallback: Some(Markup::new("<p>oops</p>")), ..Default::default() };
    let mut page = composer.compose("home", &options);
    let html = page.render().await;
    assert_eq!(html[0].as_str(), "<h1>h1</h1>");
    assert_eq!(html[1].as_str(), "<p>oops</p>");
    assert_eq!(html[2].as_str(), "<footer>footer</footer>");
    assert!(page.blocks()[1].boundary().is_faulted());
    assert!(matches!(sink.events()[0], Diagnostic::BlockFault { .. }));
  }

  #[tokio::test]
  async fn failed_load_is_a_fault() {
    let registry = basic_registry().variant(
      "pricing",
      "remote",
      VariantEntry::lazy(|| async { Err::<SharedRenderer, _>(LoadError::new("chunk 404")) }),
    );
    let manifest = PageManifest::new()
      .page("home", PageEntry::new().block("pricing", "remote").block("footer", "default"));
    let (composer, _) = composer(registry, manifest);
    let mut page = composer.compose("home", &ComposeOptions::default());
    let html = page.render().await;
    assert!(html[0].is_empty());
    assert_eq!(html[1].as_str(), "<footer>footer</footer>");
    let BoundaryState::Faulted(fault) = page.blocks()[0].boundary().state() else {
      panic!("expected fault");
    };
    assert_eq!(fault.message, "load failed: chunk 404");
  }

  fn decode_chunk() -> Result<SharedRenderer, LoadError> {
    panic!("chunk decode failed")
  }

  fn panicking_registry() -> VariantRegistry {
    basic_registry().variant(
      "pricing",
      "remote",
      VariantEntry::lazy(|| async {
        tokio::task::yield_now().await;
        decode_chunk()
      }),
    )
  }

  #[tokio::test]
  async fn panicking_loader_is_contained_by_its_boundary() {
    let manifest = PageManifest::new().page(
      "home",
      PageEntry::new().block("hero", "default").block("pricing", "remote").block("footer", "default"),
    );
    let (composer, sink) = composer(panicking_registry(), manifest);
    let options =
      ComposeOptions { fault_fallback: Some(Markup::new("<p>oops</p>")), ..Default::default() };
    let mut page = composer.compose("home", &options);

    let (html, faulted) = tokio::spawn(async move {
      let html = page.render().await;
      (html, page.blocks()[1].boundary().is_faulted())
    })
    .await
    .unwrap();
    assert_eq!(html[0].as_str(), "<h1>h1</h1>");
    assert_eq!(html[1].as_str(), "<p>oops</p>");
    assert_eq!(html[2].as_str(), "<footer>footer</footer>");
    assert!(faulted);
    let events = sink.events();
    let Diagnostic::BlockFault { ref message, .. } = events[0] else {
      panic!("expected block fault");
    };
    assert_eq!(message, "load failed: loader panicked: chunk decode failed");
  }

  #[tokio::test]
  async fn panicking_loader_streams_fallback_fill() {
    let manifest = PageManifest::new()
      .page("home", PageEntry::new().block("hero", "default").block("pricing", "remote"));
    let (composer, _) = composer(panicking_registry(), manifest);
    let options = ComposeOptions {
      use_suspense: true,
      fallback_ui: Some(Markup::new("<i>wait</i>")),
      fault_fallback: Some(Markup::new("<p>oops</p>")),
    };
    let page = composer.compose("home", &options).stream().await;
    let html = tokio::spawn(page.settle()).await.unwrap();
    assert_eq!(html[0].as_str(), "<h1>h1</h1>");
    assert_eq!(html[1].as_str(), "<p>oops</p>");
  }

  #[tokio::test]
  async fn swapping_variant_recovers_faulted_slot() {
    let registry = basic_registry().variant(
      "hero",
      "broken",
      VariantEntry::ready(|_: &Props| -> Result<Markup, RenderError> {
        Err(RenderError::new("bad"))
      }),
    );
    let manifest = PageManifest::new().page("home", PageEntry::new().block("hero", "broken"));
    let (composer, _) = composer(registry, manifest);
    let mut page = composer.compose("home", &ComposeOptions::default());
    assert!(page.render().await[0].is_empty());
    assert!(page.blocks()[0].boundary().is_faulted());

    let replacement = composer.resolver().resolve("hero", "default");
    let block = &mut page.blocks_mut()[0];
    block.swap(replacement, Some("default".into()));
    assert!(!block.boundary().is_faulted());
    assert_eq!(block.render().await.as_str(), "<h1>h1</h1>");
  }

  #[tokio::test]
  async fn client_only_renders_placeholder_without_loading() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let registry = VariantRegistry::new().variant(
      "pricing",
      "table",
      VariantEntry::lazy(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Ok::<SharedRenderer, LoadError>(StaticRenderer::shared("<table>")) }
      })
      .client_only()
      .placeholder(StaticRenderer::shared("<p>loading plans</p>")),
    );
    let manifest = PageManifest::new().page("home", PageEntry::new().block("pricing", "table"));
    let (composer, _) = composer(registry, manifest);
    let mut page = composer.compose("home", &ComposeOptions::default());
    assert_eq!(page.render().await[0].as_str(), "<p>loading plans</p>");
    assert!(page.summaries()[0].client_only);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test(start_paused = true)]
  async fn suspended_siblings_do_not_wait_for_each_other() {
    let registry =
      VariantRegistry::new().variant("a", "slow", delayed(500, "<p>A</p>")).variant(
        "b",
        "fast",
        delayed(10, "<p>B</p>"),
      );
    let manifest =
      PageManifest::new().page("home", PageEntry::new().block("a", "slow").block("b", "fast"));
    let (composer, _) = composer(registry, manifest);
    let options = ComposeOptions {
      use_suspense: true,
      fallback_ui: Some(Markup::new("<p>…</p>")),
      ..Default::default()
    };

    let start = tokio::time::Instant::now();
    let page = composer.compose("home", &options).stream().await;
    assert_eq!(page.shell, vec![Markup::new("<p>…</p>"), Markup::new("<p>…</p>")]);
    assert!(page.blocks.iter().all(|b| b.suspended));

    let mut fills = page.fills;
    let first = fills.next().await.unwrap();
    assert_eq!((first.index, first.markup.as_str()), (1, "<p>B</p>"));
    assert!(start.elapsed() < Duration::from_millis(500));

    let second = fills.next().await.unwrap();
    assert_eq!((second.index, second.markup.as_str()), (0, "<p>A</p>"));
    assert!(start.elapsed() >= Duration::from_millis(500));
    assert!(fills.next().await.is_none());
  }

  #[tokio::test(start_paused = true)]
  async fn settled_stream_keeps_declared_order() {
    let registry = VariantRegistry::new()
      .variant("a", "slow", delayed(500, "<p>A</p>"))
      .variant("b", "fast", delayed(10, "<p>B</p>"))
      .variant("c", "now", echo("c"));
    let manifest = PageManifest::new().page(
      "home",
      PageEntry::new().block("a", "slow").block("b", "fast").block("c", "now"),
    );
    let (composer, _) = composer(registry, manifest);
    let options = ComposeOptions { use_suspense: true, ..Default::default() };
    let page = composer.compose("home", &options).stream().await;
    let html: Vec<String> = page.settle().await.into_iter().map(Markup::into_string).collect();
    assert_eq!(html, vec!["<p>A</p>", "<p>B</p>", "<c>c</c>"]);
  }

  #[tokio::test(start_paused = true)]
  async fn entry_level_suspense_only_defers_that_block() {
    let registry = VariantRegistry::new()
      .variant("hero", "default", echo("h1"))
      .variant("testimonials", "carousel", delayed(100, "<q>great</q>").suspense());
    let manifest = PageManifest::new().page(
      "home",
      PageEntry::new().block("hero", "default").block("testimonials", "carousel"),
    );
    let (composer, _) = composer(registry, manifest);
    let page = composer.compose("home", &ComposeOptions::default()).stream().await;
    assert_eq!(page.shell[0].as_str(), "<h1>h1</h1>");
    assert!(page.shell[1].is_empty());
    assert!(!page.blocks[0].suspended);
    assert!(page.blocks[1].suspended);
    let html = page.settle().await;
    assert_eq!(html[1].as_str(), "<q>great</q>");
  }

  #[tokio::test]
  async fn non_suspended_blocks_render_into_shell() {
    let manifest = PageManifest::new().page("home", PageEntry::new().block("hero", "default"));
    let (composer, _) = composer(basic_registry(), manifest);
    let page = composer.compose("home", &ComposeOptions::default()).stream().await;
    assert_eq!(page.shell, vec![Markup::new("<h1>h1</h1>")]);
    assert!(page.settle().await.len() == 1);
  }
}
