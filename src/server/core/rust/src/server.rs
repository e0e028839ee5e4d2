/* src/server/core/rust/src/server.rs */

use std::sync::Arc;

use anyhow::{Context, Result};
use futures_util::stream::BoxStream;
use serde_json::Value;
use showcase_engine::{
  ComponentResolver, ComposeOptions, ComposedPage, Diagnostics, Markup, PageComposer, PageManifest,
  RuntimeMode, VariantRegistry,
};
use tracing::info;

use crate::config::SiteConfig;
use crate::errors::ShowcaseError;
use crate::i18n::I18nCatalog;
use crate::page::{hydration_data, DocumentHead, PageShell};
use crate::resolve::{strategies_for, ResolveStrategy};

/// One routable page.
#[derive(Debug, Clone)]
pub struct PageRoute {
  pub page_id: String,
  /// Route path, e.g. "/" or "/pricing".
  pub route: String,
}

/// Renders manifest pages into HTML documents.
pub struct SiteRenderer {
  composer: PageComposer,
  shell: PageShell,
  options: ComposeOptions,
  suspense: bool,
  i18n: Option<I18nCatalog>,
}

impl SiteRenderer {
  pub fn composer(&self) -> &PageComposer {
    &self.composer
  }

  pub fn manifest(&self) -> &PageManifest {
    self.composer.manifest()
  }

  pub fn i18n(&self) -> Option<&I18nCatalog> {
    self.i18n.as_ref()
  }

  /// Whether pages stream by default.
  pub fn suspense(&self) -> bool {
    self.suspense
  }

  pub fn has_page(&self, page_id: &str) -> bool {
    self.manifest().get(page_id).is_some()
  }

  /// Compose a page and inject `locale` and `messages` props into every block.
  /// Props from the manifest take precedence.
  pub fn compose(&self, page_id: &str, locale: Option<&str>, streamed: bool) -> ComposedPage {
    let options =
      ComposeOptions { use_suspense: streamed && self.options.use_suspense, ..self.options.clone() };
    let mut page = self.composer.compose(page_id, &options);
    if let (Some(loc), Some(catalog)) = (locale, self.i18n.as_ref()) {
      for block in page.blocks_mut() {
        let messages = catalog.namespace(loc, block.block_type());
        let props = block.props_mut();
        props.entry("locale").or_insert_with(|| Value::String(loc.to_string()));
        props.entry("messages").or_insert_with(|| Value::Object(messages));
      }
    }
    page
  }

  fn head(&self, page_id: &str, locale: Option<&str>) -> DocumentHead {
    DocumentHead { title: self.manifest().title_of(page_id), lang: locale.map(String::from) }
  }

  fn data(&self, page: &ComposedPage, locale: Option<&str>) -> Value {
    let messages = match (locale, self.i18n.as_ref()) {
      (Some(loc), Some(catalog)) => Some(catalog.all(loc)),
      _ => None,
    };
    hydration_data(page.page_id(), locale, &page.summaries(), messages)
  }

  /// Render the whole document, waiting for every block.
  pub async fn render(&self, page_id: &str, locale: Option<&str>) -> String {
    let mut page = self.compose(page_id, locale, false);
    let data = self.data(&page, locale);
    let slots: Vec<Markup> = page.render().await;
    self.shell.document(&self.head(page_id, locale), &slots, &page.summaries(), &data)
  }

  /// Render the document as chunks; suspended blocks arrive as they settle.
  pub async fn stream(&self, page_id: &str, locale: Option<&str>) -> BoxStream<'static, String> {
    let page = self.compose(page_id, locale, true);
    let data = self.data(&page, locale);
    let streamed = page.stream().await;
    self.shell.stream(&self.head(page_id, locale), streamed, &data)
  }
}

/// Framework-agnostic parts extracted from `ShowcaseServer`.
/// Adapter crates consume this to build framework-specific routers.
pub struct ShowcaseParts {
  pub renderer: Arc<SiteRenderer>,
  pub pages: Vec<PageRoute>,
  pub strategies: Vec<Box<dyn ResolveStrategy>>,
}

impl ShowcaseParts {
  pub fn has_url_prefix(&self) -> bool {
    self.strategies.iter().any(|s| s.kind() == "url_prefix")
  }

  pub fn locales(&self) -> Option<&[String]> {
    self.renderer.i18n().map(I18nCatalog::locales)
  }
}

pub struct ShowcaseServer {
  registry: VariantRegistry,
  manifest: PageManifest,
  diagnostics: Diagnostics,
  shell: PageShell,
  options: ComposeOptions,
  suspense: bool,
  i18n: Option<I18nCatalog>,
  strategies: Vec<Box<dyn ResolveStrategy>>,
}

impl ShowcaseServer {
  pub fn new(registry: VariantRegistry) -> Self {
    Self {
      registry,
      manifest: PageManifest::new(),
      diagnostics: Diagnostics::default(),
      shell: PageShell::default(),
      options: ComposeOptions::default(),
      suspense: false,
      i18n: None,
      strategies: Vec::new(),
    }
  }

  /// Build from site config: reads the manifest and message files it names.
  pub fn from_config(config: &SiteConfig, registry: VariantRegistry) -> Result<Self> {
    let manifest_path = config.manifest_path();
    let content = std::fs::read_to_string(&manifest_path)
      .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    let manifest = PageManifest::from_json(&content)
      .map_err(ShowcaseError::from)
      .with_context(|| format!("failed to load {}", manifest_path.display()))?;
    let route_issues = manifest.route_issues();
    if !route_issues.is_empty() {
      return Err(ShowcaseError::unservable_routes(&route_issues))
        .with_context(|| format!("cannot serve {}", manifest_path.display()));
    }

    let site = &config.site;
    let mut server = Self::new(registry)
      .manifest(manifest)
      .mode(site.mode)
      .shell(PageShell {
        data_id: site.data_id.clone(),
        container_class: site.container_class.clone(),
        container_style: site.container_style.clone(),
      })
      .suspense(site.suspense)
      .suspend_all(site.suspend_all)
      .suspense_fallback(site.suspense_fallback.clone().map(Markup::from))
      .fault_fallback(site.fault_fallback.clone().map(Markup::from));

    if let (Some(section), Some(dir)) = (config.i18n.as_ref(), config.messages_dir()) {
      let catalog = I18nCatalog::load(section, &dir)?;
      server = server.i18n(catalog).resolve_strategies(strategies_for(section));
    }
    info!(
      site = %site.name,
      pages = server.manifest.len(),
      variants = server.registry.len(),
      "site configured"
    );
    Ok(server)
  }

  pub fn manifest(mut self, manifest: PageManifest) -> Self {
    self.manifest = manifest;
    self
  }

  pub fn mode(mut self, mode: RuntimeMode) -> Self {
    self.diagnostics = Diagnostics::new(mode);
    self
  }

  pub fn diagnostics(mut self, diagnostics: Diagnostics) -> Self {
    self.diagnostics = diagnostics;
    self
  }

  pub fn shell(mut self, shell: PageShell) -> Self {
    self.shell = shell;
    self
  }

  /// Stream pages by default. Requests can still opt in per call.
  pub fn suspense(mut self, enabled: bool) -> Self {
    self.suspense = enabled;
    self
  }

  /// Defer every block while streaming, not only variants flagged for suspense.
  pub fn suspend_all(mut self, enabled: bool) -> Self {
    self.options.use_suspense = enabled;
    self
  }

  pub fn suspense_fallback(mut self, fallback: Option<Markup>) -> Self {
    self.options.fallback_ui = fallback;
    self
  }

  pub fn fault_fallback(mut self, fallback: Option<Markup>) -> Self {
    self.options.fault_fallback = fallback;
    self
  }

  pub fn i18n(mut self, catalog: I18nCatalog) -> Self {
    self.i18n = Some(catalog);
    self
  }

  pub fn resolve_strategies(mut self, strategies: Vec<Box<dyn ResolveStrategy>>) -> Self {
    self.strategies = strategies;
    self
  }

  /// Consume the builder, returning framework-agnostic parts for an adapter.
  pub fn into_parts(self) -> ShowcaseParts {
    let pages = self
      .manifest
      .page_ids()
      .map(|id| PageRoute { page_id: id.to_string(), route: self.manifest.route_of(id) })
      .collect();
    let resolver =
      ComponentResolver::new(Arc::new(self.registry)).with_diagnostics(self.diagnostics);
    let composer = PageComposer::new(Arc::new(resolver), Arc::new(self.manifest));
    let renderer = SiteRenderer {
      composer,
      shell: self.shell,
      options: self.options,
      suspense: self.suspense,
      i18n: self.i18n,
    };
    ShowcaseParts { renderer: Arc::new(renderer), pages, strategies: self.strategies }
  }
}
