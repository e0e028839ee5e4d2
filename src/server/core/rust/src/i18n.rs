/* src/server/core/rust/src/i18n.rs */

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::I18nSection;

/// Translation messages for every configured locale.
///
/// Files are `{messages_dir}/{locale}.json`, each an object keyed by block type:
/// `{"hero": {"headline": "..."}, "footer": {...}}`. Lookups fall back per key to
/// the default locale, then to the key itself.
#[derive(Debug, Clone, Default)]
pub struct I18nCatalog {
  locales: Vec<String>,
  default_locale: String,
  messages: HashMap<String, Value>,
}

impl I18nCatalog {
  pub fn new(locales: Vec<String>, default_locale: impl Into<String>) -> Self {
    Self { locales, default_locale: default_locale.into(), messages: HashMap::new() }
  }

  pub fn with_messages(mut self, locale: impl Into<String>, messages: Value) -> Self {
    self.messages.insert(locale.into(), messages);
    self
  }

  /// Read one file per locale. A locale without a file gets no messages.
  pub fn load(section: &I18nSection, dir: &Path) -> Result<Self> {
    let mut catalog = Self::new(section.locales.clone(), section.default.clone());
    for locale in &section.locales {
      let path = dir.join(format!("{locale}.json"));
      if !path.is_file() {
        debug!(locale = %locale, path = %path.display(), "no message file");
        continue;
      }
      let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
      let parsed: Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
      catalog.messages.insert(locale.clone(), parsed);
    }
    Ok(catalog)
  }

  pub fn locales(&self) -> &[String] {
    &self.locales
  }

  pub fn default_locale(&self) -> &str {
    &self.default_locale
  }

  pub fn supports(&self, locale: &str) -> bool {
    self.locales.iter().any(|l| l == locale)
  }

  /// Look up `key` inside a block's namespace.
  pub fn message(&self, locale: &str, namespace: &str, key: &str) -> String {
    [locale, self.default_locale.as_str()]
      .iter()
      .filter_map(|loc| self.messages.get(*loc))
      .filter_map(|msgs| msgs.get(namespace)?.get(key)?.as_str())
      .next()
      .unwrap_or(key)
      .to_string()
  }

  /// A block's namespace for `locale`, with missing keys filled from the default locale.
  pub fn namespace(&self, locale: &str, namespace: &str) -> Map<String, Value> {
    let mut merged = self.namespace_raw(&self.default_locale, namespace);
    if locale != self.default_locale {
      merged.extend(self.namespace_raw(locale, namespace));
    }
    merged
  }

  /// Every namespace for `locale`, default-merged. Sent to the client for hydration.
  pub fn all(&self, locale: &str) -> Map<String, Value> {
    let mut names: Vec<&String> = Vec::new();
    for loc in [self.default_locale.as_str(), locale] {
      if let Some(Value::Object(map)) = self.messages.get(loc) {
        for name in map.keys() {
          if !names.contains(&name) {
            names.push(name);
          }
        }
      }
    }
    names.into_iter().map(|name| (name.clone(), Value::Object(self.namespace(locale, name)))).collect()
  }

  fn namespace_raw(&self, locale: &str, namespace: &str) -> Map<String, Value> {
    self
      .messages
      .get(locale)
      .and_then(|msgs| msgs.get(namespace))
      .and_then(Value::as_object)
      .cloned()
      .unwrap_or_default()
  }
}
