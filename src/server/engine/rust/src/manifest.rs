/* src/server/engine/rust/src/manifest.rs */

//! Page manifest: which blocks a page renders, in what order, with which variant.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::markup::Props;
use crate::registry::VariantRegistry;
use crate::suggest::{closest, SUGGESTION_LIMIT};

#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("parse page manifest: {0}")]
  Parse(#[from] serde_json::Error),
}

/// Composition of one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageEntry {
  /// Route path, e.g. "/" or "/pricing". Defaults to "/{page_id}".
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub route: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  /// Block types in render order. Duplicates render as independent instances.
  #[serde(default)]
  pub order: Vec<String>,
  /// Block type -> chosen variant name.
  #[serde(default)]
  pub variants: HashMap<String, String>,
  /// Block type -> props injected into that block's renderer.
  #[serde(default)]
  pub props: HashMap<String, Props>,
}

impl PageEntry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn route(mut self, route: impl Into<String>) -> Self {
    self.route = Some(route.into());
    self
  }

  pub fn title(mut self, title: impl Into<String>) -> Self {
    self.title = Some(title.into());
    self
  }

  /// Append a block and select its variant.
  pub fn block(mut self, block_type: impl Into<String>, variant: impl Into<String>) -> Self {
    let block_type = block_type.into();
    self.variants.insert(block_type.clone(), variant.into());
    self.order.push(block_type);
    self
  }

  /// Append a block without selecting a variant.
  pub fn slot(mut self, block_type: impl Into<String>) -> Self {
    self.order.push(block_type.into());
    self
  }

  /// Set the props for a block type. Non-object values are ignored.
  pub fn props(mut self, block_type: impl Into<String>, props: serde_json::Value) -> Self {
    if let serde_json::Value::Object(map) = props {
      self.props.insert(block_type.into(), map);
    }
    self
  }

  pub fn variant_for(&self, block_type: &str) -> Option<&str> {
    self.variants.get(block_type).map(String::as_str)
  }

  pub fn props_for(&self, block_type: &str) -> Props {
    self.props.get(block_type).cloned().unwrap_or_default()
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageManifest {
  #[serde(default)]
  pages: IndexMap<String, PageEntry>,
}

impl PageManifest {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_json(json: &str) -> Result<Self, ManifestError> {
    Ok(serde_json::from_str(json)?)
  }

  pub fn page(mut self, id: impl Into<String>, entry: PageEntry) -> Self {
    self.pages.insert(id.into(), entry);
    self
  }

  pub fn get(&self, id: &str) -> Option<&PageEntry> {
    self.pages.get(id)
  }

  pub fn page_ids(&self) -> impl Iterator<Item = &str> {
    self.pages.keys().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.pages.len()
  }

  pub fn is_empty(&self) -> bool {
    self.pages.is_empty()
  }

  /// Route for a page: its explicit `route`, else "/{id}".
  pub fn route_of(&self, id: &str) -> String {
    self.pages.get(id).and_then(|p| p.route.clone()).unwrap_or_else(|| format!("/{id}"))
  }

  pub fn title_of(&self, id: &str) -> String {
    self.pages.get(id).and_then(|p| p.title.clone()).unwrap_or_else(|| id.to_string())
  }

  /// Routes that cannot be served: malformed, or claimed by an earlier page.
  pub fn route_issues(&self) -> Vec<ManifestIssue> {
    let mut issues = Vec::new();
    let mut claimed: HashMap<String, &str> = HashMap::new();
    for page_id in self.pages.keys() {
      let route = self.route_of(page_id);
      if !is_valid_route(&route) {
        issues.push(ManifestIssue::InvalidRoute { page_id: page_id.clone(), route });
        continue;
      }
      if let Some(first) = claimed.get(&route) {
        issues.push(ManifestIssue::DuplicateRoute {
          page_id: page_id.clone(),
          route,
          first_page: first.to_string(),
        });
        continue;
      }
      claimed.insert(route, page_id);
    }
    issues
  }

  /// Check every page against a registry. Rendering tolerates block issues;
  /// route issues prevent serving the page.
  pub fn validate(&self, registry: &VariantRegistry) -> Vec<ManifestIssue> {
    let mut issues = self.route_issues();
    for (page_id, entry) in &self.pages {
      let mut seen = std::collections::HashSet::new();
      for block_type in &entry.order {
        if !seen.insert(block_type.as_str()) {
          continue;
        }
        let Some(variant) = entry.variant_for(block_type) else {
          issues.push(ManifestIssue::MissingSelection {
            page_id: page_id.clone(),
            block_type: block_type.clone(),
          });
          continue;
        };
        if registry.get(block_type, variant).is_some() {
          continue;
        }
        let known = registry.variant_names(block_type);
        issues.push(ManifestIssue::UnknownVariant {
          page_id: page_id.clone(),
          block_type: block_type.clone(),
          variant: variant.to_string(),
          suggestions: closest(variant, known, SUGGESTION_LIMIT)
            .into_iter()
            .map(String::from)
            .collect(),
        });
      }
    }
    issues
  }
}

/// A route must be an absolute literal path: leading `/`, no whitespace,
/// no `{param}` or `*wildcard` segments.
pub fn is_valid_route(route: &str) -> bool {
  route.starts_with('/')
    && !route.contains("//")
    && !route.chars().any(|c| c.is_whitespace() || matches!(c, '{' | '}' | '*' | '?' | '#'))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestIssue {
  MissingSelection { page_id: String, block_type: String },
  UnknownVariant { page_id: String, block_type: String, variant: String, suggestions: Vec<String> },
  InvalidRoute { page_id: String, route: String },
  DuplicateRoute { page_id: String, route: String, first_page: String },
}

impl ManifestIssue {
  /// Route issues make a page unservable; block issues only degrade it.
  pub fn is_route_issue(&self) -> bool {
    matches!(self, Self::InvalidRoute { .. } | Self::DuplicateRoute { .. })
  }
}

impl fmt::Display for ManifestIssue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::MissingSelection { page_id, block_type } => {
        write!(f, "page \"{page_id}\": block \"{block_type}\" has no variant selected")
      }
      Self::UnknownVariant { page_id, block_type, variant, suggestions } => {
        write!(f, "page \"{page_id}\": block \"{block_type}\" selects unknown variant \"{variant}\"")?;
        if !suggestions.is_empty() {
          write!(f, " (did you mean: {}?)", suggestions.join(", "))?;
        }
        Ok(())
      }
      Self::InvalidRoute { page_id, route } => {
        write!(f, "page \"{page_id}\": route \"{route}\" must be an absolute path without parameters")
      }
      Self::DuplicateRoute { page_id, route, first_page } => {
        write!(f, "page \"{page_id}\": route \"{route}\" is already used by page \"{first_page}\"")
      }
    }
  }
}
