/* src/server/core/rust/src/resolve.rs */

//! Locale resolution as an ordered chain of strategies.
//! The first strategy that yields a supported locale wins; otherwise the default.

use crate::config::{I18nSection, StrategyKind};

/// Request facts a strategy may look at.
pub struct ResolveData<'a> {
  /// Path and query of the request, e.g. "/pricing?lang=zh".
  pub url: &'a str,
  /// Locale captured from a `/{locale}/...` route, already validated.
  pub path_locale: Option<&'a str>,
  pub cookie_header: Option<&'a str>,
  pub accept_language: Option<&'a str>,
  pub locales: &'a [String],
  pub default_locale: &'a str,
}

impl ResolveData<'_> {
  fn supports(&self, locale: &str) -> bool {
    self.locales.iter().any(|l| l == locale)
  }
}

pub trait ResolveStrategy: Send + Sync {
  fn kind(&self) -> &'static str;
  fn resolve(&self, data: &ResolveData) -> Option<String>;
}

struct UrlPrefix;

impl ResolveStrategy for UrlPrefix {
  fn kind(&self) -> &'static str {
    "url_prefix"
  }

  fn resolve(&self, data: &ResolveData) -> Option<String> {
    data.path_locale.filter(|l| data.supports(l)).map(String::from)
  }
}

struct Query {
  param: String,
}

impl ResolveStrategy for Query {
  fn kind(&self) -> &'static str {
    "query"
  }

  fn resolve(&self, data: &ResolveData) -> Option<String> {
    let (_, query) = data.url.split_once('?')?;
    query
      .split('&')
      .filter_map(|pair| pair.split_once('='))
      .find(|(k, _)| *k == self.param)
      .map(|(_, v)| v)
      .filter(|v| data.supports(v))
      .map(String::from)
  }
}

struct Cookie {
  name: String,
}

impl ResolveStrategy for Cookie {
  fn kind(&self) -> &'static str {
    "cookie"
  }

  fn resolve(&self, data: &ResolveData) -> Option<String> {
    let header = data.cookie_header?;
    for pair in header.split(';') {
      if let Some((k, v)) = pair.trim().split_once('=') {
        if k.trim() == self.name && data.supports(v.trim()) {
          return Some(v.trim().to_string());
        }
      }
    }
    None
  }
}

struct AcceptLanguage;

impl ResolveStrategy for AcceptLanguage {
  fn kind(&self) -> &'static str {
    "accept_language"
  }

  fn resolve(&self, data: &ResolveData) -> Option<String> {
    let header = data.accept_language?;
    let mut entries: Vec<(&str, f64)> = header
      .split(',')
      .map(str::trim)
      .filter(|part| !part.is_empty())
      .map(|part| {
        let mut segments = part.split(';');
        let lang = segments.next().unwrap_or("").trim();
        let q = segments
          .filter_map(|s| s.trim().strip_prefix("q="))
          .find_map(|v| v.parse::<f64>().ok())
          .unwrap_or(1.0);
        (lang, q)
      })
      .collect();
    // Stable sort keeps header order among equal weights.
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    for (lang, _) in entries {
      if data.supports(lang) {
        return Some(lang.to_string());
      }
      // zh-CN -> zh
      if let Some((prefix, _)) = lang.split_once('-') {
        if data.supports(prefix) {
          return Some(prefix.to_string());
        }
      }
    }
    None
  }
}

pub fn from_url_prefix() -> Box<dyn ResolveStrategy> {
  Box::new(UrlPrefix)
}

pub fn from_url_query(param: impl Into<String>) -> Box<dyn ResolveStrategy> {
  Box::new(Query { param: param.into() })
}

pub fn from_cookie(name: impl Into<String>) -> Box<dyn ResolveStrategy> {
  Box::new(Cookie { name: name.into() })
}

pub fn from_accept_language() -> Box<dyn ResolveStrategy> {
  Box::new(AcceptLanguage)
}

/// URL prefix, `?lang=`, `showcase-locale` cookie, then `Accept-Language`.
pub fn default_strategies() -> Vec<Box<dyn ResolveStrategy>> {
  vec![from_url_prefix(), from_url_query("lang"), from_cookie("showcase-locale"), from_accept_language()]
}

/// Build the chain an `[i18n]` section asks for.
pub fn strategies_for(i18n: &I18nSection) -> Vec<Box<dyn ResolveStrategy>> {
  i18n
    .strategies
    .iter()
    .map(|kind| match kind {
      StrategyKind::UrlPrefix => from_url_prefix(),
      StrategyKind::Query => from_url_query(i18n.query_param.clone()),
      StrategyKind::Cookie => from_cookie(i18n.cookie.clone()),
      StrategyKind::AcceptLanguage => from_accept_language(),
    })
    .collect()
}

pub fn resolve_chain(strategies: &[Box<dyn ResolveStrategy>], data: &ResolveData) -> String {
  strategies
    .iter()
    .find_map(|s| s.resolve(data))
    .unwrap_or_else(|| data.default_locale.to_string())
}
