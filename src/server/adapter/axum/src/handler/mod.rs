/* src/server/adapter/axum/src/handler/mod.rs */

mod page;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use showcase_server::resolve::ResolveStrategy;
use showcase_server::showcase_engine::is_valid_route;
use showcase_server::{ShowcaseError, ShowcaseParts, SiteRenderer};
use tracing::warn;

use crate::error::AxumError;

const HEALTH_ROUTE: &str = "/_showcase/health";

pub(crate) struct AppState {
  pub renderer: Arc<SiteRenderer>,
  /// Axum route pattern -> page id.
  pub pages: HashMap<String, String>,
  pub locale_set: Option<HashSet<String>>,
  pub strategies: Vec<Box<dyn ResolveStrategy>>,
}

/// Route with a `{locale}` segment in front. "/" becomes "/{locale}".
fn locale_route(route: &str) -> String {
  if route == "/" { "/{locale}".to_string() } else { format!("/{{locale}}{route}") }
}

pub(crate) fn build_router(parts: ShowcaseParts) -> Router {
  let locale_set = parts.locales().map(|l| l.iter().cloned().collect::<HashSet<_>>());

  // Use default strategies when none provided
  let strategies = if parts.strategies.is_empty() && locale_set.is_some() {
    showcase_server::default_strategies()
  } else {
    parts.strategies
  };
  let has_url_prefix = locale_set.is_some() && strategies.iter().any(|s| s.kind() == "url_prefix");

  let mut page_map: HashMap<String, String> = HashMap::new();
  let mut router = Router::new().route(HEALTH_ROUTE, get(handle_health));

  for page in parts.pages {
    if !is_valid_route(&page.route) || page.route == HEALTH_ROUTE {
      warn!(page = %page.page_id, route = %page.route, "unservable route, page skipped");
      continue;
    }
    if let Some(first) = page_map.get(&page.route) {
      warn!(page = %page.page_id, route = %page.route, first = %first, "duplicate route, page skipped");
      continue;
    }
    page_map.insert(page.route.clone(), page.page_id.clone());
    router = router.route(&page.route, get(page::handle_page));

    // Register locale-prefixed routes only when url_prefix strategy is active
    if has_url_prefix {
      let prefixed = locale_route(&page.route);
      page_map.insert(prefixed.clone(), page.page_id);
      router = router.route(&prefixed, get(page::handle_locale_page));
    }
  }

  let state = Arc::new(AppState { renderer: parts.renderer, pages: page_map, locale_set, strategies });

  router.fallback(handle_not_found).with_state(state)
}

async fn handle_health() -> Json<serde_json::Value> {
  Json(serde_json::json!({ "ok": true }))
}

async fn handle_not_found() -> AxumError {
  AxumError(ShowcaseError::not_found("Page not found"))
}
