/* src/server/adapter/axum/src/handler/page.rs */

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{MatchedPath, Path, State};
use axum::http::{header, HeaderMap, Uri};
use axum::response::{Html, IntoResponse, Response};
use futures_util::StreamExt;
use showcase_server::{ResolveData, ShowcaseError};
use tracing::debug;

use super::AppState;
use crate::error::AxumError;

/// Resolve locale from request using the configured strategy chain.
fn resolve_locale(
  state: &AppState,
  path_locale: Option<&str>,
  uri: &Uri,
  headers: &HeaderMap,
) -> Result<Option<String>, ShowcaseError> {
  let (Some(locale_set), Some(catalog)) = (state.locale_set.as_ref(), state.renderer.i18n()) else {
    return Ok(None);
  };

  if let Some(loc) = path_locale {
    if !locale_set.contains(loc) {
      return Err(ShowcaseError::unknown_locale(loc));
    }
  }

  let url = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("");
  let data = ResolveData {
    url,
    path_locale,
    cookie_header: headers.get(header::COOKIE).and_then(|v| v.to_str().ok()),
    accept_language: headers.get(header::ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok()),
    locales: catalog.locales(),
    default_locale: catalog.default_locale(),
  };
  Ok(Some(showcase_server::resolve_chain(&state.strategies, &data)))
}

/// `?stream=1` or `?stream=0` override the site default.
fn wants_stream(uri: &Uri, default: bool) -> bool {
  let Some(query) = uri.query() else { return default };
  query
    .split('&')
    .filter_map(|pair| pair.split_once('='))
    .find(|(k, _)| *k == "stream")
    .map_or(default, |(_, v)| matches!(v, "1" | "true"))
}

async fn render(
  state: Arc<AppState>,
  matched: &MatchedPath,
  path_locale: Option<&str>,
  uri: &Uri,
  headers: &HeaderMap,
) -> Result<Response, AxumError> {
  let page_id =
    state.pages.get(matched.as_str()).ok_or_else(|| ShowcaseError::not_found("Page not found"))?;
  let locale = resolve_locale(&state, path_locale, uri, headers)?;
  let streamed = wants_stream(uri, state.renderer.suspense());
  debug!(page = %page_id, locale = ?locale, streamed, "render page");

  if !streamed {
    let html = state.renderer.render(page_id, locale.as_deref()).await;
    return Ok(Html(html).into_response());
  }

  let chunks = state.renderer.stream(page_id, locale.as_deref()).await;
  let body = Body::from_stream(chunks.map(Ok::<String, Infallible>));
  Ok(([(header::CONTENT_TYPE, "text/html; charset=utf-8")], body).into_response())
}

pub(super) async fn handle_page(
  State(state): State<Arc<AppState>>,
  matched: MatchedPath,
  uri: Uri,
  headers: HeaderMap,
) -> Result<Response, AxumError> {
  render(state, &matched, None, &uri, &headers).await
}

pub(super) async fn handle_locale_page(
  State(state): State<Arc<AppState>>,
  matched: MatchedPath,
  Path(locale): Path<String>,
  uri: Uri,
  headers: HeaderMap,
) -> Result<Response, AxumError> {
  render(state, &matched, Some(&locale), &uri, &headers).await
}
