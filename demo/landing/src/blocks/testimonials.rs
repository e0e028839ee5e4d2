/* demo/landing/src/blocks/testimonials.rs */

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use showcase_server::showcase_engine::{
  escape_html, LoadError, Markup, Props, RenderError, SharedRenderer,
};

use super::{list, message};

/// Simulated latency of fetching the carousel bundle.
pub const CAROUSEL_LOAD_DELAY: Duration = Duration::from_millis(300);

fn quotes(props: &Props) -> String {
  list(props, "quotes")
    .iter()
    .map(|q| {
      let text = escape_html(q.get("text").and_then(Value::as_str).unwrap_or(""));
      let author = escape_html(q.get("author").and_then(Value::as_str).unwrap_or(""));
      format!("<figure><blockquote>{text}</blockquote><figcaption>{author}</figcaption></figure>")
    })
    .collect()
}

pub fn grid(props: &Props) -> Result<Markup, RenderError> {
  Ok(Markup::new(format!(
    r#"<div class="testimonials"><h2>{}</h2><div class="grid">{}</div></div>"#,
    message(props, "title"),
    quotes(props),
  )))
}

pub fn carousel(props: &Props) -> Result<Markup, RenderError> {
  Ok(Markup::new(format!(
    r#"<div class="testimonials testimonials--carousel"><h2>{}</h2><div class="track">{}</div></div>"#,
    message(props, "title"),
    quotes(props),
  )))
}

/// Loader for the carousel variant. Resolves after [`CAROUSEL_LOAD_DELAY`].
pub async fn load_carousel() -> Result<SharedRenderer, LoadError> {
  tokio::time::sleep(CAROUSEL_LOAD_DELAY).await;
  let renderer: SharedRenderer = Arc::new(carousel);
  Ok(renderer)
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[tokio::test(start_paused = true)]
  async fn carousel_loads_after_delay() {
    let start = tokio::time::Instant::now();
    let renderer = load_carousel().await.unwrap();
    assert!(start.elapsed() >= CAROUSEL_LOAD_DELAY);
    let props = json!({"quotes": [{"text": "Fast & simple", "author": "Ada"}]});
    let html = renderer.render(props.as_object().unwrap()).unwrap().into_string();
    assert!(html.contains("<blockquote>Fast &amp; simple</blockquote><figcaption>Ada</figcaption>"));
  }

  #[test]
  fn grid_without_quotes_is_empty_list() {
    let html = grid(&Props::new()).unwrap().into_string();
    assert!(html.contains(r#"<div class="grid"></div>"#));
  }
}
