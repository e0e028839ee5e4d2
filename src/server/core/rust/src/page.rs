/* src/server/core/rust/src/page.rs */

//! HTML document shell around a composed page.
//!
//! Blocking renders produce one string. Streamed renders produce a prefix with
//! every slot in declared order, one `<template>` plus swap script per late
//! fill, then a suffix carrying the hydration data.

use futures_util::stream::{self, BoxStream, StreamExt};
use serde_json::{json, Map, Value};
use showcase_engine::{escape_html, script_safe_json, BlockSummary, Markup, SlotFill, StreamedPage};

#[derive(Debug, Clone)]
pub struct PageShell {
  /// Script ID for the injected hydration JSON.
  pub data_id: String,
  pub container_class: Option<String>,
  pub container_style: Option<String>,
}

impl Default for PageShell {
  fn default() -> Self {
    Self { data_id: "__showcase".to_string(), container_class: None, container_style: None }
  }
}

#[derive(Debug, Clone, Default)]
pub struct DocumentHead {
  pub title: String,
  pub lang: Option<String>,
}

/// Hydration payload: `{page, locale, blocks, _i18n}`.
pub fn hydration_data(
  page_id: &str,
  locale: Option<&str>,
  blocks: &[BlockSummary],
  messages: Option<Map<String, Value>>,
) -> Value {
  let mut data = Map::new();
  data.insert("page".into(), Value::String(page_id.to_string()));
  if let Some(loc) = locale {
    data.insert("locale".into(), Value::String(loc.to_string()));
  }
  data.insert("blocks".into(), serde_json::to_value(blocks).unwrap_or_else(|_| json!([])));
  if let (Some(loc), Some(messages)) = (locale, messages) {
    data.insert("_i18n".into(), json!({ "locale": loc, "messages": messages }));
  }
  Value::Object(data)
}

/// Wrap one slot's markup so the client can address it by position.
pub fn wrap_slot(index: usize, key: &str, markup: &Markup) -> String {
  format!(r#"<section data-block="{}" data-slot="{index}">{markup}</section>"#, escape_html(key))
}

/// Late content for a suspended slot plus the script that moves it into place.
pub fn fill_chunk(fill: &SlotFill) -> String {
  let i = fill.index;
  format!(
    concat!(
      r#"<template id="showcase-fill-{i}">{markup}</template>"#,
      r#"<script>(function(){{var t=document.getElementById("showcase-fill-{i}");"#,
      r#"var s=document.querySelector('[data-slot="{i}"]');"#,
      r#"if(t&&s){{s.replaceChildren(t.content.cloneNode(true));t.remove();}}}})()</script>"#,
    ),
    i = i,
    markup = fill.markup,
  )
}

impl PageShell {
  fn head(&self, head: &DocumentHead) -> String {
    let mut out = String::from("<!doctype html>");
    match head.lang {
      Some(ref lang) => out.push_str(&format!(r#"<html lang="{}">"#, escape_html(lang))),
      None => out.push_str("<html>"),
    }
    out.push_str(r#"<head><meta charset="utf-8">"#);
    out.push_str(r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#);
    out.push_str(&format!("<title>{}</title></head><body>", escape_html(&head.title)));
    out
  }

  fn open_container(&self) -> String {
    let mut out = String::from("<main");
    if let Some(ref class) = self.container_class {
      out.push_str(&format!(r#" class="{}""#, escape_html(class)));
    }
    if let Some(ref style) = self.container_style {
      out.push_str(&format!(r#" style="{}""#, escape_html(style)));
    }
    out.push('>');
    out
  }

  fn data_script(&self, data: &Value) -> String {
    format!(
      r#"<script id="{}" type="application/json">{}</script>"#,
      escape_html(&self.data_id),
      script_safe_json(data)
    )
  }

  fn prefix(&self, head: &DocumentHead, slots: &[Markup], blocks: &[BlockSummary]) -> String {
    let mut out = self.head(head);
    out.push_str(&self.open_container());
    for (i, markup) in slots.iter().enumerate() {
      let key = blocks.get(i).map_or("", |b| b.key.as_str());
      out.push_str(&wrap_slot(i, key, markup));
    }
    out.push_str("</main>");
    out
  }

  fn suffix(&self, data: &Value) -> String {
    format!("{}</body></html>", self.data_script(data))
  }

  /// Complete document for a fully rendered page.
  pub fn document(
    &self,
    head: &DocumentHead,
    slots: &[Markup],
    blocks: &[BlockSummary],
    data: &Value,
  ) -> String {
    let mut out = self.prefix(head, slots, blocks);
    out.push_str(&self.suffix(data));
    out
  }

  /// Chunked document for a streamed page. The first chunk is the shell.
  pub fn stream(
    &self,
    head: &DocumentHead,
    page: StreamedPage,
    data: &Value,
  ) -> BoxStream<'static, String> {
    let prefix = self.prefix(head, &page.shell, &page.blocks);
    let suffix = self.suffix(data);
    stream::once(async move { prefix })
      .chain(page.fills.map(|fill| fill_chunk(&fill)))
      .chain(stream::once(async move { suffix }))
      .boxed()
  }
}
