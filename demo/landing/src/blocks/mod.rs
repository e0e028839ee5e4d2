/* demo/landing/src/blocks/mod.rs */

pub mod footer;
pub mod hero;
pub mod pricing;
pub mod testimonials;

use serde_json::Value;
use showcase_server::showcase_engine::{escape_html, Props};

/// Translated text from the block's `messages` prop, else the key itself.
pub(crate) fn message(props: &Props, key: &str) -> String {
  let text = props
    .get("messages")
    .and_then(|m| m.get(key))
    .and_then(Value::as_str)
    .unwrap_or(key);
  escape_html(text)
}

/// A plain string prop, escaped.
pub(crate) fn prop(props: &Props, key: &str) -> Option<String> {
  props.get(key).and_then(Value::as_str).map(escape_html)
}

pub(crate) fn list<'a>(props: &'a Props, key: &str) -> &'a [Value] {
  props.get(key).and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default()
}
