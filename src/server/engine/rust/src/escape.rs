/* src/server/engine/rust/src/escape.rs */

use std::fmt::Write;

/// Escape text for an HTML text node or a double-quoted attribute value.
pub fn escape_html(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for ch in text.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      _ => out.push(ch),
    }
  }
  out
}

/// Serialize `value` as pure-ASCII JSON that is safe inside `<script>`.
///
/// serde_json only emits `<`, `>`, `&` and non-ASCII characters inside string
/// literals, so each one can be rewritten as a `\uXXXX` escape without tracking
/// string state. Characters outside the BMP become surrogate pairs.
pub fn script_safe_json(value: &serde_json::Value) -> String {
  let raw = value.to_string();
  let mut out = String::with_capacity(raw.len());
  for ch in raw.chars() {
    if ch.is_ascii() && !matches!(ch, '<' | '>' | '&') {
      out.push(ch);
      continue;
    }
    let mut units = [0u16; 2];
    for unit in ch.encode_utf16(&mut units) {
      let _ = write!(out, "\\u{unit:04x}");
    }
  }
  out
}
