/* demo/landing/src/blocks/pricing.rs */

use serde_json::Value;
use showcase_server::showcase_engine::{escape_html, Markup, Props, RenderError};

use super::{list, message};

fn field(plan: &Value, key: &str) -> String {
  escape_html(plan.get(key).and_then(Value::as_str).unwrap_or(""))
}

fn plans(props: &Props) -> Result<&[Value], RenderError> {
  let plans = list(props, "plans");
  if plans.is_empty() {
    return Err(RenderError::new("pricing: no plans configured"));
  }
  Ok(plans)
}

pub fn cards(props: &Props) -> Result<Markup, RenderError> {
  let mut html = format!(r#"<div class="pricing" id="pricing"><h2>{}</h2><ul>"#, message(props, "title"));
  for plan in plans(props)? {
    let features: String = plan
      .get("features")
      .and_then(Value::as_array)
      .map(|f| f.iter().filter_map(Value::as_str).map(|s| format!("<li>{}</li>", escape_html(s))).collect())
      .unwrap_or_default();
    html.push_str(&format!(
      r#"<li class="plan"><h3>{}</h3><p class="price">{}</p><ul>{features}</ul></li>"#,
      field(plan, "name"),
      field(plan, "price"),
    ));
  }
  html.push_str("</ul></div>");
  Ok(Markup::new(html))
}

/// Comparison table. Rendered in the browser; the server only sends the placeholder.
pub fn table(props: &Props) -> Result<Markup, RenderError> {
  let mut html = format!(r#"<table class="pricing-table"><caption>{}</caption>"#, message(props, "title"));
  for plan in plans(props)? {
    html.push_str(&format!("<tr><th>{}</th><td>{}</td></tr>", field(plan, "name"), field(plan, "price")));
  }
  html.push_str("</table>");
  Ok(Markup::new(html))
}

pub fn table_placeholder(props: &Props) -> Result<Markup, RenderError> {
  Ok(Markup::new(format!(r#"<div class="pricing-table pricing-table--loading">{}</div>"#, message(props, "loading"))))
}
