/* demo/landing/src/blocks/footer.rs */

use showcase_server::showcase_engine::{escape_html, Markup, Props, RenderError};

use super::{list, message, prop};

pub fn default(props: &Props) -> Result<Markup, RenderError> {
  let links: String = list(props, "links")
    .iter()
    .filter_map(|l| Some((l.get("label")?.as_str()?, l.get("href")?.as_str()?)))
    .map(|(label, href)| {
      format!(r#"<li><a href="{}">{}</a></li>"#, escape_html(href), escape_html(label))
    })
    .collect();
  Ok(Markup::new(format!(
    r#"<footer><ul class="links">{links}</ul><p>© {} · {}</p></footer>"#,
    prop(props, "company").unwrap_or_default(),
    message(props, "rights"),
  )))
}

pub fn compact(props: &Props) -> Result<Markup, RenderError> {
  Ok(Markup::new(format!(
    r#"<footer class="footer--compact"><p>© {}</p></footer>"#,
    prop(props, "company").unwrap_or_default()
  )))
}
