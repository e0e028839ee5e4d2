/* demo/landing/src/blocks/hero.rs */

use showcase_server::showcase_engine::{Markup, Props, RenderError};

use super::{message, prop};

pub fn default(props: &Props) -> Result<Markup, RenderError> {
  Ok(Markup::new(format!(
    r#"<div class="hero"><h1>{}</h1><p>{}</p><a class="cta" href="{}">{}</a></div>"#,
    message(props, "headline"),
    message(props, "subheadline"),
    prop(props, "cta_href").unwrap_or_else(|| "#pricing".to_string()),
    message(props, "cta"),
  )))
}

pub fn centered(props: &Props) -> Result<Markup, RenderError> {
  Ok(Markup::new(format!(
    r#"<div class="hero hero--centered"><h1>{}</h1><a class="cta" href="{}">{}</a></div>"#,
    message(props, "headline"),
    prop(props, "cta_href").unwrap_or_else(|| "#pricing".to_string()),
    message(props, "cta"),
  )))
}

/// Text on one side, image on the other. Needs an `image` prop.
pub fn split(props: &Props) -> Result<Markup, RenderError> {
  let image = prop(props, "image").ok_or_else(|| RenderError::new("hero:split needs an image prop"))?;
  Ok(Markup::new(format!(
    r#"<div class="hero hero--split"><div><h1>{}</h1><p>{}</p></div><img src="{image}" alt=""></div>"#,
    message(props, "headline"),
    message(props, "subheadline"),
  )))
}
