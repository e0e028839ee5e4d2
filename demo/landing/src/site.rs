/* demo/landing/src/site.rs */

use std::sync::Arc;

use showcase_server::showcase_engine::{SharedRenderer, VariantEntry, VariantRegistry};

use crate::blocks::{footer, hero, pricing, testimonials};

/// Every block variant the landing site ships.
pub fn registry() -> VariantRegistry {
  let table_placeholder: SharedRenderer = Arc::new(pricing::table_placeholder);
  VariantRegistry::new()
    .variant("hero", "default", VariantEntry::ready(hero::default))
    .variant("hero", "centered", VariantEntry::ready(hero::centered))
    .variant("hero", "split", VariantEntry::ready(hero::split))
    .variant("pricing", "cards", VariantEntry::ready(pricing::cards))
    .variant(
      "pricing",
      "table",
      VariantEntry::ready(pricing::table).client_only().placeholder(table_placeholder),
    )
    .variant("testimonials", "grid", VariantEntry::ready(testimonials::grid))
    .variant(
      "testimonials",
      "carousel",
      VariantEntry::lazy(testimonials::load_carousel).suspense(),
    )
    .variant("footer", "default", VariantEntry::ready(footer::default))
    .variant("footer", "compact", VariantEntry::ready(footer::compact))
}
