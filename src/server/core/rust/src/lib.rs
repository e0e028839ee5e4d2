/* src/server/core/rust/src/lib.rs */

pub mod config;
pub mod errors;
pub mod i18n;
pub mod page;
pub mod resolve;
pub mod server;

// Re-exports for ergonomic use
pub use config::{
  I18nSection, ServerSection, SiteConfig, SiteSection, StrategyKind, load_from_env,
  load_site_config, parse_site_config,
};
pub use errors::{ErrorKind, ShowcaseError};
pub use i18n::I18nCatalog;
pub use page::{DocumentHead, PageShell, fill_chunk, hydration_data, wrap_slot};
pub use resolve::{
  ResolveData, ResolveStrategy, default_strategies, from_accept_language, from_cookie,
  from_url_prefix, from_url_query, resolve_chain, strategies_for,
};
pub use server::{PageRoute, ShowcaseParts, ShowcaseServer, SiteRenderer};
pub use showcase_engine;
