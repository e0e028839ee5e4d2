/* src/server/core/rust/src/config.rs */

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use showcase_engine::RuntimeMode;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "SHOWCASE_CONFIG";
/// Environment variable overriding `server.port`.
pub const PORT_ENV: &str = "PORT";
pub const DEFAULT_CONFIG_FILE: &str = "showcase.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
  pub site: SiteSection,
  #[serde(default)]
  pub server: ServerSection,
  #[serde(default)]
  pub i18n: Option<I18nSection>,
  /// Directory of the config file; relative paths resolve against it.
  #[serde(skip)]
  pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteSection {
  pub name: String,
  #[serde(default)]
  pub mode: RuntimeMode,
  #[serde(default = "default_manifest")]
  pub manifest: String,
  #[serde(default)]
  pub container_class: Option<String>,
  #[serde(default)]
  pub container_style: Option<String>,
  #[serde(default = "default_data_id")]
  pub data_id: String,
  /// Stream pages by default.
  #[serde(default)]
  pub suspense: bool,
  /// While streaming, defer every block rather than only variants flagged for suspense.
  #[serde(default)]
  pub suspend_all: bool,
  /// HTML shown in place of a faulted block.
  #[serde(default)]
  pub fault_fallback: Option<String>,
  /// HTML shown in a suspended slot until its block is ready.
  #[serde(default)]
  pub suspense_fallback: Option<String>,
}

fn default_manifest() -> String {
  "manifest.json".to_string()
}

fn default_data_id() -> String {
  "__showcase".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
  #[serde(default = "default_host")]
  pub host: String,
  #[serde(default = "default_port")]
  pub port: u16,
}

impl Default for ServerSection {
  fn default() -> Self {
    Self { host: default_host(), port: default_port() }
  }
}

impl ServerSection {
  pub fn addr(&self) -> String {
    format!("{}:{}", self.host, self.port)
  }
}

fn default_host() -> String {
  "0.0.0.0".to_string()
}

fn default_port() -> u16 {
  3000
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
  UrlPrefix,
  Query,
  Cookie,
  AcceptLanguage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct I18nSection {
  pub locales: Vec<String>,
  #[serde(default = "default_i18n_default")]
  pub default: String,
  #[serde(default = "default_messages_dir")]
  pub messages_dir: String,
  #[serde(default = "default_cookie")]
  pub cookie: String,
  #[serde(default = "default_query_param")]
  pub query_param: String,
  #[serde(default = "default_strategy_kinds")]
  pub strategies: Vec<StrategyKind>,
}

impl I18nSection {
  pub fn validate(&self) -> Result<()> {
    if self.locales.is_empty() {
      bail!("i18n.locales must not be empty");
    }
    if !self.locales.contains(&self.default) {
      bail!("i18n.default \"{}\" is not in i18n.locales {:?}", self.default, self.locales);
    }
    Ok(())
  }
}

fn default_i18n_default() -> String {
  "en".to_string()
}

fn default_messages_dir() -> String {
  "locales".to_string()
}

fn default_cookie() -> String {
  "showcase-locale".to_string()
}

fn default_query_param() -> String {
  "lang".to_string()
}

fn default_strategy_kinds() -> Vec<StrategyKind> {
  vec![
    StrategyKind::UrlPrefix,
    StrategyKind::Query,
    StrategyKind::Cookie,
    StrategyKind::AcceptLanguage,
  ]
}

impl SiteConfig {
  pub fn validate(&self) -> Result<()> {
    if self.site.name.trim().is_empty() {
      bail!("site.name must not be empty");
    }
    if self.site.data_id.is_empty() {
      bail!("site.data_id must not be empty");
    }
    if let Some(ref i18n) = self.i18n {
      i18n.validate()?;
    }
    Ok(())
  }

  pub fn manifest_path(&self) -> PathBuf {
    self.base_dir.join(&self.site.manifest)
  }

  pub fn messages_dir(&self) -> Option<PathBuf> {
    self.i18n.as_ref().map(|i18n| self.base_dir.join(&i18n.messages_dir))
  }

  /// Apply a `PORT`-style override. Unparseable values are rejected.
  pub fn apply_port_override(&mut self, raw: Option<&str>) -> Result<()> {
    if let Some(raw) = raw {
      self.server.port =
        raw.trim().parse().with_context(|| format!("invalid {PORT_ENV} value {raw:?}"))?;
    }
    Ok(())
  }
}

pub fn parse_site_config(content: &str) -> Result<SiteConfig> {
  let config: SiteConfig = toml::from_str(content)?;
  config.validate()?;
  Ok(config)
}

pub fn load_site_config(path: &Path) -> Result<SiteConfig> {
  let content =
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
  let mut config =
    parse_site_config(&content).with_context(|| format!("failed to load {}", path.display()))?;
  config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
  Ok(config)
}

/// Config path: explicit argument, else `SHOWCASE_CONFIG`, else `./showcase.toml`.
pub fn config_path(explicit: Option<PathBuf>) -> PathBuf {
  explicit
    .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
    .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Load from [`config_path`] and apply the `PORT` override.
pub fn load_from_env(explicit: Option<PathBuf>) -> Result<SiteConfig> {
  let mut config = load_site_config(&config_path(explicit))?;
  let port = std::env::var(PORT_ENV).ok();
  config.apply_port_override(port.as_deref())?;
  Ok(config)
}
