/* demo/landing/src/main.rs */

mod blocks;
mod site;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use showcase_server::showcase_engine::PageManifest;
use showcase_server::{load_from_env, ShowcaseServer};
use showcase_server_axum::IntoAxumRouter;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "showcase-landing", about = "Landing site composed from showcase blocks")]
struct Cli {
  /// Path to showcase.toml (defaults to $SHOWCASE_CONFIG, then ./showcase.toml)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Start the HTTP server
  Serve,
  /// Render one page to stdout
  Render {
    /// Page id from the manifest
    page: String,
    /// Locale to render; defaults to the configured default locale
    #[arg(long)]
    locale: Option<String>,
  },
  /// Validate the manifest against the registered variants
  Check,
}

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let cli = Cli::parse();
  match cli.command {
    Command::Serve => serve(cli.config).await,
    Command::Render { page, locale } => render(cli.config, &page, locale).await,
    Command::Check => check(cli.config),
  }
}

async fn serve(config: Option<PathBuf>) -> Result<()> {
  let config = load_from_env(config)?;
  let addr = config.server.addr();
  let server = ShowcaseServer::from_config(&config, site::registry())?;
  server.serve(&addr).await.map_err(|e| anyhow::anyhow!("server error: {e}"))
}

async fn render(config: Option<PathBuf>, page: &str, locale: Option<String>) -> Result<()> {
  let config = load_from_env(config)?;
  let parts = ShowcaseServer::from_config(&config, site::registry())?.into_parts();
  let renderer = parts.renderer;
  if !renderer.has_page(page) {
    let known: Vec<&str> = renderer.manifest().page_ids().collect();
    bail!("unknown page \"{page}\" (known: {})", known.join(", "));
  }
  let locale = locale.or_else(|| renderer.i18n().map(|c| c.default_locale().to_string()));
  if let (Some(loc), Some(catalog)) = (locale.as_deref(), renderer.i18n()) {
    if !catalog.supports(loc) {
      bail!("unsupported locale \"{loc}\" (configured: {})", catalog.locales().join(", "));
    }
  }

  let html = renderer.render(page, locale.as_deref()).await;
  let mut stdout = std::io::stdout().lock();
  stdout.write_all(html.as_bytes()).context("failed to write page")?;
  stdout.write_all(b"\n")?;
  Ok(())
}

fn check(config: Option<PathBuf>) -> Result<()> {
  let config = load_from_env(config)?;
  let path = config.manifest_path();
  let content =
    std::fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
  let manifest =
    PageManifest::from_json(&content).with_context(|| format!("failed to load {}", path.display()))?;

  let issues = manifest.validate(&site::registry());
  if issues.is_empty() {
    info!(pages = manifest.len(), "manifest ok");
    return Ok(());
  }
  for issue in &issues {
    warn!("{issue}");
  }
  bail!("{} manifest issue(s) in {}", issues.len(), path.display())
}
