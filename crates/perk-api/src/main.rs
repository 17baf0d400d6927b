//! perk-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) and `PERK_*`
//! environment variables, opens the SQLite store, optionally seeds the
//! catalog, and serves the loyalty API over HTTP.
//!
//! # Development tokens
//!
//! To mint a bearer token for a user id signed with the configured secret:
//!
//! ```
//! cargo run -p perk-api --bin perk-server -- --issue-token <uuid>
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use perk_api::{AppState, ServerConfig, seed};
use perk_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "Perk loyalty server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Load levels, rewards and campaigns from a JSON catalog before serving.
  #[arg(long, value_name = "CATALOG")]
  seed: Option<PathBuf>,

  /// Print a signed bearer token for this user id and exit.
  #[arg(long, value_name = "USER_ID")]
  issue_token: Option<Uuid>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 8080)?
    .set_default("store_path", "perk.db")?
    .set_default("token_ttl_secs", 3600)?
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("PERK"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  let auth = server_cfg.auth();

  // Helper mode: mint a token and exit.
  if let Some(user_id) = cli.issue_token {
    let token = auth.issue(user_id).context("failed to sign token")?;
    println!("{token}");
    return Ok(());
  }

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if let Some(path) = cli.seed {
    let raw = std::fs::read_to_string(&path)
      .with_context(|| format!("failed to read catalog {path:?}"))?;
    let catalog: seed::Catalog = serde_json::from_str(&raw)
      .with_context(|| format!("failed to parse catalog {path:?}"))?;
    seed::seed(&store, catalog)
      .await
      .context("failed to seed catalog")?;
  }

  // Build application state.
  let state = AppState { store: Arc::new(store), auth: Arc::new(auth) };

  let app = perk_api::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
