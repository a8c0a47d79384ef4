//! inventa-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus `INVENTA_*`
//! environment overrides, opens the SQLite store, and serves the JSON API.
//!
//! # First run
//!
//! Create a tenant with an administrator holding every permission; the
//! password is read from stdin:
//!
//! ```text
//! inventa-server --bootstrap "Acme" --admin-email ops@acme.test
//! ```
//!
//! Revoke a user's sign-in with `--deactivate ops@acme.test`.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use inventa_core::{
  access::{NewUser, Permission, RoleInput},
  store::InventoryStore,
};
use inventa_server::{AppState, ServerConfig};
use inventa_store_sqlite::SqliteStore;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Inventa material catalog server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,

  /// Create a tenant with this name and an administrator, then exit.
  #[arg(long, value_name = "ENTITY", requires = "admin_email")]
  bootstrap: Option<String>,

  /// Email of the administrator created by `--bootstrap`.
  #[arg(long, value_name = "EMAIL", requires = "bootstrap")]
  admin_email: Option<String>,

  /// Disable sign-in for the user with this email, then exit.
  #[arg(long, value_name = "EMAIL", conflicts_with = "bootstrap")]
  deactivate: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    let password = read_password()?;
    println!("{}", hash_password(&password)?);
    return Ok(());
  }

  let settings = config::Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 8080)?
    .set_default("store_path", "~/.local/share/inventa/inventa.db")?
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("INVENTA"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent() {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if let (Some(entity), Some(email)) = (cli.bootstrap, cli.admin_email) {
    let result = bootstrap(&store, entity, email).await;
    store.close().await.context("failed to close store")?;
    return result;
  }

  if let Some(email) = cli.deactivate {
    let result = deactivate(&store, email).await;
    store.close().await.context("failed to close store")?;
    return result;
  }

  let state = AppState::new(Arc::new(store.clone()));
  let app = inventa_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  tracing::info!("shutting down");
  store.close().await.context("failed to close store")?;
  Ok(())
}

/// Create a tenant, an all-permission role and its first user.
async fn bootstrap(store: &SqliteStore, entity: String, email: String) -> anyhow::Result<()> {
  let password = read_password()?;
  anyhow::ensure!(!password.is_empty(), "password must not be empty");

  let entity = store.add_entity(entity).await.context("failed to create entity")?;
  let role = RoleInput { name: "Administrators".into(), permissions: Permission::all() }
    .validated()?;
  let role = store
    .insert_role(entity.id, role)
    .await
    .context("failed to create role")?;
  let user = store
    .insert_user(entity.id, NewUser {
      name: email.clone(),
      email,
      password_hash: hash_password(&password)?,
      role_id: role.id,
    })
    .await
    .context("failed to create user")?;

  tracing::info!(entity = %entity.id, user = %user.email, "bootstrapped tenant");
  println!("{}", entity.id);
  Ok(())
}

async fn deactivate(store: &SqliteStore, email: String) -> anyhow::Result<()> {
  let principal = store
    .find_principal(email.clone())
    .await
    .context("failed to look up user")?
    .with_context(|| format!("no user with email {email}"))?;
  let user = store
    .set_user_active(principal.user.id, principal.user.entity_id, false)
    .await
    .context("failed to deactivate user")?
    .with_context(|| format!("user {email} vanished"))?;

  tracing::info!(entity = %user.entity_id, user = %user.email, "deactivated user");
  Ok(())
}

fn hash_password(password: &str) -> anyhow::Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string(),
  )
}

/// Read a password line from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  eprint!("Password: ");
  io::stderr().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}

/// Resolve on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      tracing::error!(error = %e, "failed to listen for ctrl-c");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
      Ok(mut signal) => {
        signal.recv().await;
      }
      Err(e) => {
        tracing::error!(error = %e, "failed to listen for SIGTERM");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    () = ctrl_c => {},
    () = terminate => {},
  }
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
