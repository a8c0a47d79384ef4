//! Inventa JSON API server.
//!
//! Every route authenticates with HTTP Basic credentials checked against the
//! user table; the caller's role decides which mutations are allowed. The
//! tenant is always the caller's entity, never a request parameter.
//!
//! # Routes
//!
//! | Method       | Path                                      | Requires                |
//! |--------------|-------------------------------------------|-------------------------|
//! | GET / POST   | `/characteristics`                        | session / `characteristic_create` |
//! | PATCH        | `/characteristics/{id}`                   | `characteristic_edit`   |
//! | DELETE       | `/characteristics/{id}`                   | `characteristic_create` |
//! | GET / POST   | `/tags`                                   | session / `tag_create`  |
//! | PATCH        | `/tags/{id}`                              | `tag_edit`              |
//! | DELETE       | `/tags/{id}`                              | `tag_create`            |
//! | GET / POST   | `/roles`                                  | session / `role_create` |
//! | PATCH        | `/roles/{id}`                             | `role_edit`             |
//! | DELETE       | `/roles/{id}`                             | `role_create`           |
//! | POST         | `/materials`                              | `material_create`       |
//! | GET / DELETE | `/materials/{id}`                         | session / `material_create` |
//! | PUT          | `/materials/{id}/tags`                    | `material_edit`         |
//! | PUT          | `/materials/{id}/characteristics/{cid}`   | `material_edit`         |
//! | GET          | `/materials/{id}/history`                 | session                 |
//! | POST         | `/files`                                  | `material_edit`         |
//! | GET          | `/audit`                                  | `audit_view`            |

pub mod auth;
pub mod error;
pub mod extract;
mod handlers;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, patch, post, put},
};
use inventa_core::{audit::AuditLog, service::Catalog, store::InventoryStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use auth::BasicGuard;
pub use error::ApiError;

use handlers::{audit, characteristics, files, materials, roles, tags};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime configuration, loaded from `config.toml` and `INVENTA_*` variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  /// Path to the SQLite database file. A leading `~` is expanded.
  pub store_path: PathBuf,
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through every handler.
pub struct AppState<S> {
  pub store:   Arc<S>,
  pub catalog: Arc<Catalog<S>>,
  pub guard:   Arc<BasicGuard<S>>,
}

impl<S> AppState<S>
where
  S: InventoryStore + AuditLog,
{
  pub fn new(store: Arc<S>) -> Self {
    Self {
      catalog: Arc::new(Catalog::new(Arc::clone(&store))),
      guard:   Arc::new(BasicGuard::new(Arc::clone(&store))),
      store,
    }
  }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:   Arc::clone(&self.store),
      catalog: Arc::clone(&self.catalog),
      guard:   Arc::clone(&self.guard),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the application router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: InventoryStore + AuditLog,
{
  Router::new()
    .route(
      "/characteristics",
      get(characteristics::list::<S>).post(characteristics::create::<S>),
    )
    .route(
      "/characteristics/{id}",
      patch(characteristics::update::<S>).delete(characteristics::delete::<S>),
    )
    .route("/tags", get(tags::list::<S>).post(tags::create::<S>))
    .route("/tags/{id}", patch(tags::update::<S>).delete(tags::delete::<S>))
    .route("/roles", get(roles::list::<S>).post(roles::create::<S>))
    .route("/roles/{id}", patch(roles::update::<S>).delete(roles::delete::<S>))
    .route("/materials", post(materials::create::<S>))
    .route(
      "/materials/{id}",
      get(materials::get_one::<S>).delete(materials::delete::<S>),
    )
    .route("/materials/{id}/tags", put(materials::set_tags::<S>))
    .route(
      "/materials/{id}/characteristics/{characteristic_id}",
      put(materials::set_value::<S>),
    )
    .route("/materials/{id}/history", get(materials::history::<S>))
    .route("/files", post(files::register::<S>))
    .route("/audit", get(audit::list::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
