//! Handler for `GET /audit[?limit=N]`.

use axum::{Json, extract::State};
use inventa_core::{
  Error,
  audit::{AuditEntry, AuditLog},
  store::InventoryStore,
};
use serde::Deserialize;

use crate::{
  AppState,
  auth::{Authorized, ViewAudit},
  error::ApiError,
  extract::Query,
};

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct AuditParams {
  pub limit: Option<usize>,
}

/// `GET /audit`: the caller's entity, newest first.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  auth: Authorized<ViewAudit>,
  Query(params): Query<AuditParams>,
) -> Result<Json<Vec<AuditEntry>>, ApiError>
where
  S: InventoryStore + AuditLog,
{
  let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
  let entries = state
    .store
    .list_audit(auth.actor.entity_id, limit)
    .await
    .map_err(Error::storage)?;
  Ok(Json(entries))
}
