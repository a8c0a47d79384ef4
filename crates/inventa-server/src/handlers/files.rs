//! Handler for `POST /files`: records metadata for a file already placed in
//! external storage.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use inventa_core::{audit::AuditLog, material::NewFile, store::InventoryStore};

use crate::{
  AppState,
  auth::{Authorized, EditMaterials},
  error::ApiError,
  extract::Body,
};

/// `POST /files`: body `{"name":…, "type":…, "path":…}`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  auth: Authorized<EditMaterials>,
  Body(body): Body<NewFile>,
) -> Result<impl IntoResponse, ApiError>
where
  S: InventoryStore + AuditLog,
{
  let file = state
    .catalog
    .materials
    .register_file(auth.actor.entity_id, body)
    .await?;
  Ok((StatusCode::CREATED, Json(file)))
}
