//! Handlers for `/materials` endpoints.
//!
//! | Method   | Path                                          | Notes |
//! |----------|-----------------------------------------------|-------|
//! | `POST`   | `/materials`                                  | Body: `{"name":"Crate"}` |
//! | `GET`    | `/materials/{id}`                             | Tags, values and files |
//! | `DELETE` | `/materials/{id}`                             | Soft delete |
//! | `PUT`    | `/materials/{id}/tags`                        | Body: `{"tagIds":[…]}` |
//! | `PUT`    | `/materials/{id}/characteristics/{cid}`       | Body: `{"value":…}` |
//! | `GET`    | `/materials/{id}/history`                     | Newest first; readable after deletion |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use inventa_core::{
  audit::AuditLog,
  history::MaterialSnapshot,
  material::{Material, MaterialState, NewMaterial},
  store::InventoryStore,
  tag::Tag,
  value::LiveValue,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  auth::{Authorized, CreateMaterials, EditMaterials, Session},
  error::ApiError,
  extract::{Body, Params},
};

/// `POST /materials`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  auth: Authorized<CreateMaterials>,
  Body(body): Body<NewMaterial>,
) -> Result<impl IntoResponse, ApiError>
where
  S: InventoryStore + AuditLog,
{
  let created = state.catalog.materials.create(auth.actor.entity_id, body).await?;
  Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /materials/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  auth: Authorized<Session>,
  Params(id): Params<Uuid>,
) -> Result<Json<MaterialState>, ApiError>
where
  S: InventoryStore + AuditLog,
{
  Ok(Json(state.catalog.materials.get(id, auth.actor.entity_id).await?))
}

/// `DELETE /materials/{id}`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  auth: Authorized<CreateMaterials>,
  Params(id): Params<Uuid>,
) -> Result<Json<Material>, ApiError>
where
  S: InventoryStore + AuditLog,
{
  Ok(Json(state.catalog.materials.soft_delete(id, auth.actor.entity_id).await?))
}

// ─── Tags and values ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagsBody {
  pub tag_ids: Vec<Uuid>,
}

/// `PUT /materials/{id}/tags`: replaces the whole set.
pub async fn set_tags<S>(
  State(state): State<AppState<S>>,
  auth: Authorized<EditMaterials>,
  Params(id): Params<Uuid>,
  Body(body): Body<TagsBody>,
) -> Result<Json<Vec<Tag>>, ApiError>
where
  S: InventoryStore + AuditLog,
{
  let tags = state
    .catalog
    .materials
    .set_tags(id, auth.actor.entity_id, body.tag_ids)
    .await?;
  Ok(Json(tags))
}

#[derive(Debug, Deserialize)]
pub struct ValueBody {
  /// Untyped until the characteristic's kind is known.
  pub value: serde_json::Value,
}

/// `PUT /materials/{id}/characteristics/{characteristic_id}`
pub async fn set_value<S>(
  State(state): State<AppState<S>>,
  auth: Authorized<EditMaterials>,
  Params((id, characteristic_id)): Params<(Uuid, Uuid)>,
  Body(body): Body<ValueBody>,
) -> Result<Json<LiveValue>, ApiError>
where
  S: InventoryStore + AuditLog,
{
  let stored = state
    .catalog
    .materials
    .set_value(id, auth.actor.entity_id, characteristic_id, body.value)
    .await?;
  Ok(Json(stored))
}

/// `GET /materials/{id}/history`
pub async fn history<S>(
  State(state): State<AppState<S>>,
  auth: Authorized<Session>,
  Params(id): Params<Uuid>,
) -> Result<Json<Vec<MaterialSnapshot>>, ApiError>
where
  S: InventoryStore + AuditLog,
{
  Ok(Json(state.catalog.materials.history(id, auth.actor.entity_id).await?))
}
