//! Handlers for `/tags` endpoints.
//!
//! Renaming a tag regenerates the history of every active material carrying
//! it; that work runs after the response is sent.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use inventa_core::{
  audit::AuditLog,
  store::InventoryStore,
  tag::{Tag, TagInput, TagUsage},
};
use uuid::Uuid;

use crate::{
  AppState,
  auth::{Authorized, CreateTags, EditTags, Session},
  error::ApiError,
  extract::{Body, Params},
};

/// `GET /tags`: each tag with its active-material count.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  auth: Authorized<Session>,
) -> Result<Json<Vec<TagUsage>>, ApiError>
where
  S: InventoryStore + AuditLog,
{
  Ok(Json(state.catalog.tags.list(auth.actor.entity_id).await?))
}

/// `POST /tags`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  auth: Authorized<CreateTags>,
  Body(body): Body<TagInput>,
) -> Result<impl IntoResponse, ApiError>
where
  S: InventoryStore + AuditLog,
{
  let created = state.catalog.tags.create(auth.actor.entity_id, body).await?;
  Ok((StatusCode::CREATED, Json(created)))
}

/// `PATCH /tags/{id}`: every field is required.
pub async fn update<S>(
  State(state): State<AppState<S>>,
  auth: Authorized<EditTags>,
  Params(id): Params<Uuid>,
  Body(body): Body<TagInput>,
) -> Result<Json<Tag>, ApiError>
where
  S: InventoryStore + AuditLog,
{
  Ok(Json(state.catalog.tags.update(id, auth.actor.entity_id, body).await?))
}

/// `DELETE /tags/{id}`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  auth: Authorized<CreateTags>,
  Params(id): Params<Uuid>,
) -> Result<Json<Tag>, ApiError>
where
  S: InventoryStore + AuditLog,
{
  Ok(Json(state.catalog.tags.delete(id, auth.actor.entity_id).await?))
}
