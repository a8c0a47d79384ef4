//! Handlers for `/roles` endpoints.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use inventa_core::{
  access::{Role, RoleInput, RoleUsage},
  audit::AuditLog,
  store::InventoryStore,
};
use uuid::Uuid;

use crate::{
  AppState,
  auth::{Authorized, CreateRoles, EditRoles, Session},
  error::ApiError,
  extract::{Body, Params},
};

/// `GET /roles`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  auth: Authorized<Session>,
) -> Result<Json<Vec<RoleUsage>>, ApiError>
where
  S: InventoryStore + AuditLog,
{
  Ok(Json(state.catalog.roles.list(auth.actor.entity_id).await?))
}

/// `POST /roles`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  auth: Authorized<CreateRoles>,
  Body(body): Body<RoleInput>,
) -> Result<impl IntoResponse, ApiError>
where
  S: InventoryStore + AuditLog,
{
  let created = state.catalog.roles.create(auth.actor.entity_id, body).await?;
  Ok((StatusCode::CREATED, Json(created)))
}

/// `PATCH /roles/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  auth: Authorized<EditRoles>,
  Params(id): Params<Uuid>,
  Body(body): Body<RoleInput>,
) -> Result<Json<Role>, ApiError>
where
  S: InventoryStore + AuditLog,
{
  Ok(Json(state.catalog.roles.update(id, auth.actor.entity_id, body).await?))
}

/// `DELETE /roles/{id}`: 409 while any user holds the role.
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  auth: Authorized<CreateRoles>,
  Params(id): Params<Uuid>,
) -> Result<Json<Role>, ApiError>
where
  S: InventoryStore + AuditLog,
{
  Ok(Json(state.catalog.roles.delete(id, auth.actor.entity_id).await?))
}
