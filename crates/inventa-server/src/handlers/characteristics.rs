//! Handlers for `/characteristics` endpoints.
//!
//! | Method   | Path                     | Notes |
//! |----------|--------------------------|-------|
//! | `GET`    | `/characteristics`       | Sorted by name |
//! | `POST`   | `/characteristics`       | Unknown `type` → `unknownVariant` |
//! | `PATCH`  | `/characteristics/{id}`  | A `type` field is rejected |
//! | `DELETE` | `/characteristics/{id}`  | 409 while an active material uses it |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use inventa_core::{
  audit::AuditLog,
  characteristic::{Characteristic, CharacteristicKind, CharacteristicUpdate, NewCharacteristic},
  store::InventoryStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  auth::{Authorized, CreateCharacteristics, EditCharacteristics, Session},
  error::ApiError,
  extract::{Body, Params},
};

/// `GET /characteristics`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  auth: Authorized<Session>,
) -> Result<Json<Vec<Characteristic>>, ApiError>
where
  S: InventoryStore + AuditLog,
{
  let entity_id = auth.actor.entity_id;
  Ok(Json(state.catalog.characteristics.list(entity_id).await?))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// The create body, with `type` left as text so an unknown kind gets its own
/// error code instead of a generic deserialisation failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
  pub name:        String,
  pub description: Option<String>,
  #[serde(rename = "type")]
  pub kind:        String,
  pub options:     Option<Vec<String>>,
  pub units:       Option<String>,
}

/// `POST /characteristics`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  auth: Authorized<CreateCharacteristics>,
  Body(body): Body<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: InventoryStore + AuditLog,
{
  let input = NewCharacteristic {
    kind:        CharacteristicKind::parse(&body.kind)?,
    name:        body.name,
    description: body.description,
    options:     body.options,
    units:       body.units,
  };
  let created = state
    .catalog
    .characteristics
    .create(auth.actor.entity_id, input)
    .await?;
  Ok((StatusCode::CREATED, Json(created)))
}

// ─── Update / delete ─────────────────────────────────────────────────────────

/// `PATCH /characteristics/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  auth: Authorized<EditCharacteristics>,
  Params(id): Params<Uuid>,
  Body(body): Body<CharacteristicUpdate>,
) -> Result<Json<Characteristic>, ApiError>
where
  S: InventoryStore + AuditLog,
{
  let updated = state
    .catalog
    .characteristics
    .update(id, auth.actor.entity_id, body)
    .await?;
  Ok(Json(updated))
}

/// `DELETE /characteristics/{id}`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  auth: Authorized<CreateCharacteristics>,
  Params(id): Params<Uuid>,
) -> Result<Json<Characteristic>, ApiError>
where
  S: InventoryStore + AuditLog,
{
  let deleted = state
    .catalog
    .characteristics
    .delete(id, auth.actor.entity_id)
    .await?;
  Ok(Json(deleted))
}
