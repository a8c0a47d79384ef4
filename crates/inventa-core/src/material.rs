//! Materials, their attached files, and the read model used for snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result,
  characteristic::Characteristic,
  tag::Tag,
  validate::{self, ValidationErrors},
  value::LiveValue,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
  pub id:         Uuid,
  pub entity_id:  Uuid,
  pub name:       String,
  pub created_at: DateTime<Utc>,
  /// Set when the material is soft-deleted.
  pub deleted_at: Option<DateTime<Utc>>,
}

impl Material {
  pub fn is_active(&self) -> bool { self.deleted_at.is_none() }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMaterial {
  pub name: String,
}

impl NewMaterial {
  pub fn validated(self) -> Result<Self> {
    let mut errors = ValidationErrors::default();
    let name = validate::name(&mut errors, "name", &self.name);
    errors.finish(Self { name })
  }
}

// ─── Files ───────────────────────────────────────────────────────────────────

/// Metadata for a file held by external storage. No bytes live here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
  pub id:         Uuid,
  pub entity_id:  Uuid,
  pub name:       String,
  #[serde(rename = "type")]
  pub mime_type:  String,
  /// Location within the external file store.
  pub path:       String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFile {
  pub name:      String,
  #[serde(rename = "type")]
  pub mime_type: String,
  pub path:      String,
}

impl NewFile {
  pub fn validated(self) -> Result<Self> {
    let mut errors = ValidationErrors::default();
    let mut required = |field: &str, value: String| {
      let value = value.trim().to_owned();
      if value.is_empty() {
        errors.add(field, &format!("{field}.required"));
      }
      value
    };
    let name = required("name", self.name);
    let mime_type = required("type", self.mime_type);
    let path = required("path", self.path);
    errors.finish(Self { name, mime_type, path })
  }
}

// ─── Read model ──────────────────────────────────────────────────────────────

/// One characteristic value together with its definition.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialValue {
  pub characteristic: Characteristic,
  pub value:          LiveValue,
}

/// Everything needed to snapshot a material, loaded in one read.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialState {
  pub material: Material,
  pub tags:     Vec<Tag>,
  pub values:   Vec<MaterialValue>,
  /// Files referenced by any file-kind value of the material.
  pub files:    Vec<StoredFile>,
}
