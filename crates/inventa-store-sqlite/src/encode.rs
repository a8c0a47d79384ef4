//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings and UUIDs as hyphenated
//! lowercase strings. Structured fields (choice options, permissions,
//! characteristic values, snapshot bodies) are stored as compact JSON.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use inventa_core::{
  access::{Permission, Role, User},
  audit::{AuditEntry, AuditEvent, AuditKind},
  characteristic::{Characteristic, CharacteristicKind},
  history::MaterialSnapshot,
  material::{Material, StoredFile},
  tag::Tag,
  value::LiveValue,
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enumerations ────────────────────────────────────────────────────────────

pub fn decode_kind(s: &str) -> Result<CharacteristicKind> {
  CharacteristicKind::parse(s)
    .map_err(|_| Error::UnknownValue { column: "kind", value: s.to_owned() })
}

pub fn decode_audit_kind(s: &str) -> Result<AuditKind> {
  s.parse()
    .map_err(|_| Error::UnknownValue { column: "audit kind", value: s.to_owned() })
}

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn encode_options(options: Option<&[String]>) -> Result<Option<String>> {
  options.map(serde_json::to_string).transpose().map_err(Error::from)
}

pub fn encode_permissions(permissions: &BTreeSet<Permission>) -> Result<String> {
  Ok(serde_json::to_string(permissions)?)
}

/// Only the payload is stored; the characteristic's kind tells its shape.
pub fn encode_value(value: &LiveValue) -> Result<String> {
  Ok(value.to_json()?.to_string())
}

pub fn decode_value(kind: CharacteristicKind, s: &str) -> Result<LiveValue> {
  let data: serde_json::Value = serde_json::from_str(s)?;
  Ok(LiveValue::from_json(kind, data)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const CHARACTERISTIC_COLUMNS: &str = "characteristic_id, entity_id, name, \
   description, kind, options, units, created_at, updated_at";

/// Raw strings read from a `characteristics` row.
pub struct RawCharacteristic {
  pub characteristic_id: String,
  pub entity_id:         String,
  pub name:              String,
  pub description:       Option<String>,
  pub kind:              String,
  pub options:           Option<String>,
  pub units:             Option<String>,
  pub created_at:        String,
  pub updated_at:        String,
}

impl RawCharacteristic {
  /// Read [`CHARACTERISTIC_COLUMNS`] starting at column `at`.
  pub fn from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      characteristic_id: row.get(at)?,
      entity_id:         row.get(at + 1)?,
      name:              row.get(at + 2)?,
      description:       row.get(at + 3)?,
      kind:              row.get(at + 4)?,
      options:           row.get(at + 5)?,
      units:             row.get(at + 6)?,
      created_at:        row.get(at + 7)?,
      updated_at:        row.get(at + 8)?,
    })
  }

  pub fn into_characteristic(self) -> Result<Characteristic> {
    Ok(Characteristic {
      id:          decode_uuid(&self.characteristic_id)?,
      entity_id:   decode_uuid(&self.entity_id)?,
      name:        self.name,
      description: self.description,
      kind:        decode_kind(&self.kind)?,
      options:     self
        .options
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?,
      units:       self.units,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

pub const TAG_COLUMNS: &str =
  "tag_id, entity_id, name, color, font_color, created_at, updated_at";

/// Raw strings read from a `tags` row.
pub struct RawTag {
  pub tag_id:     String,
  pub entity_id:  String,
  pub name:       String,
  pub color:      String,
  pub font_color: String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawTag {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      tag_id:     row.get(0)?,
      entity_id:  row.get(1)?,
      name:       row.get(2)?,
      color:      row.get(3)?,
      font_color: row.get(4)?,
      created_at: row.get(5)?,
      updated_at: row.get(6)?,
    })
  }

  pub fn into_tag(self) -> Result<Tag> {
    Ok(Tag {
      id:         decode_uuid(&self.tag_id)?,
      entity_id:  decode_uuid(&self.entity_id)?,
      name:       self.name,
      color:      self.color,
      font_color: self.font_color,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

pub const MATERIAL_COLUMNS: &str =
  "material_id, entity_id, name, created_at, deleted_at";

/// Raw strings read from a `materials` row.
pub struct RawMaterial {
  pub material_id: String,
  pub entity_id:   String,
  pub name:        String,
  pub created_at:  String,
  pub deleted_at:  Option<String>,
}

impl RawMaterial {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      material_id: row.get(0)?,
      entity_id:   row.get(1)?,
      name:        row.get(2)?,
      created_at:  row.get(3)?,
      deleted_at:  row.get(4)?,
    })
  }

  pub fn into_material(self) -> Result<Material> {
    Ok(Material {
      id:         decode_uuid(&self.material_id)?,
      entity_id:  decode_uuid(&self.entity_id)?,
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
      deleted_at: self.deleted_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

pub const FILE_COLUMNS: &str =
  "file_id, entity_id, name, mime_type, path, created_at";

pub struct RawFile {
  pub file_id:    String,
  pub entity_id:  String,
  pub name:       String,
  pub mime_type:  String,
  pub path:       String,
  pub created_at: String,
}

impl RawFile {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      file_id:    row.get(0)?,
      entity_id:  row.get(1)?,
      name:       row.get(2)?,
      mime_type:  row.get(3)?,
      path:       row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_file(self) -> Result<StoredFile> {
    Ok(StoredFile {
      id:         decode_uuid(&self.file_id)?,
      entity_id:  decode_uuid(&self.entity_id)?,
      name:       self.name,
      mime_type:  self.mime_type,
      path:       self.path,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const SNAPSHOT_COLUMNS: &str = "snapshot_id, material_id, entity_id, \
   material_name, recorded_at, tags_json, characteristics_json";

/// Raw strings read from a `material_snapshots` row.
pub struct RawSnapshot {
  pub snapshot_id:          String,
  pub material_id:          String,
  pub entity_id:            String,
  pub material_name:        String,
  pub recorded_at:          String,
  pub tags_json:            String,
  pub characteristics_json: String,
}

impl RawSnapshot {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      snapshot_id:          row.get(0)?,
      material_id:          row.get(1)?,
      entity_id:            row.get(2)?,
      material_name:        row.get(3)?,
      recorded_at:          row.get(4)?,
      tags_json:            row.get(5)?,
      characteristics_json: row.get(6)?,
    })
  }

  pub fn into_snapshot(self) -> Result<MaterialSnapshot> {
    Ok(MaterialSnapshot {
      id:              decode_uuid(&self.snapshot_id)?,
      material_id:     decode_uuid(&self.material_id)?,
      entity_id:       decode_uuid(&self.entity_id)?,
      material_name:   self.material_name,
      recorded_at:     decode_dt(&self.recorded_at)?,
      tags:            serde_json::from_str(&self.tags_json)?,
      characteristics: serde_json::from_str(&self.characteristics_json)?,
    })
  }
}

pub const ROLE_COLUMNS: &str =
  "role_id, entity_id, name, permissions, created_at, updated_at";

/// Raw strings read from a `roles` row.
pub struct RawRole {
  pub role_id:     String,
  pub entity_id:   String,
  pub name:        String,
  pub permissions: String,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawRole {
  /// Read [`ROLE_COLUMNS`] starting at column `at`.
  pub fn from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      role_id:     row.get(at)?,
      entity_id:   row.get(at + 1)?,
      name:        row.get(at + 2)?,
      permissions: row.get(at + 3)?,
      created_at:  row.get(at + 4)?,
      updated_at:  row.get(at + 5)?,
    })
  }

  pub fn into_role(self) -> Result<Role> {
    Ok(Role {
      id:          decode_uuid(&self.role_id)?,
      entity_id:   decode_uuid(&self.entity_id)?,
      name:        self.name,
      permissions: serde_json::from_str(&self.permissions)?,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

pub const USER_COLUMNS: &str =
  "user_id, entity_id, email, name, role_id, active, created_at, password_hash";

/// Raw values read from a `users` row, password hash last.
pub struct RawUser {
  pub user_id:       String,
  pub entity_id:     String,
  pub email:         String,
  pub name:          String,
  pub role_id:       String,
  pub active:        bool,
  pub created_at:    String,
  pub password_hash: String,
}

impl RawUser {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      entity_id:     row.get(1)?,
      email:         row.get(2)?,
      name:          row.get(3)?,
      role_id:       row.get(4)?,
      active:        row.get(5)?,
      created_at:    row.get(6)?,
      password_hash: row.get(7)?,
    })
  }

  /// The user and its password hash.
  pub fn into_user(self) -> Result<(User, String)> {
    let user = User {
      id:         decode_uuid(&self.user_id)?,
      entity_id:  decode_uuid(&self.entity_id)?,
      email:      self.email,
      name:       self.name,
      role_id:    decode_uuid(&self.role_id)?,
      active:     self.active,
      created_at: decode_dt(&self.created_at)?,
    };
    Ok((user, self.password_hash))
  }
}

pub const AUDIT_COLUMNS: &str =
  "audit_id, entity_id, kind, subject_id, subject_name, recorded_at";

pub struct RawAudit {
  pub audit_id:     String,
  pub entity_id:    String,
  pub kind:         String,
  pub subject_id:   String,
  pub subject_name: String,
  pub recorded_at:  String,
}

impl RawAudit {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      audit_id:     row.get(0)?,
      entity_id:    row.get(1)?,
      kind:         row.get(2)?,
      subject_id:   row.get(3)?,
      subject_name: row.get(4)?,
      recorded_at:  row.get(5)?,
    })
  }

  pub fn into_entry(self) -> Result<AuditEntry> {
    Ok(AuditEntry {
      id:          decode_uuid(&self.audit_id)?,
      event:       AuditEvent {
        kind:         decode_audit_kind(&self.kind)?,
        subject_id:   decode_uuid(&self.subject_id)?,
        subject_name: self.subject_name,
        entity_id:    decode_uuid(&self.entity_id)?,
      },
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}
