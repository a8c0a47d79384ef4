//! Tenants, roles, users, and the permission codes roles grant.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use uuid::Uuid;

use crate::{
  Error, Result,
  validate::{self, ValidationErrors},
};

/// A permission code. Mutating actions each require one.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Permission {
  CharacteristicCreate,
  CharacteristicEdit,
  TagCreate,
  TagEdit,
  MaterialCreate,
  MaterialEdit,
  RoleCreate,
  RoleEdit,
  AuditView,
}

impl Permission {
  pub fn as_str(self) -> &'static str { self.into() }

  pub fn all() -> BTreeSet<Self> { Self::iter().collect() }
}

// ─── Entity ──────────────────────────────────────────────────────────────────

/// A tenant. Every other record is scoped to exactly one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
  pub id:         Uuid,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}

// ─── Roles ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
  pub id:          Uuid,
  pub entity_id:   Uuid,
  pub name:        String,
  pub permissions: BTreeSet<Permission>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// A role annotated with the number of users holding it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleUsage {
  #[serde(flatten)]
  pub role:  Role,
  pub users: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleInput {
  pub name:        String,
  #[serde(default)]
  pub permissions: BTreeSet<Permission>,
}

impl RoleInput {
  pub fn validated(self) -> Result<Self> {
    let mut errors = ValidationErrors::default();
    let name = validate::name(&mut errors, "name", &self.name);
    errors.finish(Self { name, permissions: self.permissions })
  }
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id:         Uuid,
  pub entity_id:  Uuid,
  pub email:      String,
  pub name:       String,
  pub role_id:    Uuid,
  pub active:     bool,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
  pub email:         String,
  pub name:          String,
  /// PHC string produced by argon2.
  pub password_hash: String,
  pub role_id:       Uuid,
}

/// A user with the secrets and grants needed to authenticate them.
#[derive(Debug, Clone)]
pub struct Principal {
  pub user:          User,
  pub password_hash: String,
  pub role:          Role,
}

// ─── Actor ───────────────────────────────────────────────────────────────────

/// The authenticated caller of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
  pub user_id:     Uuid,
  pub entity_id:   Uuid,
  pub email:       String,
  pub permissions: BTreeSet<Permission>,
}

impl Actor {
  pub fn from_principal(principal: &Principal) -> Self {
    Self {
      user_id:     principal.user.id,
      entity_id:   principal.user.entity_id,
      email:       principal.user.email.clone(),
      permissions: principal.role.permissions.clone(),
    }
  }

  pub fn can(&self, permission: Permission) -> bool {
    self.permissions.contains(&permission)
  }

  /// Fail with [`Error::MissingPermission`] unless `required` is granted.
  pub fn require(&self, required: Option<Permission>) -> Result<()> {
    match required {
      Some(p) if !self.can(p) => Err(Error::MissingPermission(p)),
      _ => Ok(()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn actor(permissions: &[Permission]) -> Actor {
    Actor {
      user_id:     Uuid::new_v4(),
      entity_id:   Uuid::new_v4(),
      email:       "ops@example.com".into(),
      permissions: permissions.iter().copied().collect(),
    }
  }

  #[test]
  fn permission_codes_are_snake_case() {
    assert_eq!(Permission::CharacteristicCreate.as_str(), "characteristic_create");
    assert_eq!(
      "tag_edit".parse::<Permission>().unwrap(),
      Permission::TagEdit
    );
    assert_eq!(
      serde_json::to_value(Permission::AuditView).unwrap(),
      serde_json::json!("audit_view")
    );
  }

  #[test]
  fn require_checks_the_grant() {
    let a = actor(&[Permission::TagCreate]);
    assert!(a.require(None).is_ok());
    assert!(a.require(Some(Permission::TagCreate)).is_ok());
    assert!(matches!(
      a.require(Some(Permission::TagEdit)),
      Err(Error::MissingPermission(Permission::TagEdit))
    ));
  }
}
