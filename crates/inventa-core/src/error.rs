//! Error types for `inventa-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::{
  access::Permission,
  characteristic::{CharacteristicKind, VariantGroup},
  validate::ValidationErrors,
};

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid input: {0}")]
  Validation(ValidationErrors),

  #[error("unknown characteristic type: {0:?}")]
  UnknownVariant(String),

  #[error("value does not have the {expected} shape required by {kind}")]
  ShapeMismatch {
    kind:     CharacteristicKind,
    expected: VariantGroup,
  },

  #[error("characteristic not found: {0}")]
  CharacteristicNotFound(Uuid),

  #[error("characteristic {id} is used by {materials} material(s)")]
  CharacteristicHasMaterials { id: Uuid, materials: u64 },

  #[error("tag not found: {0}")]
  TagNotFound(Uuid),

  #[error("tag {id} is used by {materials} material(s)")]
  TagHasMaterials { id: Uuid, materials: u64 },

  #[error("role not found: {0}")]
  RoleNotFound(Uuid),

  #[error("role {id} is held by {users} user(s)")]
  RoleHasUsers { id: Uuid, users: u64 },

  #[error("material not found: {0}")]
  MaterialNotFound(Uuid),

  #[error("no active session")]
  NoActiveSession,

  #[error("missing permission: {0}")]
  MissingPermission(Permission),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error.
  pub fn storage<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Storage(Box::new(e))
  }

  /// A single-field validation failure.
  pub fn invalid(field: &str, code: &str) -> Self {
    let mut errors = ValidationErrors::default();
    errors.add(field, code);
    Self::Validation(errors)
  }

  /// The stable discriminator shown to callers.
  ///
  /// Only expected business-rule failures carry a code. Everything else
  /// returns `None` and must be reported as a generic server error.
  pub fn code(&self) -> Option<&'static str> {
    match self {
      Self::Validation(_) => Some("validation"),
      Self::UnknownVariant(_) => Some("unknownVariant"),
      Self::ShapeMismatch { .. } => Some("shapeMismatch"),
      Self::CharacteristicNotFound(_) => Some("characteristicNotFound"),
      Self::CharacteristicHasMaterials { .. } => {
        Some("characteristicHasMaterials")
      }
      Self::TagNotFound(_) => Some("tagNotFound"),
      Self::TagHasMaterials { .. } => Some("tagHasMaterials"),
      Self::RoleNotFound(_) => Some("roleNotFound"),
      Self::RoleHasUsers { .. } => Some("roleHasUsers"),
      Self::MaterialNotFound(_) => Some("materialNotFound"),
      Self::NoActiveSession => Some("noActiveSession"),
      Self::MissingPermission(_) => Some("missingPermission"),
      Self::Serialization(_) | Self::Storage(_) => None,
    }
  }
}

impl From<ValidationErrors> for Error {
  fn from(errors: ValidationErrors) -> Self { Self::Validation(errors) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn infrastructure_errors_have_no_public_code() {
    let io = std::io::Error::other("disk on fire");
    assert_eq!(Error::storage(io).code(), None);

    let json = serde_json::from_str::<u8>("nope").unwrap_err();
    assert_eq!(Error::from(json).code(), None);
  }

  #[test]
  fn business_errors_expose_stable_codes() {
    let id = Uuid::new_v4();
    assert_eq!(
      Error::CharacteristicHasMaterials { id, materials: 2 }.code(),
      Some("characteristicHasMaterials"),
    );
    assert_eq!(Error::TagNotFound(id).code(), Some("tagNotFound"));
    assert_eq!(
      Error::RoleHasUsers { id, users: 1 }.code(),
      Some("roleHasUsers"),
    );
    assert_eq!(
      Error::MissingPermission(Permission::TagEdit).code(),
      Some("missingPermission"),
    );
  }
}
