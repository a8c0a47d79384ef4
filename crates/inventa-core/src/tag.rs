//! Tags: coloured labels attached to materials.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result,
  validate::{self, ValidationErrors},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
  pub id:         Uuid,
  pub entity_id:  Uuid,
  pub name:       String,
  /// `#rrggbb`
  pub color:      String,
  pub font_color: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// A tag annotated with the number of non-deleted materials carrying it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagUsage {
  #[serde(flatten)]
  pub tag:       Tag,
  pub materials: u64,
}

/// Input to both create and update; every field is always supplied.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagInput {
  pub name:       String,
  pub color:      String,
  pub font_color: String,
}

impl TagInput {
  pub fn validated(self) -> Result<Self> {
    let mut errors = ValidationErrors::default();
    let name = validate::name(&mut errors, "name", &self.name);
    let color = validate::color(&mut errors, "color", &self.color);
    let font_color = validate::color(&mut errors, "fontColor", &self.font_color);
    errors.finish(Self { name, color, font_color })
  }
}

/// The result of a tag update as seen by the store.
///
/// `previous` and `active_materials` are read before the write, inside the
/// same transaction.
#[derive(Debug, Clone)]
pub struct TagRevision {
  pub previous:         Tag,
  pub current:          Tag,
  /// Non-deleted materials carrying the tag at update time.
  pub active_materials: Vec<Uuid>,
}

impl TagRevision {
  pub fn renamed(&self) -> bool { self.previous.name != self.current.name }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Error;

  #[test]
  fn reports_every_failing_field() {
    let input = TagInput {
      name:       "x".into(),
      color:      "red".into(),
      font_color: "#ffffff".into(),
    };
    let Err(Error::Validation(errors)) = input.validated() else {
      panic!("expected validation failure");
    };
    assert_eq!(errors.codes("name"), ["name.min"]);
    assert_eq!(errors.codes("color"), ["color.length"]);
    assert!(errors.codes("fontColor").is_empty());
  }

  #[test]
  fn usage_serialises_flat() {
    let now = Utc::now();
    let usage = TagUsage {
      tag: Tag {
        id:         Uuid::nil(),
        entity_id:  Uuid::nil(),
        name:       "Fragile".into(),
        color:      "#ff0000".into(),
        font_color: "#ffffff".into(),
        created_at: now,
        updated_at: now,
      },
      materials: 3,
    };
    let json = serde_json::to_value(&usage).unwrap();
    assert_eq!(json["name"], "Fragile");
    assert_eq!(json["fontColor"], "#ffffff");
    assert_eq!(json["materials"], 3);
  }
}
