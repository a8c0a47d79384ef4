//! Characteristic definitions: tenant-defined custom fields for materials.
//!
//! A characteristic's [`CharacteristicKind`] is fixed at creation. The kind
//! selects one of seven [`VariantGroup`]s, which in turn fixes the shape of
//! every value stored against the characteristic (see [`crate::value`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{
  Error, Result,
  validate::{self, DESCRIPTION_MAX, ValidationErrors},
};

// ─── Kinds ───────────────────────────────────────────────────────────────────

/// The closed set of characteristic types.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum CharacteristicKind {
  Text,
  Textarea,
  Link,
  Email,
  Number,
  Float,
  MultiText,
  MultiTextArea,
  MultiSelect,
  Select,
  Checkbox,
  Radio,
  Boolean,
  Date,
  DateHour,
  DateRange,
  DateHourRange,
  File,
}

/// The value-shape family a kind belongs to.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum VariantGroup {
  Scalar,
  Paragraphs,
  Choice,
  Boolean,
  Date,
  DateRange,
  File,
}

impl CharacteristicKind {
  /// Parse the wire name of a kind, e.g. `"multiSelect"`.
  pub fn parse(name: &str) -> Result<Self> {
    name
      .parse()
      .map_err(|_| Error::UnknownVariant(name.to_owned()))
  }

  /// The wire name, matching the serde representation.
  pub fn as_str(self) -> &'static str { self.into() }

  pub fn group(self) -> VariantGroup {
    match self {
      Self::Text
      | Self::Textarea
      | Self::Link
      | Self::Email
      | Self::Number
      | Self::Float => VariantGroup::Scalar,
      Self::MultiText | Self::MultiTextArea => VariantGroup::Paragraphs,
      Self::MultiSelect | Self::Select | Self::Checkbox | Self::Radio => {
        VariantGroup::Choice
      }
      Self::Boolean => VariantGroup::Boolean,
      Self::Date | Self::DateHour => VariantGroup::Date,
      Self::DateRange | Self::DateHourRange => VariantGroup::DateRange,
      Self::File => VariantGroup::File,
    }
  }

  /// Kinds whose values carry `units` into history.
  pub fn is_numeric(self) -> bool { matches!(self, Self::Number | Self::Float) }

  /// Kinds whose values are drawn from the characteristic's `options`.
  pub fn has_options(self) -> bool { self.group() == VariantGroup::Choice }
}

/// Map a kind's wire name to its variant group.
pub fn classify(name: &str) -> Result<VariantGroup> {
  CharacteristicKind::parse(name).map(CharacteristicKind::group)
}

// ─── Definition ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Characteristic {
  pub id:          Uuid,
  pub entity_id:   Uuid,
  pub name:        String,
  pub description: Option<String>,
  #[serde(rename = "type")]
  pub kind:        CharacteristicKind,
  pub options:     Option<Vec<String>>,
  pub units:       Option<String>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// Input to [`crate::service::CharacteristicService::create`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCharacteristic {
  pub name:        String,
  pub description: Option<String>,
  #[serde(rename = "type")]
  pub kind:        CharacteristicKind,
  pub options:     Option<Vec<String>>,
  pub units:       Option<String>,
}

impl NewCharacteristic {
  /// Trim and check every field, dropping `options`/`units` the kind does not
  /// use.
  pub fn validated(self) -> Result<Self> {
    let mut errors = ValidationErrors::default();
    let name = validate::name(&mut errors, "name", &self.name);
    let description = validate::optional_text(
      &mut errors,
      "description",
      self.description.as_deref(),
      DESCRIPTION_MAX,
    );
    let options = checked_options(&mut errors, self.kind, self.options);
    let units = if self.kind.is_numeric() {
      self
        .units
        .map(|u| u.trim().to_owned())
        .filter(|u| !u.is_empty())
    } else {
      None
    };

    errors.finish(Self { name, description, kind: self.kind, options, units })
  }
}

/// Editable fields. There is no `kind`: it is fixed at creation, and unknown
/// fields are rejected during deserialisation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CharacteristicUpdate {
  pub name:        String,
  pub description: Option<String>,
  /// `None` keeps the current options.
  #[serde(default)]
  pub options:     Option<Vec<String>>,
}

impl CharacteristicUpdate {
  /// Kind-independent checks; run before the target is loaded.
  pub fn validated(self) -> Result<Self> {
    let mut errors = ValidationErrors::default();
    let name = validate::name(&mut errors, "name", &self.name);
    let description = validate::optional_text(
      &mut errors,
      "description",
      self.description.as_deref(),
      DESCRIPTION_MAX,
    );
    errors.finish(Self { name, description, options: self.options })
  }

  /// Resolve `options` against the stored kind.
  pub fn into_patch(self, kind: CharacteristicKind) -> Result<CharacteristicPatch> {
    let mut errors = ValidationErrors::default();
    let options = self
      .options
      .and_then(|list| checked_options(&mut errors, kind, Some(list)));
    errors.finish(CharacteristicPatch {
      name: self.name,
      description: self.description,
      options,
    })
  }
}

/// A validated update as applied by the store.
#[derive(Debug, Clone)]
pub struct CharacteristicPatch {
  pub name:        String,
  pub description: Option<String>,
  /// `None` leaves the stored options untouched.
  pub options:     Option<Vec<String>>,
}

fn checked_options(
  errors: &mut ValidationErrors,
  kind: CharacteristicKind,
  options: Option<Vec<String>>,
) -> Option<Vec<String>> {
  if !kind.has_options() {
    return None;
  }
  let list: Vec<String> = options
    .unwrap_or_default()
    .into_iter()
    .map(|o| o.trim().to_owned())
    .filter(|o| !o.is_empty())
    .collect();
  if list.is_empty() {
    errors.add("options", "options.required");
  }
  Some(list)
}
