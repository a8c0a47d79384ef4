//! Characteristic values in their live and historical forms.
//!
//! [`LiveValue`] is what a material currently carries; [`HistoricalValue`] is
//! the by-value copy embedded in a snapshot. Both are tagged unions with one
//! variant per [`VariantGroup`], so a value can never mix shapes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{
  Error, Result,
  characteristic::{CharacteristicKind, VariantGroup},
  material::StoredFile,
};

// ─── Payload sub-types ───────────────────────────────────────────────────────

/// One titled block of a multi-paragraph value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Paragraph {
  pub title: String,
  pub text:  String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DateValue {
  pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DateRangeValue {
  pub from: DateTime<Utc>,
  pub to:   DateTime<Utc>,
}

/// A reference to a file already registered with the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileRef {
  pub id:        Uuid,
  pub name:      String,
  #[serde(rename = "type")]
  pub mime_type: String,
}

/// Attached files plus the edits a client has queued but not applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FileValue {
  pub files:          Vec<FileRef>,
  #[serde(default)]
  pub pending_add:    Vec<FileRef>,
  #[serde(default)]
  pub pending_delete: Vec<Uuid>,
}

impl FileValue {
  /// Apply the pending lists: `files + pending_add - pending_delete`.
  /// The result has empty pending lists and no duplicate ids.
  pub fn settle(self) -> Self {
    let mut files: Vec<FileRef> = Vec::with_capacity(self.files.len());
    for file in self.files.into_iter().chain(self.pending_add) {
      if self.pending_delete.contains(&file.id)
        || files.iter().any(|f| f.id == file.id)
      {
        continue;
      }
      files.push(file);
    }
    Self { files, pending_add: Vec::new(), pending_delete: Vec::new() }
  }
}

/// A file as it looked when a snapshot was taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalFile {
  #[serde(rename = "type")]
  pub mime_type: String,
  pub name:      String,
  pub path:      String,
}

// ─── LiveValue ───────────────────────────────────────────────────────────────

/// The value a material currently holds for one characteristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "value", rename_all = "camelCase")]
pub enum LiveValue {
  Scalar(String),
  Paragraphs(Vec<Paragraph>),
  Choice(Vec<String>),
  Boolean(bool),
  Date(DateValue),
  DateRange(DateRangeValue),
  File(FileValue),
}

impl LiveValue {
  pub fn group(&self) -> VariantGroup {
    match self {
      Self::Scalar(_) => VariantGroup::Scalar,
      Self::Paragraphs(_) => VariantGroup::Paragraphs,
      Self::Choice(_) => VariantGroup::Choice,
      Self::Boolean(_) => VariantGroup::Boolean,
      Self::Date(_) => VariantGroup::Date,
      Self::DateRange(_) => VariantGroup::DateRange,
      Self::File(_) => VariantGroup::File,
    }
  }

  /// Parse an untyped payload into the shape `kind` requires.
  ///
  /// Fails with [`Error::ShapeMismatch`] when the payload has any other
  /// shape.
  pub fn from_json(kind: CharacteristicKind, data: serde_json::Value) -> Result<Self> {
    fn shaped<T: DeserializeOwned>(
      kind: CharacteristicKind,
      data: serde_json::Value,
    ) -> Result<T> {
      serde_json::from_value(data)
        .map_err(|_| Error::ShapeMismatch { kind, expected: kind.group() })
    }

    Ok(match kind.group() {
      VariantGroup::Scalar => Self::Scalar(shaped(kind, data)?),
      VariantGroup::Paragraphs => Self::Paragraphs(shaped(kind, data)?),
      VariantGroup::Choice => Self::Choice(shaped(kind, data)?),
      VariantGroup::Boolean => Self::Boolean(shaped(kind, data)?),
      VariantGroup::Date => Self::Date(shaped(kind, data)?),
      VariantGroup::DateRange => Self::DateRange(shaped(kind, data)?),
      VariantGroup::File => Self::File(shaped(kind, data)?),
    })
  }

  /// The inner payload without the shape tag; the inverse of
  /// [`LiveValue::from_json`].
  pub fn to_json(&self) -> Result<serde_json::Value> {
    let full = serde_json::to_value(self)?;
    Ok(full.get("value").cloned().unwrap_or(serde_json::Value::Null))
  }
}

/// Check that `value` has the shape `kind` requires.
pub fn validate_live_value(kind: CharacteristicKind, value: &LiveValue) -> Result<()> {
  if value.group() == kind.group() {
    Ok(())
  } else {
    Err(Error::ShapeMismatch { kind, expected: kind.group() })
  }
}

// ─── HistoricalValue ─────────────────────────────────────────────────────────

/// Resolved file metadata keyed by file id, supplied by the caller of
/// [`to_historical`].
pub type FileIndex = HashMap<Uuid, StoredFile>;

/// A characteristic value frozen inside a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "value", rename_all = "camelCase")]
pub enum HistoricalValue {
  Scalar {
    value: String,
    /// Present for `number` and `float` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    units: Option<String>,
  },
  Paragraphs(Vec<Paragraph>),
  Choice(Vec<String>),
  Boolean(bool),
  Date(DateValue),
  DateRange(DateRangeValue),
  File(Vec<HistoricalFile>),
}

/// Convert a live value into its snapshot form.
///
/// Pure: file metadata comes from `files`, and attachments whose id is not in
/// the index are left out of the snapshot.
pub fn to_historical(
  kind: CharacteristicKind,
  value: &LiveValue,
  units: Option<&str>,
  files: &FileIndex,
) -> Result<HistoricalValue> {
  validate_live_value(kind, value)?;

  Ok(match value {
    LiveValue::Scalar(s) => HistoricalValue::Scalar {
      value: s.clone(),
      units: units.filter(|_| kind.is_numeric()).map(str::to_owned),
    },
    LiveValue::Paragraphs(p) => HistoricalValue::Paragraphs(p.clone()),
    LiveValue::Choice(c) => HistoricalValue::Choice(c.clone()),
    LiveValue::Boolean(b) => HistoricalValue::Boolean(*b),
    LiveValue::Date(d) => HistoricalValue::Date(*d),
    LiveValue::DateRange(r) => HistoricalValue::DateRange(*r),
    LiveValue::File(f) => HistoricalValue::File(
      f.files
        .iter()
        .filter_map(|r| files.get(&r.id))
        .map(|stored| HistoricalFile {
          mime_type: stored.mime_type.clone(),
          name:      stored.name.clone(),
          path:      stored.path.clone(),
        })
        .collect(),
    ),
  })
}
