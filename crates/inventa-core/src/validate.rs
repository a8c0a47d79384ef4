//! Input constraints shared by the services.
//!
//! Failures are collected per field so the caller can report all of them at
//! once. Codes follow the `<field>.<rule>` convention, e.g. `name.min`.

use std::{collections::BTreeMap, fmt};

use serde::Serialize;

use crate::Result;

pub const NAME_MIN: usize = 2;
pub const NAME_MAX: usize = 64;
pub const DESCRIPTION_MAX: usize = 255;
pub const COLOR_LEN: usize = 7;

/// Field name → failed rule codes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
  fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
  pub fn add(&mut self, field: &str, code: &str) {
    self
      .fields
      .entry(field.to_owned())
      .or_default()
      .push(code.to_owned());
  }

  pub fn is_empty(&self) -> bool { self.fields.is_empty() }

  /// Codes recorded against `field`, in insertion order.
  pub fn codes(&self, field: &str) -> &[String] {
    self.fields.get(field).map(Vec::as_slice).unwrap_or_default()
  }

  /// `Ok(value)` when nothing was recorded.
  pub fn finish<T>(self, value: T) -> Result<T> {
    if self.is_empty() {
      Ok(value)
    } else {
      Err(self.into())
    }
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let codes: Vec<&str> = self
      .fields
      .values()
      .flatten()
      .map(String::as_str)
      .collect();
    f.write_str(&codes.join(", "))
  }
}

// ─── Rules ───────────────────────────────────────────────────────────────────

/// Trim `value` and check it against the 2–64 character name bounds.
pub fn name(errors: &mut ValidationErrors, field: &str, value: &str) -> String {
  let trimmed = value.trim();
  let len = trimmed.chars().count();
  if len < NAME_MIN {
    errors.add(field, &format!("{field}.min"));
  } else if len > NAME_MAX {
    errors.add(field, &format!("{field}.max"));
  }
  trimmed.to_owned()
}

/// Trim an optional free-text value; blank becomes `None`.
pub fn optional_text(
  errors: &mut ValidationErrors,
  field: &str,
  value: Option<&str>,
  max: usize,
) -> Option<String> {
  let trimmed = value.map(str::trim).filter(|s| !s.is_empty())?;
  if trimmed.chars().count() > max {
    errors.add(field, &format!("{field}.max"));
  }
  Some(trimmed.to_owned())
}

/// A `#rrggbb` colour; only the length is enforced.
pub fn color(errors: &mut ValidationErrors, field: &str, value: &str) -> String {
  if value.chars().count() != COLOR_LEN {
    errors.add(field, &format!("{field}.length"));
  }
  value.to_owned()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn name_bounds() {
    let mut errors = ValidationErrors::default();
    name(&mut errors, "name", "a");
    assert_eq!(errors.codes("name"), ["name.min"]);

    let mut errors = ValidationErrors::default();
    name(&mut errors, "name", &"x".repeat(64));
    assert!(errors.is_empty());

    let mut errors = ValidationErrors::default();
    name(&mut errors, "name", &"x".repeat(65));
    assert_eq!(errors.codes("name"), ["name.max"]);
  }

  #[test]
  fn name_is_trimmed_before_measuring() {
    let mut errors = ValidationErrors::default();
    let trimmed = name(&mut errors, "name", "  a  ");
    assert_eq!(trimmed, "a");
    assert_eq!(errors.codes("name"), ["name.min"]);
  }

  #[test]
  fn blank_optional_text_is_none() {
    let mut errors = ValidationErrors::default();
    assert_eq!(optional_text(&mut errors, "description", Some("   "), 255), None);
    assert!(errors.is_empty());

    let long = "d".repeat(256);
    optional_text(&mut errors, "description", Some(&long), 255);
    assert_eq!(errors.codes("description"), ["description.max"]);
  }

  #[test]
  fn color_length_is_exactly_seven() {
    let mut errors = ValidationErrors::default();
    color(&mut errors, "color", "#ff0000");
    assert!(errors.is_empty());
    color(&mut errors, "fontColor", "#fff");
    assert_eq!(errors.codes("fontColor"), ["fontColor.length"]);
  }
}
