//! Material history snapshots and their regeneration.
//!
//! A snapshot is an append-only, by-value copy of a material's tags and
//! characteristic values. Later edits to a tag or characteristic never reach
//! back into existing snapshots; they only cause new ones to be appended.

use std::{future::Future, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error};
use uuid::Uuid;

use crate::{
  Error, Result,
  characteristic::CharacteristicKind,
  material::MaterialState,
  store::InventoryStore,
  tag::Tag,
  value::{FileIndex, HistoricalValue, to_historical},
};

// ─── Snapshot types ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalTag {
  pub name:       String,
  pub color:      String,
  pub font_color: String,
}

impl From<&Tag> for HistoricalTag {
  fn from(tag: &Tag) -> Self {
    Self {
      name:       tag.name.clone(),
      color:      tag.color.clone(),
      font_color: tag.font_color.clone(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalCharacteristic {
  pub characteristic_id: Uuid,
  pub name:              String,
  #[serde(rename = "type")]
  pub kind:              CharacteristicKind,
  pub value:             HistoricalValue,
}

/// Input to [`InventoryStore::append_snapshot`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewSnapshot {
  pub material_id:     Uuid,
  pub entity_id:       Uuid,
  pub material_name:   String,
  pub tags:            Vec<HistoricalTag>,
  pub characteristics: Vec<HistoricalCharacteristic>,
}

/// An immutable point-in-time record of one material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialSnapshot {
  pub id:              Uuid,
  pub material_id:     Uuid,
  pub entity_id:       Uuid,
  pub material_name:   String,
  pub recorded_at:     DateTime<Utc>,
  pub tags:            Vec<HistoricalTag>,
  pub characteristics: Vec<HistoricalCharacteristic>,
}

/// Freeze `state` into a snapshot. Tags and characteristics are ordered by
/// name so equal states produce equal snapshots.
pub fn build_snapshot(state: &MaterialState) -> Result<NewSnapshot> {
  let files: FileIndex =
    state.files.iter().map(|f| (f.id, f.clone())).collect();

  let mut tags: Vec<HistoricalTag> =
    state.tags.iter().map(HistoricalTag::from).collect();
  tags.sort_by(|a, b| a.name.cmp(&b.name));

  let mut characteristics = state
    .values
    .iter()
    .map(|mv| {
      let c = &mv.characteristic;
      Ok(HistoricalCharacteristic {
        characteristic_id: c.id,
        name:              c.name.clone(),
        kind:              c.kind,
        value:             to_historical(c.kind, &mv.value, c.units.as_deref(), &files)?,
      })
    })
    .collect::<Result<Vec<_>>>()?;
  characteristics.sort_by(|a, b| a.name.cmp(&b.name));

  Ok(NewSnapshot {
    material_id: state.material.id,
    entity_id: state.material.entity_id,
    material_name: state.material.name.clone(),
    tags,
    characteristics,
  })
}

// ─── Generator ───────────────────────────────────────────────────────────────

/// Computes and persists a fresh snapshot of one material.
pub trait HistoryGenerator: Send + Sync + 'static {
  fn regenerate(
    &self,
    material_id: Uuid,
  ) -> impl Future<Output = Result<()>> + Send + '_;
}

/// The default generator: reads the material through the store, converts it
/// with [`build_snapshot`], and appends the result.
pub struct StoreHistory<S> {
  store: Arc<S>,
}

impl<S> StoreHistory<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }
}

impl<S: InventoryStore> HistoryGenerator for StoreHistory<S> {
  async fn regenerate(&self, material_id: Uuid) -> Result<()> {
    let state = self
      .store
      .material_state(material_id)
      .await
      .map_err(Error::storage)?
      .ok_or(Error::MaterialNotFound(material_id))?;

    let snapshot = build_snapshot(&state)?;
    self
      .store
      .append_snapshot(snapshot)
      .await
      .map_err(Error::storage)?;
    Ok(())
  }
}

/// Regenerate snapshots for `material_ids` on a detached task.
///
/// The caller is never blocked and never sees a failure: each material runs
/// in its own task, errors and panics are logged. The handle resolves once
/// every regeneration has finished; dropping it detaches the work.
pub fn schedule<H: HistoryGenerator>(
  generator: Arc<H>,
  material_ids: Vec<Uuid>,
) -> JoinHandle<()> {
  tokio::spawn(async move {
    let mut tasks = JoinSet::new();
    for material_id in material_ids {
      let generator = Arc::clone(&generator);
      tasks.spawn(async move {
        let outcome = generator.regenerate(material_id).await;
        (material_id, outcome)
      });
    }

    while let Some(joined) = tasks.join_next().await {
      match joined {
        Ok((material_id, Ok(()))) => {
          debug!(%material_id, "history snapshot appended");
        }
        Ok((material_id, Err(e))) => {
          error!(%material_id, error = %e, "history regeneration failed");
        }
        Err(e) => error!(error = %e, "history regeneration task aborted"),
      }
    }
  })
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use super::*;
  use crate::{
    characteristic::Characteristic,
    material::{Material, MaterialValue, StoredFile},
    value::{FileRef, FileValue, HistoricalFile, LiveValue},
  };

  fn state() -> MaterialState {
    let now = Utc::now();
    let entity_id = Uuid::new_v4();
    let material = Material {
      id: Uuid::new_v4(),
      entity_id,
      name: "Pallet 7".into(),
      created_at: now,
      deleted_at: None,
    };
    let tag = |name: &str| Tag {
      id: Uuid::new_v4(),
      entity_id,
      name: name.into(),
      color: "#ff0000".into(),
      font_color: "#ffffff".into(),
      created_at: now,
      updated_at: now,
    };
    let characteristic = |name: &str, kind, units: Option<&str>| Characteristic {
      id: Uuid::new_v4(),
      entity_id,
      name: name.into(),
      description: None,
      kind,
      options: None,
      units: units.map(str::to_owned),
      created_at: now,
      updated_at: now,
    };
    let file = StoredFile {
      id: Uuid::new_v4(),
      entity_id,
      name: "photo.jpg".into(),
      mime_type: "image/jpeg".into(),
      path: "files/photo.jpg".into(),
      created_at: now,
    };

    MaterialState {
      material,
      tags: vec![tag("Heavy"), tag("Fragile")],
      values: vec![
        MaterialValue {
          characteristic: characteristic("Weight", CharacteristicKind::Number, Some("kg")),
          value:          LiveValue::Scalar("40".into()),
        },
        MaterialValue {
          characteristic: characteristic("Photos", CharacteristicKind::File, None),
          value:          LiveValue::File(FileValue {
            files: vec![FileRef {
              id:        file.id,
              name:      "photo.jpg".into(),
              mime_type: "image/jpeg".into(),
            }],
            ..Default::default()
          }),
        },
      ],
      files: vec![file],
    }
  }

  #[test]
  fn snapshot_copies_tags_and_values_by_value() {
    let state = state();
    let snapshot = build_snapshot(&state).unwrap();

    assert_eq!(snapshot.material_id, state.material.id);
    let names: Vec<_> = snapshot.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["Fragile", "Heavy"]);

    assert_eq!(snapshot.characteristics[0].name, "Photos");
    assert_eq!(
      snapshot.characteristics[0].value,
      HistoricalValue::File(vec![HistoricalFile {
        mime_type: "image/jpeg".into(),
        name:      "photo.jpg".into(),
        path:      "files/photo.jpg".into(),
      }])
    );
    assert_eq!(
      snapshot.characteristics[1].value,
      HistoricalValue::Scalar { value: "40".into(), units: Some("kg".into()) }
    );
  }

  #[test]
  fn snapshot_is_deterministic() {
    let state = state();
    assert_eq!(build_snapshot(&state).unwrap(), build_snapshot(&state).unwrap());
  }

  struct Flaky {
    seen: Mutex<Vec<Uuid>>,
    fail: Uuid,
  }

  impl HistoryGenerator for Flaky {
    async fn regenerate(&self, material_id: Uuid) -> Result<()> {
      self.seen.lock().unwrap().push(material_id);
      if material_id == self.fail {
        return Err(Error::MaterialNotFound(material_id));
      }
      Ok(())
    }
  }

  #[tokio::test]
  async fn schedule_survives_individual_failures() {
    let ok = Uuid::new_v4();
    let bad = Uuid::new_v4();
    let generator = Arc::new(Flaky { seen: Mutex::default(), fail: bad });

    schedule(Arc::clone(&generator), vec![bad, ok]).await.unwrap();

    let mut seen = generator.seen.lock().unwrap().clone();
    seen.sort();
    let mut expected = vec![ok, bad];
    expected.sort();
    assert_eq!(seen, expected);
  }
}
