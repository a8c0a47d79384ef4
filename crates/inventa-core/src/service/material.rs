use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::{
  Error, Result,
  audit::{self, AuditEvent, AuditKind, AuditLog},
  history::{self, HistoryGenerator, MaterialSnapshot},
  material::{Material, MaterialState, NewFile, NewMaterial, StoredFile},
  store::{InventoryStore, ValueWrite},
  tag::Tag,
  value::LiveValue,
};

/// Materials, their tag sets and characteristic values.
///
/// Every edit to a material schedules a fresh history snapshot.
pub struct MaterialService<S, H> {
  store:   Arc<S>,
  history: Arc<H>,
}

impl<S, H> MaterialService<S, H>
where
  S: InventoryStore + AuditLog,
  H: HistoryGenerator,
{
  pub fn new(store: Arc<S>, history: Arc<H>) -> Self { Self { store, history } }

  pub async fn create(&self, entity_id: Uuid, input: NewMaterial) -> Result<Material> {
    let input = input.validated()?;
    let created = self
      .store
      .insert_material(entity_id, input)
      .await
      .map_err(Error::storage)?;

    info!(id = %created.id, %entity_id, "material created");
    self.touched(AuditKind::MaterialCreated, &created).await;
    Ok(created)
  }

  /// The material with its tags and values. Soft-deleted materials are not
  /// found.
  pub async fn get(&self, id: Uuid, entity_id: Uuid) -> Result<MaterialState> {
    self.active(id, entity_id).await?;
    self
      .store
      .material_state(id)
      .await
      .map_err(Error::storage)?
      .ok_or(Error::MaterialNotFound(id))
  }

  /// Replace the tag set. Every id must be a tag of the same entity.
  pub async fn set_tags(
    &self,
    id: Uuid,
    entity_id: Uuid,
    tag_ids: Vec<Uuid>,
  ) -> Result<Vec<Tag>> {
    let mut tag_ids = tag_ids;
    tag_ids.sort();
    tag_ids.dedup();

    let material = self.active(id, entity_id).await?;
    let tags = self
      .store
      .find_tags(entity_id, tag_ids.clone())
      .await
      .map_err(Error::storage)?;
    if tags.len() != tag_ids.len() {
      return Err(Error::invalid("tags", "tags.unknown"));
    }

    self
      .store
      .replace_material_tags(id, tag_ids)
      .await
      .map_err(Error::storage)?;

    info!(%id, tags = tags.len(), "material tags replaced");
    self.touched(AuditKind::MaterialUpdated, &material).await;
    Ok(tags)
  }

  /// Store one characteristic value, returning it as persisted.
  ///
  /// `data` is checked against the characteristic's kind; choice values must
  /// come from its options, and pending file edits are applied before saving.
  pub async fn set_value(
    &self,
    id: Uuid,
    entity_id: Uuid,
    characteristic_id: Uuid,
    data: serde_json::Value,
  ) -> Result<LiveValue> {
    let characteristic = self
      .store
      .get_characteristic(characteristic_id, entity_id)
      .await
      .map_err(Error::storage)?
      .ok_or(Error::CharacteristicNotFound(characteristic_id))?;

    let value = match LiveValue::from_json(characteristic.kind, data)? {
      LiveValue::Choice(selected) => {
        let options = characteristic.options.as_deref().unwrap_or_default();
        if selected.iter().any(|s| !options.contains(s)) {
          return Err(Error::invalid("value", "value.option"));
        }
        LiveValue::Choice(selected)
      }
      LiveValue::File(files) => LiveValue::File(files.settle()),
      other => other,
    };

    let material = self.active(id, entity_id).await?;
    let written = self
      .store
      .put_material_value(id, entity_id, characteristic_id, value.clone())
      .await
      .map_err(Error::storage)?;
    match written {
      ValueWrite::Stored => {}
      ValueWrite::MaterialMissing => return Err(Error::MaterialNotFound(id)),
      ValueWrite::CharacteristicMissing => {
        return Err(Error::CharacteristicNotFound(characteristic_id));
      }
    }

    info!(%id, %characteristic_id, "material value set");
    self.touched(AuditKind::MaterialUpdated, &material).await;
    Ok(value)
  }

  pub async fn soft_delete(&self, id: Uuid, entity_id: Uuid) -> Result<Material> {
    self.active(id, entity_id).await?;
    let deleted = self
      .store
      .soft_delete_material(id, entity_id)
      .await
      .map_err(Error::storage)?
      .ok_or(Error::MaterialNotFound(id))?;

    info!(%id, %entity_id, "material deleted");
    audit::record(
      &*self.store,
      AuditEvent::new(AuditKind::MaterialDeleted, id, &deleted.name, entity_id),
    )
    .await;
    Ok(deleted)
  }

  /// Snapshots, newest first. Available for soft-deleted materials too.
  pub async fn history(&self, id: Uuid, entity_id: Uuid) -> Result<Vec<MaterialSnapshot>> {
    self
      .store
      .get_material(id, entity_id)
      .await
      .map_err(Error::storage)?
      .ok_or(Error::MaterialNotFound(id))?;
    self.store.list_snapshots(id).await.map_err(Error::storage)
  }

  /// Record metadata for a file already placed in external storage.
  pub async fn register_file(&self, entity_id: Uuid, input: NewFile) -> Result<StoredFile> {
    let input = input.validated()?;
    let file = self
      .store
      .insert_file(entity_id, input)
      .await
      .map_err(Error::storage)?;

    audit::record(
      &*self.store,
      AuditEvent::new(AuditKind::FileRegistered, file.id, &file.name, entity_id),
    )
    .await;
    Ok(file)
  }

  async fn active(&self, id: Uuid, entity_id: Uuid) -> Result<Material> {
    self
      .store
      .get_material(id, entity_id)
      .await
      .map_err(Error::storage)?
      .filter(Material::is_active)
      .ok_or(Error::MaterialNotFound(id))
  }

  async fn touched(&self, kind: AuditKind, material: &Material) {
    audit::record(
      &*self.store,
      AuditEvent::new(kind, material.id, &material.name, material.entity_id),
    )
    .await;
    history::schedule(Arc::clone(&self.history), vec![material.id]);
  }
}
