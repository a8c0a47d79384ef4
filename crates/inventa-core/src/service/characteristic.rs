use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::{
  Error, Result,
  audit::{self, AuditEvent, AuditKind, AuditLog},
  characteristic::{Characteristic, CharacteristicUpdate, NewCharacteristic},
  store::{Guarded, InventoryStore, Named, ReferenceScope},
};

/// CRUD over characteristic definitions.
///
/// Definition edits never touch history; only value edits do.
pub struct CharacteristicService<S> {
  store: Arc<S>,
}

impl<S> CharacteristicService<S>
where
  S: InventoryStore + AuditLog,
{
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Sorted by name.
  pub async fn list(&self, entity_id: Uuid) -> Result<Vec<Characteristic>> {
    self
      .store
      .list_characteristics(entity_id)
      .await
      .map_err(Error::storage)
  }

  pub async fn create(
    &self,
    entity_id: Uuid,
    input: NewCharacteristic,
  ) -> Result<Characteristic> {
    let input = input.validated()?;

    let created = match self
      .store
      .insert_characteristic(entity_id, input)
      .await
      .map_err(Error::storage)?
    {
      Named::Written(created) => created,
      Named::NameTaken | Named::Missing => return Err(Error::invalid("name", "name.unique")),
    };

    info!(id = %created.id, %entity_id, kind = %created.kind, "characteristic created");
    audit::record(
      &*self.store,
      AuditEvent::new(AuditKind::CharacteristicCreated, created.id, &created.name, entity_id),
    )
    .await;
    Ok(created)
  }

  pub async fn update(
    &self,
    id: Uuid,
    entity_id: Uuid,
    input: CharacteristicUpdate,
  ) -> Result<Characteristic> {
    let input = input.validated()?;

    let existing = self
      .store
      .get_characteristic(id, entity_id)
      .await
      .map_err(Error::storage)?
      .ok_or(Error::CharacteristicNotFound(id))?;
    let patch = input.into_patch(existing.kind)?;

    let updated = match self
      .store
      .update_characteristic(id, entity_id, patch)
      .await
      .map_err(Error::storage)?
    {
      Named::Written(updated) => updated,
      Named::NameTaken => return Err(Error::invalid("name", "name.unique")),
      Named::Missing => return Err(Error::CharacteristicNotFound(id)),
    };

    info!(%id, %entity_id, "characteristic updated");
    audit::record(
      &*self.store,
      AuditEvent::new(AuditKind::CharacteristicUpdated, id, &updated.name, entity_id),
    )
    .await;
    Ok(updated)
  }

  /// Refused while any active material holds a value for the characteristic.
  pub async fn delete(&self, id: Uuid, entity_id: Uuid) -> Result<Characteristic> {
    let outcome = self
      .store
      .delete_characteristic(id, entity_id, ReferenceScope::ActiveMaterials)
      .await
      .map_err(Error::storage)?;

    match outcome {
      Guarded::Deleted(deleted) => {
        info!(%id, %entity_id, "characteristic deleted");
        audit::record(
          &*self.store,
          AuditEvent::new(AuditKind::CharacteristicDeleted, id, &deleted.name, entity_id),
        )
        .await;
        Ok(deleted)
      }
      Guarded::Referenced(materials) => {
        Err(Error::CharacteristicHasMaterials { id, materials })
      }
      Guarded::Missing => Err(Error::CharacteristicNotFound(id)),
    }
  }
}
