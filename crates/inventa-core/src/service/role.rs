use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::{
  Error, Result,
  access::{Role, RoleInput, RoleUsage},
  audit::{self, AuditEvent, AuditKind, AuditLog},
  store::{Guarded, InventoryStore},
};

pub struct RoleService<S> {
  store: Arc<S>,
}

impl<S> RoleService<S>
where
  S: InventoryStore + AuditLog,
{
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  pub async fn list(&self, entity_id: Uuid) -> Result<Vec<RoleUsage>> {
    self.store.list_roles(entity_id).await.map_err(Error::storage)
  }

  pub async fn create(&self, entity_id: Uuid, input: RoleInput) -> Result<Role> {
    let input = input.validated()?;
    let role = self
      .store
      .insert_role(entity_id, input)
      .await
      .map_err(Error::storage)?;

    info!(id = %role.id, %entity_id, "role created");
    audit::record(
      &*self.store,
      AuditEvent::new(AuditKind::RoleCreated, role.id, &role.name, entity_id),
    )
    .await;
    Ok(role)
  }

  pub async fn update(&self, id: Uuid, entity_id: Uuid, input: RoleInput) -> Result<Role> {
    let input = input.validated()?;
    let role = self
      .store
      .update_role(id, entity_id, input)
      .await
      .map_err(Error::storage)?
      .ok_or(Error::RoleNotFound(id))?;

    info!(%id, %entity_id, "role updated");
    audit::record(
      &*self.store,
      AuditEvent::new(AuditKind::RoleUpdated, id, &role.name, entity_id),
    )
    .await;
    Ok(role)
  }

  /// Refused while any user holds the role.
  pub async fn delete(&self, id: Uuid, entity_id: Uuid) -> Result<Role> {
    match self
      .store
      .delete_role(id, entity_id)
      .await
      .map_err(Error::storage)?
    {
      Guarded::Deleted(role) => {
        info!(%id, %entity_id, "role deleted");
        audit::record(
          &*self.store,
          AuditEvent::new(AuditKind::RoleDeleted, id, &role.name, entity_id),
        )
        .await;
        Ok(role)
      }
      Guarded::Referenced(users) => Err(Error::RoleHasUsers { id, users }),
      Guarded::Missing => Err(Error::RoleNotFound(id)),
    }
  }
}
