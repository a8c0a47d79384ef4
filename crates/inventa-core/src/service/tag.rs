use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Error, Result,
  audit::{self, AuditEvent, AuditKind, AuditLog},
  history::{self, HistoryGenerator},
  store::{Guarded, InventoryStore, ReferenceScope},
  tag::{Tag, TagInput, TagUsage},
};

/// CRUD over tags. A rename re-snapshots every active material carrying the
/// tag.
pub struct TagService<S, H> {
  store:   Arc<S>,
  history: Arc<H>,
}

impl<S, H> TagService<S, H>
where
  S: InventoryStore + AuditLog,
  H: HistoryGenerator,
{
  pub fn new(store: Arc<S>, history: Arc<H>) -> Self { Self { store, history } }

  /// Sorted by name, each with its active-material count.
  pub async fn list(&self, entity_id: Uuid) -> Result<Vec<TagUsage>> {
    self.store.list_tags(entity_id).await.map_err(Error::storage)
  }

  pub async fn create(&self, entity_id: Uuid, input: TagInput) -> Result<Tag> {
    let input = input.validated()?;
    let created = self
      .store
      .insert_tag(entity_id, input)
      .await
      .map_err(Error::storage)?;

    info!(id = %created.id, %entity_id, "tag created");
    audit::record(
      &*self.store,
      AuditEvent::new(AuditKind::TagCreated, created.id, &created.name, entity_id),
    )
    .await;
    Ok(created)
  }

  /// Returns as soon as the tag is written. When the name changed, snapshot
  /// regeneration for the affected materials continues in the background.
  pub async fn update(&self, id: Uuid, entity_id: Uuid, input: TagInput) -> Result<Tag> {
    let input = input.validated()?;
    let revision = self
      .store
      .update_tag(id, entity_id, input)
      .await
      .map_err(Error::storage)?
      .ok_or(Error::TagNotFound(id))?;

    if revision.renamed() && !revision.active_materials.is_empty() {
      info!(
        %id,
        materials = revision.active_materials.len(),
        "tag renamed, regenerating material history",
      );
      history::schedule(Arc::clone(&self.history), revision.active_materials);
    } else {
      debug!(%id, renamed = revision.renamed(), "tag updated without history regeneration");
    }

    audit::record(
      &*self.store,
      AuditEvent::new(AuditKind::TagUpdated, id, &revision.current.name, entity_id),
    )
    .await;
    Ok(revision.current)
  }

  /// Refused while any material row, soft-deleted or not, carries the tag.
  pub async fn delete(&self, id: Uuid, entity_id: Uuid) -> Result<Tag> {
    let outcome = self
      .store
      .delete_tag(id, entity_id, ReferenceScope::AllMaterials)
      .await
      .map_err(Error::storage)?;

    match outcome {
      Guarded::Deleted(deleted) => {
        info!(%id, %entity_id, "tag deleted");
        audit::record(
          &*self.store,
          AuditEvent::new(AuditKind::TagDeleted, id, &deleted.name, entity_id),
        )
        .await;
        Ok(deleted)
      }
      Guarded::Referenced(materials) => Err(Error::TagHasMaterials { id, materials }),
      Guarded::Missing => Err(Error::TagNotFound(id)),
    }
  }
}
