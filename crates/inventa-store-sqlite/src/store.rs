//! [`SqliteStore`]: the SQLite implementation of [`InventoryStore`] and
//! [`AuditLog`].

use std::path::Path;

use inventa_core::{
  access::{Entity, NewUser, Principal, Role, RoleInput, RoleUsage, User},
  audit::{AuditEntry, AuditEvent, AuditLog},
  characteristic::{Characteristic, CharacteristicPatch, NewCharacteristic},
  history::{MaterialSnapshot, NewSnapshot},
  material::{Material, MaterialState, NewFile, NewMaterial, StoredFile},
  store::{Guarded, InventoryStore, Named, ReferenceScope, ValueWrite},
  tag::{Tag, TagInput, TagRevision, TagUsage},
  value::LiveValue,
};
use uuid::Uuid;

use crate::{
  Result,
  queries::{access, audit, characteristics, history, materials, tags},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Inventa store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    tracing::info!(path = %path.display(), "opened store");
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Close the underlying connection, flushing the WAL.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::debug!("schema initialised");
    Ok(())
  }

  /// Run `f` on the connection thread.
  async fn run<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&mut rusqlite::Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }
}

#[cfg(test)]
impl SqliteStore {
  /// Run a raw statement, returning the number of changed rows.
  pub(crate) async fn execute(&self, sql: &'static str) -> Result<usize> {
    self.run(move |conn| Ok(conn.execute(sql, [])?)).await
  }
}

// ─── InventoryStore impl ─────────────────────────────────────────────────────

impl InventoryStore for SqliteStore {
  type Error = crate::Error;

  async fn add_entity(&self, name: String) -> Result<Entity> {
    self.run(move |conn| access::add_entity(conn, name)).await
  }

  // ── Characteristics ───────────────────────────────────────────────────────

  async fn list_characteristics(&self, entity_id: Uuid) -> Result<Vec<Characteristic>> {
    self.run(move |conn| characteristics::list(conn, entity_id)).await
  }

  async fn get_characteristic(
    &self,
    id: Uuid,
    entity_id: Uuid,
  ) -> Result<Option<Characteristic>> {
    self
      .run(move |conn| characteristics::get(conn, id, entity_id))
      .await
  }

  async fn insert_characteristic(
    &self,
    entity_id: Uuid,
    input: NewCharacteristic,
  ) -> Result<Named<Characteristic>> {
    self
      .run(move |conn| characteristics::insert(conn, entity_id, input))
      .await
  }

  async fn update_characteristic(
    &self,
    id: Uuid,
    entity_id: Uuid,
    patch: CharacteristicPatch,
  ) -> Result<Named<Characteristic>> {
    self
      .run(move |conn| characteristics::update(conn, id, entity_id, patch))
      .await
  }

  async fn delete_characteristic(
    &self,
    id: Uuid,
    entity_id: Uuid,
    scope: ReferenceScope,
  ) -> Result<Guarded<Characteristic>> {
    self
      .run(move |conn| characteristics::delete_guarded(conn, id, entity_id, scope))
      .await
  }

  // ── Tags ──────────────────────────────────────────────────────────────────

  async fn list_tags(&self, entity_id: Uuid) -> Result<Vec<TagUsage>> {
    self.run(move |conn| tags::list(conn, entity_id)).await
  }

  async fn find_tags(&self, entity_id: Uuid, ids: Vec<Uuid>) -> Result<Vec<Tag>> {
    self.run(move |conn| tags::find(conn, entity_id, &ids)).await
  }

  async fn insert_tag(&self, entity_id: Uuid, input: TagInput) -> Result<Tag> {
    self.run(move |conn| tags::insert(conn, entity_id, input)).await
  }

  async fn update_tag(
    &self,
    id: Uuid,
    entity_id: Uuid,
    input: TagInput,
  ) -> Result<Option<TagRevision>> {
    self
      .run(move |conn| tags::update(conn, id, entity_id, input))
      .await
  }

  async fn delete_tag(
    &self,
    id: Uuid,
    entity_id: Uuid,
    scope: ReferenceScope,
  ) -> Result<Guarded<Tag>> {
    self
      .run(move |conn| tags::delete_guarded(conn, id, entity_id, scope))
      .await
  }

  // ── Materials ─────────────────────────────────────────────────────────────

  async fn insert_material(&self, entity_id: Uuid, input: NewMaterial) -> Result<Material> {
    self
      .run(move |conn| materials::insert(conn, entity_id, input))
      .await
  }

  async fn get_material(&self, id: Uuid, entity_id: Uuid) -> Result<Option<Material>> {
    self.run(move |conn| materials::get(conn, id, entity_id)).await
  }

  async fn replace_material_tags(&self, material_id: Uuid, tag_ids: Vec<Uuid>) -> Result<()> {
    self
      .run(move |conn| materials::replace_tags(conn, material_id, &tag_ids))
      .await
  }

  async fn put_material_value(
    &self,
    material_id: Uuid,
    entity_id: Uuid,
    characteristic_id: Uuid,
    value: LiveValue,
  ) -> Result<ValueWrite> {
    self
      .run(move |conn| {
        materials::put_value(conn, material_id, entity_id, characteristic_id, &value)
      })
      .await
  }

  async fn soft_delete_material(&self, id: Uuid, entity_id: Uuid) -> Result<Option<Material>> {
    self
      .run(move |conn| materials::soft_delete(conn, id, entity_id))
      .await
  }

  async fn material_state(&self, material_id: Uuid) -> Result<Option<MaterialState>> {
    self.run(move |conn| materials::state(conn, material_id)).await
  }

  async fn insert_file(&self, entity_id: Uuid, input: NewFile) -> Result<StoredFile> {
    self
      .run(move |conn| materials::insert_file(conn, entity_id, input))
      .await
  }

  // ── History ───────────────────────────────────────────────────────────────

  async fn append_snapshot(&self, snapshot: NewSnapshot) -> Result<MaterialSnapshot> {
    self.run(move |conn| history::append(conn, snapshot)).await
  }

  async fn list_snapshots(&self, material_id: Uuid) -> Result<Vec<MaterialSnapshot>> {
    self.run(move |conn| history::list(conn, material_id)).await
  }

  // ── Roles and users ───────────────────────────────────────────────────────

  async fn list_roles(&self, entity_id: Uuid) -> Result<Vec<RoleUsage>> {
    self.run(move |conn| access::list_roles(conn, entity_id)).await
  }

  async fn insert_role(&self, entity_id: Uuid, input: RoleInput) -> Result<Role> {
    self
      .run(move |conn| access::insert_role(conn, entity_id, input))
      .await
  }

  async fn update_role(
    &self,
    id: Uuid,
    entity_id: Uuid,
    input: RoleInput,
  ) -> Result<Option<Role>> {
    self
      .run(move |conn| access::update_role(conn, id, entity_id, input))
      .await
  }

  async fn delete_role(&self, id: Uuid, entity_id: Uuid) -> Result<Guarded<Role>> {
    self
      .run(move |conn| access::delete_role(conn, id, entity_id))
      .await
  }

  async fn insert_user(&self, entity_id: Uuid, input: NewUser) -> Result<User> {
    self
      .run(move |conn| access::insert_user(conn, entity_id, input))
      .await
  }

  async fn set_user_active(
    &self,
    id: Uuid,
    entity_id: Uuid,
    active: bool,
  ) -> Result<Option<User>> {
    self
      .run(move |conn| access::set_user_active(conn, id, entity_id, active))
      .await
  }

  async fn find_principal(&self, email: String) -> Result<Option<Principal>> {
    self
      .run(move |conn| access::find_principal(conn, &email))
      .await
  }
}

// ─── AuditLog impl ───────────────────────────────────────────────────────────

impl AuditLog for SqliteStore {
  type Error = crate::Error;

  async fn append(&self, event: AuditEvent) -> Result<AuditEntry> {
    self.run(move |conn| audit::append(conn, event)).await
  }

  async fn list_audit(&self, entity_id: Uuid, limit: usize) -> Result<Vec<AuditEntry>> {
    self
      .run(move |conn| audit::list(conn, entity_id, limit))
      .await
  }
}
