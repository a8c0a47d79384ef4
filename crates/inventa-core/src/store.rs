//! The `InventoryStore` trait and supporting result types.
//!
//! The trait is implemented by storage backends (e.g. `inventa-store-sqlite`).
//! Services depend on this abstraction, never on a concrete backend. Every
//! tenant-owned query takes the `entity_id` it is scoped to.

use std::future::Future;

use uuid::Uuid;

use crate::{
  access::{Entity, NewUser, Principal, Role, RoleInput, RoleUsage, User},
  characteristic::{Characteristic, CharacteristicPatch, NewCharacteristic},
  history::{MaterialSnapshot, NewSnapshot},
  material::{Material, MaterialState, NewFile, NewMaterial, StoredFile},
  tag::{Tag, TagInput, TagRevision, TagUsage},
  value::LiveValue,
};

// ─── Guarded deletes ─────────────────────────────────────────────────────────

/// Which material references block a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceScope {
  /// Only materials that are not soft-deleted.
  ActiveMaterials,
  /// Every material row, soft-deleted or not.
  AllMaterials,
}

/// The outcome of a check-then-delete performed atomically by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guarded<T> {
  Deleted(T),
  /// Nothing was deleted; this many references remain.
  Referenced(u64),
  Missing,
}

/// The outcome of a write that keeps characteristic names unique within an
/// entity. The name check and the write share one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Named<T> {
  Written(T),
  /// Another characteristic of the entity already uses the name, ignoring
  /// case.
  NameTaken,
  Missing,
}

/// The outcome of storing a material value.
///
/// The material and the characteristic are re-checked in the same
/// transaction as the write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueWrite {
  Stored,
  /// The material does not exist under the entity or is soft-deleted.
  MaterialMissing,
  CharacteristicMissing,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over an Inventa storage backend.
///
/// Reads must observe committed state. Methods returning [`Guarded`] or
/// [`TagRevision`] perform their read and write in a single transaction.
pub trait InventoryStore: Send + Sync + 'static {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Entities ──────────────────────────────────────────────────────────

  fn add_entity(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Entity, Self::Error>> + Send + '_;

  // ── Characteristics ───────────────────────────────────────────────────

  /// All characteristics of the entity, sorted by name.
  fn list_characteristics(
    &self,
    entity_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Characteristic>, Self::Error>> + Send + '_;

  fn get_characteristic(
    &self,
    id: Uuid,
    entity_id: Uuid,
  ) -> impl Future<Output = Result<Option<Characteristic>, Self::Error>> + Send + '_;

  /// Never returns [`Named::Missing`].
  fn insert_characteristic(
    &self,
    entity_id: Uuid,
    input: NewCharacteristic,
  ) -> impl Future<Output = Result<Named<Characteristic>, Self::Error>> + Send + '_;

  /// [`Named::Missing`] when no such characteristic exists under
  /// `entity_id`.
  fn update_characteristic(
    &self,
    id: Uuid,
    entity_id: Uuid,
    patch: CharacteristicPatch,
  ) -> impl Future<Output = Result<Named<Characteristic>, Self::Error>> + Send + '_;

  /// Delete unless a material in `scope` holds a value for it.
  fn delete_characteristic(
    &self,
    id: Uuid,
    entity_id: Uuid,
    scope: ReferenceScope,
  ) -> impl Future<Output = Result<Guarded<Characteristic>, Self::Error>> + Send + '_;

  // ── Tags ──────────────────────────────────────────────────────────────

  /// All tags of the entity with active-material counts, sorted by name.
  fn list_tags(
    &self,
    entity_id: Uuid,
  ) -> impl Future<Output = Result<Vec<TagUsage>, Self::Error>> + Send + '_;

  /// The subset of `ids` that are tags of the entity.
  fn find_tags(
    &self,
    entity_id: Uuid,
    ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<Vec<Tag>, Self::Error>> + Send + '_;

  fn insert_tag(
    &self,
    entity_id: Uuid,
    input: TagInput,
  ) -> impl Future<Output = Result<Tag, Self::Error>> + Send + '_;

  /// Returns `None` when no such tag exists under `entity_id`.
  fn update_tag(
    &self,
    id: Uuid,
    entity_id: Uuid,
    input: TagInput,
  ) -> impl Future<Output = Result<Option<TagRevision>, Self::Error>> + Send + '_;

  /// Delete unless a material in `scope` carries the tag.
  fn delete_tag(
    &self,
    id: Uuid,
    entity_id: Uuid,
    scope: ReferenceScope,
  ) -> impl Future<Output = Result<Guarded<Tag>, Self::Error>> + Send + '_;

  // ── Materials ─────────────────────────────────────────────────────────

  fn insert_material(
    &self,
    entity_id: Uuid,
    input: NewMaterial,
  ) -> impl Future<Output = Result<Material, Self::Error>> + Send + '_;

  /// Soft-deleted materials are returned too; callers check
  /// [`Material::is_active`].
  fn get_material(
    &self,
    id: Uuid,
    entity_id: Uuid,
  ) -> impl Future<Output = Result<Option<Material>, Self::Error>> + Send + '_;

  /// Replace the material's tag set.
  fn replace_material_tags(
    &self,
    material_id: Uuid,
    tag_ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Insert or overwrite one characteristic value of an active material.
  fn put_material_value(
    &self,
    material_id: Uuid,
    entity_id: Uuid,
    characteristic_id: Uuid,
    value: LiveValue,
  ) -> impl Future<Output = Result<ValueWrite, Self::Error>> + Send + '_;

  /// Returns the updated material, or `None` if it does not exist.
  fn soft_delete_material(
    &self,
    id: Uuid,
    entity_id: Uuid,
  ) -> impl Future<Output = Result<Option<Material>, Self::Error>> + Send + '_;

  fn material_state(
    &self,
    material_id: Uuid,
  ) -> impl Future<Output = Result<Option<MaterialState>, Self::Error>> + Send + '_;

  fn insert_file(
    &self,
    entity_id: Uuid,
    input: NewFile,
  ) -> impl Future<Output = Result<StoredFile, Self::Error>> + Send + '_;

  // ── History ───────────────────────────────────────────────────────────

  /// Append a snapshot. The store assigns `id` and `recorded_at`.
  fn append_snapshot(
    &self,
    snapshot: NewSnapshot,
  ) -> impl Future<Output = Result<MaterialSnapshot, Self::Error>> + Send + '_;

  /// Snapshots of a material, newest first.
  fn list_snapshots(
    &self,
    material_id: Uuid,
  ) -> impl Future<Output = Result<Vec<MaterialSnapshot>, Self::Error>> + Send + '_;

  // ── Roles and users ───────────────────────────────────────────────────

  /// All roles of the entity with user counts, sorted by name.
  fn list_roles(
    &self,
    entity_id: Uuid,
  ) -> impl Future<Output = Result<Vec<RoleUsage>, Self::Error>> + Send + '_;

  fn insert_role(
    &self,
    entity_id: Uuid,
    input: RoleInput,
  ) -> impl Future<Output = Result<Role, Self::Error>> + Send + '_;

  fn update_role(
    &self,
    id: Uuid,
    entity_id: Uuid,
    input: RoleInput,
  ) -> impl Future<Output = Result<Option<Role>, Self::Error>> + Send + '_;

  /// Delete unless a user holds the role.
  fn delete_role(
    &self,
    id: Uuid,
    entity_id: Uuid,
  ) -> impl Future<Output = Result<Guarded<Role>, Self::Error>> + Send + '_;

  fn insert_user(
    &self,
    entity_id: Uuid,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Enable or disable sign-in for a user. Returns `None` when no such user
  /// exists under `entity_id`.
  fn set_user_active(
    &self,
    id: Uuid,
    entity_id: Uuid,
    active: bool,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look a user up by e-mail, case-insensitively.
  fn find_principal(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Option<Principal>, Self::Error>> + Send + '_;
}
