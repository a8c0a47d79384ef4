use std::collections::BTreeSet;

use inventa_core::{
  Error,
  access::{NewUser, Permission, RoleInput},
  audit::{AuditKind, AuditLog},
  store::InventoryStore,
};
use uuid::Uuid;

use super::Harness;

fn editors() -> RoleInput {
  RoleInput {
    name:        "Editors".into(),
    permissions: BTreeSet::from([Permission::MaterialCreate, Permission::MaterialEdit]),
  }
}

#[tokio::test]
async fn create_update_and_list() {
  let h = Harness::new().await;
  let roles = &h.catalog.roles;

  let role = roles.create(h.entity, editors()).await.unwrap();
  let updated = roles
    .update(role.id, h.entity, RoleInput { name: "Curators".into(), ..editors() })
    .await
    .unwrap();
  assert_eq!(updated.name, "Curators");
  assert_eq!(updated.permissions, editors().permissions);

  let listed = roles.list(h.entity).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].role, updated);
  assert_eq!(listed[0].users, 0);

  let kinds: Vec<_> = h
    .store
    .list_audit(h.entity, 10)
    .await
    .unwrap()
    .into_iter()
    .map(|e| e.event.kind)
    .collect();
  assert_eq!(kinds, [AuditKind::RoleUpdated, AuditKind::RoleCreated]);
}

#[tokio::test]
async fn delete_blocked_while_users_hold_the_role() {
  let h = Harness::new().await;
  let roles = &h.catalog.roles;
  let role = roles.create(h.entity, editors()).await.unwrap();
  h.store
    .insert_user(h.entity, NewUser {
      email:         "ada@example.com".into(),
      name:          "Ada".into(),
      password_hash: "$argon2id$stub".into(),
      role_id:       role.id,
    })
    .await
    .unwrap();

  let err = roles.delete(role.id, h.entity).await.unwrap_err();
  assert!(matches!(err, Error::RoleHasUsers { users: 1, .. }));
  assert_eq!(err.code(), Some("roleHasUsers"));
  assert_eq!(roles.list(h.entity).await.unwrap()[0].users, 1);
}

#[tokio::test]
async fn delete_unused_role() {
  let h = Harness::new().await;
  let roles = &h.catalog.roles;
  let role = roles.create(h.entity, editors()).await.unwrap();

  assert_eq!(roles.delete(role.id, h.entity).await.unwrap(), role);
  assert!(roles.list(h.entity).await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_role_is_not_found() {
  let h = Harness::new().await;
  let roles = &h.catalog.roles;

  let err = roles.update(Uuid::new_v4(), h.entity, editors()).await.unwrap_err();
  assert_eq!(err.code(), Some("roleNotFound"));
  let err = roles.delete(Uuid::new_v4(), h.entity).await.unwrap_err();
  assert_eq!(err.code(), Some("roleNotFound"));
}
