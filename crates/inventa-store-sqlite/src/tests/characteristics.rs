use inventa_core::{
  Error,
  audit::{AuditKind, AuditLog},
  characteristic::{CharacteristicKind, CharacteristicUpdate, NewCharacteristic},
  store::InventoryStore,
};
use serde_json::json;
use uuid::Uuid;

use super::Harness;

fn weight() -> NewCharacteristic {
  NewCharacteristic {
    name:        "Weight".into(),
    description: None,
    kind:        CharacteristicKind::Number,
    options:     None,
    units:       Some("kg".into()),
  }
}

fn named(name: &str) -> NewCharacteristic {
  NewCharacteristic { name: name.into(), units: None, ..weight() }
}

#[tokio::test]
async fn create_weight_in_kilograms() {
  let h = Harness::new().await;

  let weight = h.catalog.characteristics.create(h.entity, weight()).await.unwrap();

  assert_eq!(weight.kind, CharacteristicKind::Number);
  assert_eq!(weight.units.as_deref(), Some("kg"));
  assert_eq!(weight.options, None);
  assert_eq!(weight.entity_id, h.entity);

  let json = serde_json::to_value(&weight).unwrap();
  assert_eq!(json["type"], "number");
  assert_eq!(json["units"], "kg");

  let audit = h.store.list_audit(h.entity, 10).await.unwrap();
  assert_eq!(audit.len(), 1);
  assert_eq!(audit[0].event.kind, AuditKind::CharacteristicCreated);
  assert_eq!(audit[0].event.subject_id, weight.id);
}

#[tokio::test]
async fn name_length_bounds() {
  let h = Harness::new().await;
  let service = &h.catalog.characteristics;

  let err = service.create(h.entity, named("W")).await.unwrap_err();
  let Error::Validation(errors) = err else { panic!("expected validation error: {err:?}") };
  assert_eq!(errors.codes("name"), ["name.min"]);

  service.create(h.entity, named(&"w".repeat(64))).await.unwrap();

  let err = service.create(h.entity, named(&"x".repeat(65))).await.unwrap_err();
  let Error::Validation(errors) = err else { panic!("expected validation error: {err:?}") };
  assert_eq!(errors.codes("name"), ["name.max"]);

  assert_eq!(service.list(h.entity).await.unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_name_is_rejected() {
  let h = Harness::new().await;
  let service = &h.catalog.characteristics;
  service.create(h.entity, weight()).await.unwrap();

  let err = service.create(h.entity, named(" weight ")).await.unwrap_err();
  let Error::Validation(errors) = err else { panic!("expected validation error: {err:?}") };
  assert_eq!(errors.codes("name"), ["name.unique"]);
}

#[tokio::test]
async fn duplicate_name_ignores_non_ascii_case() {
  let h = Harness::new().await;
  let service = &h.catalog.characteristics;
  service.create(h.entity, named("Éclat")).await.unwrap();

  let err = service.create(h.entity, named("éclat")).await.unwrap_err();
  let Error::Validation(errors) = err else { panic!("expected validation error: {err:?}") };
  assert_eq!(errors.codes("name"), ["name.unique"]);
}

#[tokio::test]
async fn concurrent_creates_keep_one_name() {
  let h = Harness::new().await;
  let service = &h.catalog.characteristics;

  let (first, second) =
    tokio::join!(service.create(h.entity, weight()), service.create(h.entity, named("WEIGHT")));

  let failure = match (first, second) {
    (Ok(_), Err(e)) | (Err(e), Ok(_)) => e,
    other => panic!("expected exactly one create to succeed: {other:?}"),
  };
  let Error::Validation(errors) = failure else {
    panic!("expected validation error: {failure:?}")
  };
  assert_eq!(errors.codes("name"), ["name.unique"]);
  assert_eq!(service.list(h.entity).await.unwrap().len(), 1);
}

#[tokio::test]
async fn rename_onto_another_name_is_rejected() {
  let h = Harness::new().await;
  let service = &h.catalog.characteristics;
  service.create(h.entity, weight()).await.unwrap();
  let width = service.create(h.entity, named("Width")).await.unwrap();

  let err = service
    .update(width.id, h.entity, CharacteristicUpdate {
      name:        "weight".into(),
      description: None,
      options:     None,
    })
    .await
    .unwrap_err();
  let Error::Validation(errors) = err else { panic!("expected validation error: {err:?}") };
  assert_eq!(errors.codes("name"), ["name.unique"]);

  let renamed = service
    .update(width.id, h.entity, CharacteristicUpdate {
      name:        "WIDTH".into(),
      description: None,
      options:     None,
    })
    .await
    .unwrap();
  assert_eq!(renamed.name, "WIDTH");
}

#[tokio::test]
async fn list_is_sorted_by_name_without_case() {
  let h = Harness::new().await;
  for name in ["Width", "colour", "Height", "écru"] {
    h.catalog.characteristics.create(h.entity, named(name)).await.unwrap();
  }

  let names: Vec<_> = h
    .catalog
    .characteristics
    .list(h.entity)
    .await
    .unwrap()
    .into_iter()
    .map(|c| c.name)
    .collect();
  assert_eq!(names, ["colour", "Height", "Width", "écru"]);
}

#[tokio::test]
async fn update_without_type_succeeds_and_type_is_rejected() {
  let h = Harness::new().await;
  let weight = h.catalog.characteristics.create(h.entity, weight()).await.unwrap();

  let input: CharacteristicUpdate =
    serde_json::from_value(json!({ "name": "Net weight", "description": "Without packaging" }))
      .unwrap();
  let updated = h
    .catalog
    .characteristics
    .update(weight.id, h.entity, input)
    .await
    .unwrap();
  assert_eq!(updated.name, "Net weight");
  assert_eq!(updated.kind, CharacteristicKind::Number);
  assert_eq!(updated.units.as_deref(), Some("kg"));

  let attempt = serde_json::from_value::<CharacteristicUpdate>(
    json!({ "name": "Net weight", "type": "text" }),
  );
  assert!(attempt.is_err());

  let stored = h.store.get_characteristic(weight.id, h.entity).await.unwrap().unwrap();
  assert_eq!(stored.kind, CharacteristicKind::Number);
}

#[tokio::test]
async fn update_missing_characteristic_is_not_found() {
  let h = Harness::new().await;
  let id = Uuid::new_v4();

  let err = h
    .catalog
    .characteristics
    .update(id, h.entity, CharacteristicUpdate {
      name:        "Anything".into(),
      description: None,
      options:     None,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::CharacteristicNotFound(missing) if missing == id));
  assert_eq!(err.code(), Some("characteristicNotFound"));
}

#[tokio::test]
async fn update_never_regenerates_history() {
  let mut h = Harness::new().await;
  let size = h.characteristic("Size", CharacteristicKind::Select).await;
  let crate_ = h.material("Crate").await;
  h.catalog
    .materials
    .set_value(crate_.id, h.entity, size.id, json!(["small"]))
    .await
    .unwrap();
  h.settle().await;

  h.catalog
    .characteristics
    .update(size.id, h.entity, CharacteristicUpdate {
      name:        "Box size".into(),
      description: Some("Outer dimensions".into()),
      options:     Some(vec!["small".into(), "medium".into(), "large".into()]),
    })
    .await
    .unwrap();

  assert!(h.settle().await.is_empty());
}

#[tokio::test]
async fn delete_unused_characteristic() {
  let h = Harness::new().await;
  let weight = h.catalog.characteristics.create(h.entity, weight()).await.unwrap();

  let deleted = h.catalog.characteristics.delete(weight.id, h.entity).await.unwrap();
  assert_eq!(deleted.id, weight.id);
  assert!(h.store.get_characteristic(weight.id, h.entity).await.unwrap().is_none());

  let audit = h.store.list_audit(h.entity, 1).await.unwrap();
  assert_eq!(audit[0].event.kind, AuditKind::CharacteristicDeleted);
}

#[tokio::test]
async fn delete_blocked_by_active_material() {
  let h = Harness::new().await;
  let weight = h.catalog.characteristics.create(h.entity, weight()).await.unwrap();
  let crate_ = h.material("Crate").await;
  h.catalog
    .materials
    .set_value(crate_.id, h.entity, weight.id, json!("12.5"))
    .await
    .unwrap();

  let err = h.catalog.characteristics.delete(weight.id, h.entity).await.unwrap_err();
  assert!(matches!(err, Error::CharacteristicHasMaterials { materials: 1, .. }));
  assert_eq!(err.code(), Some("characteristicHasMaterials"));
  assert!(h.store.get_characteristic(weight.id, h.entity).await.unwrap().is_some());
}

#[tokio::test]
async fn set_value_racing_delete_never_fails_on_storage() {
  let h = Harness::new().await;
  let weight = h.catalog.characteristics.create(h.entity, weight()).await.unwrap();
  let crate_ = h.material("Crate").await;

  let (set, deleted) = tokio::join!(
    h.catalog.materials.set_value(crate_.id, h.entity, weight.id, json!("12.5")),
    h.catalog.characteristics.delete(weight.id, h.entity),
  );

  match (set, deleted) {
    (Ok(_), Err(e)) => assert_eq!(e.code(), Some("characteristicHasMaterials")),
    (Err(e), Ok(_)) => assert_eq!(e.code(), Some("characteristicNotFound")),
    other => panic!("unexpected outcome: {other:?}"),
  }
}

#[tokio::test]
async fn delete_ignores_soft_deleted_materials() {
  let h = Harness::new().await;
  let weight = h.catalog.characteristics.create(h.entity, weight()).await.unwrap();
  let crate_ = h.material("Crate").await;
  h.catalog
    .materials
    .set_value(crate_.id, h.entity, weight.id, json!("12.5"))
    .await
    .unwrap();
  h.catalog.materials.soft_delete(crate_.id, h.entity).await.unwrap();

  h.catalog.characteristics.delete(weight.id, h.entity).await.unwrap();
  assert!(h.store.get_characteristic(weight.id, h.entity).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_missing_characteristic_is_not_found() {
  let h = Harness::new().await;
  let err = h
    .catalog
    .characteristics
    .delete(Uuid::new_v4(), h.entity)
    .await
    .unwrap_err();
  assert_eq!(err.code(), Some("characteristicNotFound"));
}
