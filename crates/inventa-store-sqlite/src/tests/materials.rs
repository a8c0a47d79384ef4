use inventa_core::{
  Error,
  audit::{AuditKind, AuditLog},
  characteristic::{CharacteristicKind, NewCharacteristic},
  material::NewFile,
  tag::TagInput,
  value::{HistoricalValue, LiveValue},
};
use serde_json::json;
use uuid::Uuid;

use super::{Harness, tag_input};

#[tokio::test]
async fn create_records_a_first_snapshot() {
  let mut h = Harness::new().await;
  let material = h.material("Crate").await;

  assert_eq!(h.settle().await, vec![material.id]);
  let history = h.catalog.materials.history(material.id, h.entity).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].material_name, "Crate");
  assert!(history[0].tags.is_empty());

  let audit = h.store.list_audit(h.entity, 1).await.unwrap();
  assert_eq!(audit[0].event.kind, AuditKind::MaterialCreated);
}

#[tokio::test]
async fn set_value_checks_shape_and_options() {
  let h = Harness::new().await;
  let size = h.characteristic("Size", CharacteristicKind::Select).await;
  let material = h.material("Crate").await;
  let materials = &h.catalog.materials;

  let err = materials
    .set_value(material.id, h.entity, size.id, json!("small"))
    .await
    .unwrap_err();
  assert_eq!(err.code(), Some("shapeMismatch"));

  let err = materials
    .set_value(material.id, h.entity, size.id, json!(["huge"]))
    .await
    .unwrap_err();
  let Error::Validation(errors) = err else { panic!("expected validation error: {err:?}") };
  assert_eq!(errors.codes("value"), ["value.option"]);

  let stored = materials
    .set_value(material.id, h.entity, size.id, json!(["large"]))
    .await
    .unwrap();
  assert_eq!(stored, LiveValue::Choice(vec!["large".into()]));
}

#[tokio::test]
async fn set_value_for_unknown_characteristic() {
  let h = Harness::new().await;
  let material = h.material("Crate").await;

  let err = h
    .catalog
    .materials
    .set_value(material.id, h.entity, Uuid::new_v4(), json!("x"))
    .await
    .unwrap_err();
  assert_eq!(err.code(), Some("characteristicNotFound"));
}

#[tokio::test]
async fn value_edit_regenerates_with_units() {
  let mut h = Harness::new().await;
  let weight = h
    .catalog
    .characteristics
    .create(h.entity, NewCharacteristic {
      name:        "Weight".into(),
      description: None,
      kind:        CharacteristicKind::Number,
      options:     None,
      units:       Some("kg".into()),
    })
    .await
    .unwrap();
  let material = h.material("Crate").await;
  h.settle().await;

  h.catalog
    .materials
    .set_value(material.id, h.entity, weight.id, json!("12.5"))
    .await
    .unwrap();
  assert_eq!(h.settle().await, vec![material.id]);

  let latest = &h.catalog.materials.history(material.id, h.entity).await.unwrap()[0];
  assert_eq!(latest.characteristics.len(), 1);
  assert_eq!(latest.characteristics[0].name, "Weight");
  assert_eq!(latest.characteristics[0].value, HistoricalValue::Scalar {
    value: "12.5".into(),
    units: Some("kg".into()),
  });
}

#[tokio::test]
async fn file_values_settle_pending_edits_and_snapshot_metadata() {
  let mut h = Harness::new().await;
  let manual = h.characteristic("Manual", CharacteristicKind::File).await;
  let material = h.material("Crate").await;
  let register = |name: &str| NewFile {
    name:      name.into(),
    mime_type: "application/pdf".into(),
    path:      format!("acme/{name}"),
  };
  let kept = h.catalog.materials.register_file(h.entity, register("kept.pdf")).await.unwrap();
  let dropped = h
    .catalog
    .materials
    .register_file(h.entity, register("dropped.pdf"))
    .await
    .unwrap();
  h.settle().await;

  let stored = h
    .catalog
    .materials
    .set_value(
      material.id,
      h.entity,
      manual.id,
      json!({
        "files": [{ "id": dropped.id, "name": "dropped.pdf", "type": "application/pdf" }],
        "pendingAdd": [{ "id": kept.id, "name": "kept.pdf", "type": "application/pdf" }],
        "pendingDelete": [dropped.id],
      }),
    )
    .await
    .unwrap();

  let LiveValue::File(files) = stored else { panic!("expected a file value") };
  assert_eq!(files.files.len(), 1);
  assert_eq!(files.files[0].id, kept.id);
  assert!(files.pending_add.is_empty() && files.pending_delete.is_empty());

  h.settle().await;
  let latest = &h.catalog.materials.history(material.id, h.entity).await.unwrap()[0];
  let HistoricalValue::File(snapshot_files) = &latest.characteristics[0].value else {
    panic!("expected a file snapshot")
  };
  assert_eq!(snapshot_files.len(), 1);
  assert_eq!(snapshot_files[0].name, "kept.pdf");
  assert_eq!(snapshot_files[0].path, "acme/kept.pdf");
}

#[tokio::test]
async fn set_tags_rejects_unknown_tags() {
  let h = Harness::new().await;
  let tag = h.tag("Fragile").await;
  let material = h.material("Crate").await;

  let err = h
    .catalog
    .materials
    .set_tags(material.id, h.entity, vec![tag.id, Uuid::new_v4()])
    .await
    .unwrap_err();
  let Error::Validation(errors) = err else { panic!("expected validation error: {err:?}") };
  assert_eq!(errors.codes("tags"), ["tags.unknown"]);

  let state = h.catalog.materials.get(material.id, h.entity).await.unwrap();
  assert!(state.tags.is_empty());
}

#[tokio::test]
async fn set_tags_replaces_the_set() {
  let h = Harness::new().await;
  let fragile = h.tag("Fragile").await;
  let bulky = h.tag("Bulky").await;
  let material = h.material("Crate").await;
  let materials = &h.catalog.materials;

  materials
    .set_tags(material.id, h.entity, vec![fragile.id, bulky.id, fragile.id])
    .await
    .unwrap();
  materials.set_tags(material.id, h.entity, vec![bulky.id]).await.unwrap();

  let state = materials.get(material.id, h.entity).await.unwrap();
  assert_eq!(state.tags, vec![bulky]);
}

#[tokio::test]
async fn snapshots_keep_tags_by_value() {
  let mut h = Harness::new().await;
  let tag = h.tag("Fragile").await;
  let material = h.tagged_material("Crate", &[&tag]).await;

  h.catalog
    .tags
    .update(tag.id, h.entity, TagInput {
      color: "#0000ff".into(),
      ..tag_input("Fragile")
    })
    .await
    .unwrap();
  h.catalog
    .tags
    .update(tag.id, h.entity, tag_input("Handle with care"))
    .await
    .unwrap();
  h.settle().await;

  let history = h.catalog.materials.history(material.id, h.entity).await.unwrap();
  let (latest, earlier) = history.split_first().unwrap();
  assert_eq!(latest.tags[0].name, "Handle with care");
  assert_eq!(latest.tags[0].color, "#0000ff");

  let before: Vec<_> = earlier.iter().flat_map(|s| &s.tags).collect();
  assert!(!before.is_empty());
  assert!(before.iter().all(|t| t.name == "Fragile" && t.color == "#ff0000"));
}

#[tokio::test]
async fn soft_deleted_material_rejects_edits_but_keeps_history() {
  let h = Harness::new().await;
  let weight = h.characteristic("Weight", CharacteristicKind::Number).await;
  let material = h.material("Crate").await;
  let materials = &h.catalog.materials;

  materials.soft_delete(material.id, h.entity).await.unwrap();

  let err = materials
    .set_value(material.id, h.entity, weight.id, json!("1"))
    .await
    .unwrap_err();
  assert_eq!(err.code(), Some("materialNotFound"));
  assert_eq!(
    materials.get(material.id, h.entity).await.unwrap_err().code(),
    Some("materialNotFound")
  );
  assert_eq!(
    materials.soft_delete(material.id, h.entity).await.unwrap_err().code(),
    Some("materialNotFound")
  );
  assert!(materials.history(material.id, h.entity).await.is_ok());
}

#[tokio::test]
async fn register_file_requires_metadata() {
  let h = Harness::new().await;
  let err = h
    .catalog
    .materials
    .register_file(h.entity, NewFile {
      name:      " ".into(),
      mime_type: "application/pdf".into(),
      path:      String::new(),
    })
    .await
    .unwrap_err();

  let Error::Validation(errors) = err else { panic!("expected validation error: {err:?}") };
  assert_eq!(errors.codes("name"), ["name.required"]);
  assert_eq!(errors.codes("path"), ["path.required"]);
  assert!(errors.codes("type").is_empty());
}
