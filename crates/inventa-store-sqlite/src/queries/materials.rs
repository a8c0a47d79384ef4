use std::collections::BTreeSet;

use chrono::Utc;
use inventa_core::{
  material::{Material, MaterialState, MaterialValue, NewFile, NewMaterial, StoredFile},
  store::ValueWrite,
  value::LiveValue,
};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior, params};
use uuid::Uuid;

use super::{characteristics, tags};
use crate::{
  Result,
  encode::{
    CHARACTERISTIC_COLUMNS, FILE_COLUMNS, MATERIAL_COLUMNS, RawCharacteristic, RawFile,
    RawMaterial, decode_value, encode_dt, encode_uuid, encode_value,
  },
};

pub fn insert(conn: &Connection, entity_id: Uuid, input: NewMaterial) -> Result<Material> {
  let material = Material {
    id: Uuid::new_v4(),
    entity_id,
    name: input.name,
    created_at: Utc::now(),
    deleted_at: None,
  };

  conn.execute(
    "INSERT INTO materials (material_id, entity_id, name, created_at)
     VALUES (?1, ?2, ?3, ?4)",
    params![
      encode_uuid(material.id),
      encode_uuid(entity_id),
      material.name,
      encode_dt(material.created_at),
    ],
  )?;
  Ok(material)
}

pub fn get(conn: &Connection, id: Uuid, entity_id: Uuid) -> Result<Option<Material>> {
  conn
    .query_row(
      &format!(
        "SELECT {MATERIAL_COLUMNS} FROM materials WHERE material_id = ?1 AND entity_id = ?2"
      ),
      params![encode_uuid(id), encode_uuid(entity_id)],
      RawMaterial::from_row,
    )
    .optional()?
    .map(RawMaterial::into_material)
    .transpose()
}

fn get_any(conn: &Connection, id: Uuid) -> Result<Option<Material>> {
  conn
    .query_row(
      &format!("SELECT {MATERIAL_COLUMNS} FROM materials WHERE material_id = ?1"),
      params![encode_uuid(id)],
      RawMaterial::from_row,
    )
    .optional()?
    .map(RawMaterial::into_material)
    .transpose()
}

pub fn replace_tags(conn: &mut Connection, material_id: Uuid, tag_ids: &[Uuid]) -> Result<()> {
  let material_id = encode_uuid(material_id);
  let tx = conn.transaction()?;
  tx.execute("DELETE FROM material_tags WHERE material_id = ?1", params![material_id])?;
  {
    let mut insert =
      tx.prepare("INSERT INTO material_tags (material_id, tag_id) VALUES (?1, ?2)")?;
    for &tag_id in tag_ids {
      insert.execute(params![material_id, encode_uuid(tag_id)])?;
    }
  }
  tx.commit()?;
  Ok(())
}

/// Both rows are checked under the write lock, so a concurrent delete of
/// either surfaces as an outcome rather than a foreign-key failure.
pub fn put_value(
  conn: &mut Connection,
  material_id: Uuid,
  entity_id: Uuid,
  characteristic_id: Uuid,
  value: &LiveValue,
) -> Result<ValueWrite> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  if !get(&tx, material_id, entity_id)?.is_some_and(|m| m.is_active()) {
    return Ok(ValueWrite::MaterialMissing);
  }
  if characteristics::get(&tx, characteristic_id, entity_id)?.is_none() {
    return Ok(ValueWrite::CharacteristicMissing);
  }

  tx.execute(
    "INSERT INTO material_values (material_id, characteristic_id, value_json, set_at)
     VALUES (?1, ?2, ?3, ?4)
     ON CONFLICT (material_id, characteristic_id)
     DO UPDATE SET value_json = excluded.value_json, set_at = excluded.set_at",
    params![
      encode_uuid(material_id),
      encode_uuid(characteristic_id),
      encode_value(value)?,
      encode_dt(Utc::now()),
    ],
  )?;
  tx.commit()?;
  Ok(ValueWrite::Stored)
}

/// Marks the material deleted; an already deleted material keeps its
/// original timestamp.
pub fn soft_delete(conn: &Connection, id: Uuid, entity_id: Uuid) -> Result<Option<Material>> {
  conn.execute(
    "UPDATE materials SET deleted_at = COALESCE(deleted_at, ?3)
     WHERE material_id = ?1 AND entity_id = ?2",
    params![encode_uuid(id), encode_uuid(entity_id), encode_dt(Utc::now())],
  )?;
  get(conn, id, entity_id)
}

/// Load the material, its tags, values and referenced files from one
/// consistent read.
pub fn state(conn: &mut Connection, material_id: Uuid) -> Result<Option<MaterialState>> {
  let tx = conn.transaction()?;
  let Some(material) = get_any(&tx, material_id)? else {
    return Ok(None);
  };

  let tags = tags::of_material(&tx, material_id)?;

  let raws = {
    let mut stmt = tx.prepare(&format!(
      "SELECT {CHARACTERISTIC_COLUMNS}, value_json
       FROM characteristics
       JOIN material_values USING (characteristic_id)
       WHERE material_id = ?1
       ORDER BY name_key, name"
    ))?;
    let rows = stmt
      .query_map(params![encode_uuid(material_id)], |row| {
        Ok((RawCharacteristic::from_row(row, 0)?, row.get::<_, String>(9)?))
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    rows
  };
  let values = raws
    .into_iter()
    .map(|(raw, json)| {
      let characteristic = raw.into_characteristic()?;
      let value = decode_value(characteristic.kind, &json)?;
      Ok(MaterialValue { characteristic, value })
    })
    .collect::<Result<Vec<_>>>()?;

  let file_ids: BTreeSet<Uuid> = values
    .iter()
    .filter_map(|mv| match &mv.value {
      LiveValue::File(f) => Some(f.files.iter().map(|r| r.id)),
      _ => None,
    })
    .flatten()
    .collect();
  let mut files = Vec::with_capacity(file_ids.len());
  for id in file_ids {
    if let Some(file) = get_file(&tx, id, material.entity_id)? {
      files.push(file);
    }
  }

  tx.commit()?;
  Ok(Some(MaterialState { material, tags, values, files }))
}

pub fn insert_file(conn: &Connection, entity_id: Uuid, input: NewFile) -> Result<StoredFile> {
  let file = StoredFile {
    id: Uuid::new_v4(),
    entity_id,
    name: input.name,
    mime_type: input.mime_type,
    path: input.path,
    created_at: Utc::now(),
  };

  conn.execute(
    "INSERT INTO files (file_id, entity_id, name, mime_type, path, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    params![
      encode_uuid(file.id),
      encode_uuid(entity_id),
      file.name,
      file.mime_type,
      file.path,
      encode_dt(file.created_at),
    ],
  )?;
  Ok(file)
}

fn get_file(conn: &Connection, id: Uuid, entity_id: Uuid) -> Result<Option<StoredFile>> {
  conn
    .query_row(
      &format!("SELECT {FILE_COLUMNS} FROM files WHERE file_id = ?1 AND entity_id = ?2"),
      params![encode_uuid(id), encode_uuid(entity_id)],
      RawFile::from_row,
    )
    .optional()?
    .map(RawFile::into_file)
    .transpose()
}
