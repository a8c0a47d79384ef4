use chrono::Utc;
use inventa_core::{
  characteristic::{Characteristic, CharacteristicPatch, NewCharacteristic},
  store::{Guarded, Named, ReferenceScope},
};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior, params};
use uuid::Uuid;

use super::scope_clause;
use crate::{
  Result,
  encode::{CHARACTERISTIC_COLUMNS, RawCharacteristic, encode_dt, encode_options, encode_uuid},
};

pub fn list(conn: &Connection, entity_id: Uuid) -> Result<Vec<Characteristic>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {CHARACTERISTIC_COLUMNS} FROM characteristics
     WHERE entity_id = ?1
     ORDER BY name_key, name"
  ))?;
  let raws = stmt
    .query_map(params![encode_uuid(entity_id)], |row| RawCharacteristic::from_row(row, 0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  raws.into_iter().map(RawCharacteristic::into_characteristic).collect()
}

pub fn get(conn: &Connection, id: Uuid, entity_id: Uuid) -> Result<Option<Characteristic>> {
  conn
    .query_row(
      &format!(
        "SELECT {CHARACTERISTIC_COLUMNS} FROM characteristics
         WHERE characteristic_id = ?1 AND entity_id = ?2"
      ),
      params![encode_uuid(id), encode_uuid(entity_id)],
      |row| RawCharacteristic::from_row(row, 0),
    )
    .optional()?
    .map(RawCharacteristic::into_characteristic)
    .transpose()
}

/// The uniqueness key of a name. Folds case beyond ASCII, unlike SQLite's
/// `NOCASE`.
fn name_key(name: &str) -> String { name.to_lowercase() }

fn name_taken(
  conn: &Connection,
  entity_id: Uuid,
  name: &str,
  except: Option<Uuid>,
) -> Result<bool> {
  let taken = conn
    .query_row(
      "SELECT 1 FROM characteristics
       WHERE entity_id = ?1
         AND name_key = ?2
         AND (?3 IS NULL OR characteristic_id <> ?3)
       LIMIT 1",
      params![encode_uuid(entity_id), name_key(name), except.map(encode_uuid)],
      |_| Ok(()),
    )
    .optional()?
    .is_some();
  Ok(taken)
}

/// Checks the name and inserts under one write lock.
pub fn insert(
  conn: &mut Connection,
  entity_id: Uuid,
  input: NewCharacteristic,
) -> Result<Named<Characteristic>> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  if name_taken(&tx, entity_id, &input.name, None)? {
    return Ok(Named::NameTaken);
  }

  let now = Utc::now();
  let characteristic = Characteristic {
    id: Uuid::new_v4(),
    entity_id,
    name: input.name,
    description: input.description,
    kind: input.kind,
    options: input.options,
    units: input.units,
    created_at: now,
    updated_at: now,
  };

  tx.execute(
    "INSERT INTO characteristics (
       characteristic_id, entity_id, name, name_key, description, kind,
       options, units, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
    params![
      encode_uuid(characteristic.id),
      encode_uuid(entity_id),
      characteristic.name,
      name_key(&characteristic.name),
      characteristic.description,
      characteristic.kind.as_str(),
      encode_options(characteristic.options.as_deref())?,
      characteristic.units,
      encode_dt(now),
    ],
  )?;
  tx.commit()?;
  Ok(Named::Written(characteristic))
}

/// The kind column is never written here.
pub fn update(
  conn: &mut Connection,
  id: Uuid,
  entity_id: Uuid,
  patch: CharacteristicPatch,
) -> Result<Named<Characteristic>> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  let Some(current) = get(&tx, id, entity_id)? else {
    return Ok(Named::Missing);
  };
  if name_taken(&tx, entity_id, &patch.name, Some(id))? {
    return Ok(Named::NameTaken);
  }

  let updated = Characteristic {
    name: patch.name,
    description: patch.description,
    options: patch.options.or(current.options.clone()),
    updated_at: Utc::now(),
    ..current
  };

  tx.execute(
    "UPDATE characteristics
     SET name = ?2, name_key = ?3, description = ?4, options = ?5, updated_at = ?6
     WHERE characteristic_id = ?1",
    params![
      encode_uuid(id),
      updated.name,
      name_key(&updated.name),
      updated.description,
      encode_options(updated.options.as_deref())?,
      encode_dt(updated.updated_at),
    ],
  )?;
  tx.commit()?;
  Ok(Named::Written(updated))
}

/// Count and delete under one write lock, so no value can be attached in
/// between.
pub fn delete_guarded(
  conn: &mut Connection,
  id: Uuid,
  entity_id: Uuid,
  scope: ReferenceScope,
) -> Result<Guarded<Characteristic>> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  let Some(characteristic) = get(&tx, id, entity_id)? else {
    return Ok(Guarded::Missing);
  };

  let id_str = encode_uuid(id);
  let references: i64 = tx.query_row(
    &format!(
      "SELECT COUNT(*) FROM material_values v
       JOIN materials m ON m.material_id = v.material_id
       WHERE v.characteristic_id = ?1 {}",
      scope_clause(scope)
    ),
    params![id_str],
    |row| row.get(0),
  )?;
  if references > 0 {
    return Ok(Guarded::Referenced(references as u64));
  }

  tx.execute(
    "DELETE FROM characteristics WHERE characteristic_id = ?1",
    params![id_str],
  )?;
  tx.commit()?;
  Ok(Guarded::Deleted(characteristic))
}
