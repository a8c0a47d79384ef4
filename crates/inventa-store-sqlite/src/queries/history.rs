use chrono::Utc;
use inventa_core::history::{MaterialSnapshot, NewSnapshot};
use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::{
  Result,
  encode::{RawSnapshot, SNAPSHOT_COLUMNS, encode_dt, encode_uuid},
};

/// Snapshots are only ever inserted; the schema rejects updates and deletes.
pub fn append(conn: &Connection, input: NewSnapshot) -> Result<MaterialSnapshot> {
  let snapshot = MaterialSnapshot {
    id:              Uuid::new_v4(),
    material_id:     input.material_id,
    entity_id:       input.entity_id,
    material_name:   input.material_name,
    recorded_at:     Utc::now(),
    tags:            input.tags,
    characteristics: input.characteristics,
  };

  conn.execute(
    &format!("INSERT INTO material_snapshots ({SNAPSHOT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
    params![
      encode_uuid(snapshot.id),
      encode_uuid(snapshot.material_id),
      encode_uuid(snapshot.entity_id),
      snapshot.material_name,
      encode_dt(snapshot.recorded_at),
      serde_json::to_string(&snapshot.tags)?,
      serde_json::to_string(&snapshot.characteristics)?,
    ],
  )?;
  Ok(snapshot)
}

pub fn list(conn: &Connection, material_id: Uuid) -> Result<Vec<MaterialSnapshot>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {SNAPSHOT_COLUMNS} FROM material_snapshots
     WHERE material_id = ?1
     ORDER BY recorded_at DESC, rowid DESC"
  ))?;
  let raws = stmt
    .query_map(params![encode_uuid(material_id)], RawSnapshot::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  raws.into_iter().map(RawSnapshot::into_snapshot).collect()
}
