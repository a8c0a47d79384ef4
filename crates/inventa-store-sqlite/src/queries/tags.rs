use chrono::Utc;
use inventa_core::{
  store::{Guarded, ReferenceScope},
  tag::{Tag, TagInput, TagRevision, TagUsage},
};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior, params};
use uuid::Uuid;

use super::{name_order, scope_clause};
use crate::{
  Result,
  encode::{RawTag, TAG_COLUMNS, decode_uuid, encode_dt, encode_uuid},
};

pub fn list(conn: &Connection, entity_id: Uuid) -> Result<Vec<TagUsage>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {TAG_COLUMNS},
       (SELECT COUNT(*) FROM material_tags mt
        JOIN materials m ON m.material_id = mt.material_id
        WHERE mt.tag_id = tags.tag_id AND m.deleted_at IS NULL)
     FROM tags
     WHERE entity_id = ?1"
  ))?;
  let raws = stmt
    .query_map(params![encode_uuid(entity_id)], |row| {
      Ok((RawTag::from_row(row)?, row.get::<_, i64>(7)?))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut tags = raws
    .into_iter()
    .map(|(raw, materials)| {
      Ok(TagUsage { tag: raw.into_tag()?, materials: materials as u64 })
    })
    .collect::<Result<Vec<_>>>()?;
  tags.sort_by_cached_key(|usage| name_order(&usage.tag.name));
  Ok(tags)
}

pub fn get(conn: &Connection, id: Uuid, entity_id: Uuid) -> Result<Option<Tag>> {
  conn
    .query_row(
      &format!("SELECT {TAG_COLUMNS} FROM tags WHERE tag_id = ?1 AND entity_id = ?2"),
      params![encode_uuid(id), encode_uuid(entity_id)],
      RawTag::from_row,
    )
    .optional()?
    .map(RawTag::into_tag)
    .transpose()
}

/// The tags of `material_id`, sorted by name.
pub fn of_material(conn: &Connection, material_id: Uuid) -> Result<Vec<Tag>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {TAG_COLUMNS} FROM tags
     WHERE tag_id IN (SELECT tag_id FROM material_tags WHERE material_id = ?1)"
  ))?;
  let raws = stmt
    .query_map(params![encode_uuid(material_id)], RawTag::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut tags = raws.into_iter().map(RawTag::into_tag).collect::<Result<Vec<_>>>()?;
  tags.sort_by_cached_key(|tag| name_order(&tag.name));
  Ok(tags)
}

pub fn find(conn: &Connection, entity_id: Uuid, ids: &[Uuid]) -> Result<Vec<Tag>> {
  let mut found = Vec::with_capacity(ids.len());
  for &id in ids {
    if let Some(tag) = get(conn, id, entity_id)? {
      found.push(tag);
    }
  }
  Ok(found)
}

pub fn insert(conn: &Connection, entity_id: Uuid, input: TagInput) -> Result<Tag> {
  let now = Utc::now();
  let tag = Tag {
    id: Uuid::new_v4(),
    entity_id,
    name: input.name,
    color: input.color,
    font_color: input.font_color,
    created_at: now,
    updated_at: now,
  };

  conn.execute(
    "INSERT INTO tags (tag_id, entity_id, name, color, font_color, created_at, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
    params![
      encode_uuid(tag.id),
      encode_uuid(entity_id),
      tag.name,
      tag.color,
      tag.font_color,
      encode_dt(now),
    ],
  )?;
  Ok(tag)
}

/// Collect the active materials carrying the tag, then update it, in one
/// transaction.
pub fn update(
  conn: &mut Connection,
  id: Uuid,
  entity_id: Uuid,
  input: TagInput,
) -> Result<Option<TagRevision>> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  let Some(previous) = get(&tx, id, entity_id)? else {
    return Ok(None);
  };

  let id_str = encode_uuid(id);
  let active_materials = {
    let mut stmt = tx.prepare(
      "SELECT mt.material_id FROM material_tags mt
       JOIN materials m ON m.material_id = mt.material_id
       WHERE mt.tag_id = ?1 AND m.deleted_at IS NULL
       ORDER BY m.created_at",
    )?;
    let ids = stmt
      .query_map(params![id_str], |row| row.get::<_, String>(0))?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    ids.iter().map(|s| decode_uuid(s)).collect::<Result<Vec<_>>>()?
  };

  let current = Tag {
    name: input.name,
    color: input.color,
    font_color: input.font_color,
    updated_at: Utc::now(),
    ..previous.clone()
  };

  tx.execute(
    "UPDATE tags SET name = ?2, color = ?3, font_color = ?4, updated_at = ?5
     WHERE tag_id = ?1",
    params![
      id_str,
      current.name,
      current.color,
      current.font_color,
      encode_dt(current.updated_at),
    ],
  )?;

  tx.commit()?;
  Ok(Some(TagRevision { previous, current, active_materials }))
}

pub fn delete_guarded(
  conn: &mut Connection,
  id: Uuid,
  entity_id: Uuid,
  scope: ReferenceScope,
) -> Result<Guarded<Tag>> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  let Some(tag) = get(&tx, id, entity_id)? else {
    return Ok(Guarded::Missing);
  };

  let id_str = encode_uuid(id);
  let references: i64 = tx.query_row(
    &format!(
      "SELECT COUNT(*) FROM material_tags mt
       JOIN materials m ON m.material_id = mt.material_id
       WHERE mt.tag_id = ?1 {}",
      scope_clause(scope)
    ),
    params![id_str],
    |row| row.get(0),
  )?;
  if references > 0 {
    return Ok(Guarded::Referenced(references as u64));
  }

  tx.execute("DELETE FROM tags WHERE tag_id = ?1", params![id_str])?;
  tx.commit()?;
  Ok(Guarded::Deleted(tag))
}
