use chrono::Utc;
use inventa_core::audit::{AuditEntry, AuditEvent};
use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::{
  Result,
  encode::{AUDIT_COLUMNS, RawAudit, encode_dt, encode_uuid},
};

pub fn append(conn: &Connection, event: AuditEvent) -> Result<AuditEntry> {
  let entry = AuditEntry { id: Uuid::new_v4(), event, recorded_at: Utc::now() };

  conn.execute(
    &format!("INSERT INTO audit_log ({AUDIT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
    params![
      encode_uuid(entry.id),
      encode_uuid(entry.event.entity_id),
      entry.event.kind.as_str(),
      encode_uuid(entry.event.subject_id),
      entry.event.subject_name,
      encode_dt(entry.recorded_at),
    ],
  )?;
  Ok(entry)
}

pub fn list(conn: &Connection, entity_id: Uuid, limit: usize) -> Result<Vec<AuditEntry>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {AUDIT_COLUMNS} FROM audit_log
     WHERE entity_id = ?1
     ORDER BY recorded_at DESC, rowid DESC
     LIMIT ?2"
  ))?;
  let limit = i64::try_from(limit).unwrap_or(i64::MAX);
  let raws = stmt
    .query_map(params![encode_uuid(entity_id), limit], RawAudit::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  raws.into_iter().map(RawAudit::into_entry).collect()
}
