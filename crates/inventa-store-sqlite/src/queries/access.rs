use chrono::Utc;
use inventa_core::{
  access::{Entity, NewUser, Principal, Role, RoleInput, RoleUsage, User},
  store::Guarded,
};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior, params};
use uuid::Uuid;

use super::name_order;
use crate::{
  Result,
  encode::{
    RawRole, RawUser, ROLE_COLUMNS, USER_COLUMNS, encode_dt, encode_permissions, encode_uuid,
  },
};

// ─── Entities ────────────────────────────────────────────────────────────────

pub fn add_entity(conn: &Connection, name: String) -> Result<Entity> {
  let entity = Entity { id: Uuid::new_v4(), name, created_at: Utc::now() };
  conn.execute(
    "INSERT INTO entities (entity_id, name, created_at) VALUES (?1, ?2, ?3)",
    params![encode_uuid(entity.id), entity.name, encode_dt(entity.created_at)],
  )?;
  Ok(entity)
}

// ─── Roles ───────────────────────────────────────────────────────────────────

pub fn list_roles(conn: &Connection, entity_id: Uuid) -> Result<Vec<RoleUsage>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {ROLE_COLUMNS},
       (SELECT COUNT(*) FROM users WHERE users.role_id = roles.role_id)
     FROM roles
     WHERE entity_id = ?1"
  ))?;
  let raws = stmt
    .query_map(params![encode_uuid(entity_id)], |row| {
      Ok((RawRole::from_row(row, 0)?, row.get::<_, i64>(6)?))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut roles = raws
    .into_iter()
    .map(|(raw, users)| Ok(RoleUsage { role: raw.into_role()?, users: users as u64 }))
    .collect::<Result<Vec<_>>>()?;
  roles.sort_by_cached_key(|usage| name_order(&usage.role.name));
  Ok(roles)
}

fn get_role(conn: &Connection, id: Uuid, entity_id: Uuid) -> Result<Option<Role>> {
  conn
    .query_row(
      &format!("SELECT {ROLE_COLUMNS} FROM roles WHERE role_id = ?1 AND entity_id = ?2"),
      params![encode_uuid(id), encode_uuid(entity_id)],
      |row| RawRole::from_row(row, 0),
    )
    .optional()?
    .map(RawRole::into_role)
    .transpose()
}

pub fn insert_role(conn: &Connection, entity_id: Uuid, input: RoleInput) -> Result<Role> {
  let now = Utc::now();
  let role = Role {
    id: Uuid::new_v4(),
    entity_id,
    name: input.name,
    permissions: input.permissions,
    created_at: now,
    updated_at: now,
  };

  conn.execute(
    &format!("INSERT INTO roles ({ROLE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?5)"),
    params![
      encode_uuid(role.id),
      encode_uuid(entity_id),
      role.name,
      encode_permissions(&role.permissions)?,
      encode_dt(now),
    ],
  )?;
  Ok(role)
}

pub fn update_role(
  conn: &mut Connection,
  id: Uuid,
  entity_id: Uuid,
  input: RoleInput,
) -> Result<Option<Role>> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  let Some(current) = get_role(&tx, id, entity_id)? else {
    return Ok(None);
  };

  let updated = Role {
    name: input.name,
    permissions: input.permissions,
    updated_at: Utc::now(),
    ..current
  };
  tx.execute(
    "UPDATE roles SET name = ?2, permissions = ?3, updated_at = ?4 WHERE role_id = ?1",
    params![
      encode_uuid(id),
      updated.name,
      encode_permissions(&updated.permissions)?,
      encode_dt(updated.updated_at),
    ],
  )?;
  tx.commit()?;
  Ok(Some(updated))
}

pub fn delete_role(conn: &mut Connection, id: Uuid, entity_id: Uuid) -> Result<Guarded<Role>> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  let Some(role) = get_role(&tx, id, entity_id)? else {
    return Ok(Guarded::Missing);
  };

  let id_str = encode_uuid(id);
  let users: i64 = tx.query_row(
    "SELECT COUNT(*) FROM users WHERE role_id = ?1",
    params![id_str],
    |row| row.get(0),
  )?;
  if users > 0 {
    return Ok(Guarded::Referenced(users as u64));
  }

  tx.execute("DELETE FROM roles WHERE role_id = ?1", params![id_str])?;
  tx.commit()?;
  Ok(Guarded::Deleted(role))
}

// ─── Users ───────────────────────────────────────────────────────────────────

pub fn insert_user(conn: &Connection, entity_id: Uuid, input: NewUser) -> Result<User> {
  let user = User {
    id: Uuid::new_v4(),
    entity_id,
    email: input.email.trim().to_owned(),
    name: input.name,
    role_id: input.role_id,
    active: true,
    created_at: Utc::now(),
  };

  conn.execute(
    &format!("INSERT INTO users ({USER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
    params![
      encode_uuid(user.id),
      encode_uuid(entity_id),
      user.email,
      user.name,
      encode_uuid(user.role_id),
      user.active,
      encode_dt(user.created_at),
      input.password_hash,
    ],
  )?;
  Ok(user)
}

/// The `users.email` column collates without case.
pub fn find_principal(conn: &Connection, email: &str) -> Result<Option<Principal>> {
  let raw = conn
    .query_row(
      &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
      params![email.trim()],
      RawUser::from_row,
    )
    .optional()?;
  let Some(raw) = raw else {
    return Ok(None);
  };

  let (user, password_hash) = raw.into_user()?;
  let role = get_role(conn, user.role_id, user.entity_id)?;
  Ok(role.map(|role| Principal { user, password_hash, role }))
}

/// Returns `None` when no such user exists under `entity_id`.
pub fn set_user_active(
  conn: &Connection,
  id: Uuid,
  entity_id: Uuid,
  active: bool,
) -> Result<Option<User>> {
  conn.execute(
    "UPDATE users SET active = ?3 WHERE user_id = ?1 AND entity_id = ?2",
    params![encode_uuid(id), encode_uuid(entity_id), active],
  )?;
  let raw = conn
    .query_row(
      &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1 AND entity_id = ?2"),
      params![encode_uuid(id), encode_uuid(entity_id)],
      RawUser::from_row,
    )
    .optional()?;
  raw.map(|raw| raw.into_user().map(|(user, _)| user)).transpose()
}
