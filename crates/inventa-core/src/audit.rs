//! Audit log contract.
//!
//! Services append one event per successful mutation. Appending is
//! best-effort: a failure is logged and never turns a completed mutation into
//! an error.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuditKind {
  CharacteristicCreated,
  CharacteristicUpdated,
  CharacteristicDeleted,
  TagCreated,
  TagUpdated,
  TagDeleted,
  MaterialCreated,
  MaterialUpdated,
  MaterialDeleted,
  FileRegistered,
  RoleCreated,
  RoleUpdated,
  RoleDeleted,
}

impl AuditKind {
  pub fn as_str(self) -> &'static str { self.into() }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
  pub kind:         AuditKind,
  pub subject_id:   Uuid,
  pub subject_name: String,
  pub entity_id:    Uuid,
}

impl AuditEvent {
  pub fn new(
    kind: AuditKind,
    subject_id: Uuid,
    subject_name: impl Into<String>,
    entity_id: Uuid,
  ) -> Self {
    Self { kind, subject_id, subject_name: subject_name.into(), entity_id }
  }
}

/// A persisted [`AuditEvent`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
  pub id:          Uuid,
  #[serde(flatten)]
  pub event:       AuditEvent,
  pub recorded_at: DateTime<Utc>,
}

pub trait AuditLog: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn append(
    &self,
    event: AuditEvent,
  ) -> impl Future<Output = Result<AuditEntry, Self::Error>> + Send + '_;

  /// Most recent entries first.
  fn list_audit(
    &self,
    entity_id: Uuid,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<AuditEntry>, Self::Error>> + Send + '_;
}

/// Append `event`, logging instead of failing.
pub async fn record<A: AuditLog>(log: &A, event: AuditEvent) {
  let kind = event.kind;
  let subject_id = event.subject_id;
  if let Err(e) = log.append(event).await {
    tracing::warn!(%kind, %subject_id, error = %e, "failed to append audit entry");
  }
}
