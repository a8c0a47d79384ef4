//! Synchronous query functions run on the connection thread.
//!
//! Each function takes a plain [`rusqlite::Connection`] (or a transaction,
//! through deref) and returns decoded domain types, so a single
//! `tokio_rusqlite` call can combine several of them atomically.

pub mod access;
pub mod audit;
pub mod characteristics;
pub mod history;
pub mod materials;
pub mod tags;

use inventa_core::store::ReferenceScope;

/// Extra `WHERE` clause restricting a join on `materials m` to `scope`.
fn scope_clause(scope: ReferenceScope) -> &'static str {
  match scope {
    ReferenceScope::ActiveMaterials => "AND m.deleted_at IS NULL",
    ReferenceScope::AllMaterials => "",
  }
}

/// Case-insensitive sort key for display names, folding beyond ASCII.
///
/// Names equal under folding fall back to their exact spelling so the order
/// is stable.
fn name_order(name: &str) -> (String, String) { (name.to_lowercase(), name.to_owned()) }
