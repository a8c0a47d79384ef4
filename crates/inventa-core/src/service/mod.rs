//! Mutation and query services.
//!
//! Services assume the caller has already passed the permission guard; they
//! validate input, apply it through the store, append audit entries and
//! schedule history regeneration.

mod characteristic;
mod material;
mod role;
mod tag;

use std::sync::Arc;

pub use characteristic::CharacteristicService;
pub use material::MaterialService;
pub use role::RoleService;
pub use tag::TagService;

use crate::{
  audit::AuditLog,
  history::{HistoryGenerator, StoreHistory},
  store::InventoryStore,
};

/// Every service, sharing one store and one history generator.
pub struct Catalog<S, H = StoreHistory<S>> {
  pub characteristics: CharacteristicService<S>,
  pub tags:            TagService<S, H>,
  pub materials:       MaterialService<S, H>,
  pub roles:           RoleService<S>,
}

impl<S> Catalog<S>
where
  S: InventoryStore + AuditLog,
{
  /// Build the catalog with the store-backed history generator.
  pub fn new(store: Arc<S>) -> Self {
    let history = Arc::new(StoreHistory::new(Arc::clone(&store)));
    Self::with_history(store, history)
  }
}

impl<S, H> Catalog<S, H>
where
  S: InventoryStore + AuditLog,
  H: HistoryGenerator,
{
  pub fn with_history(store: Arc<S>, history: Arc<H>) -> Self {
    Self {
      characteristics: CharacteristicService::new(Arc::clone(&store)),
      tags:            TagService::new(Arc::clone(&store), Arc::clone(&history)),
      materials:       MaterialService::new(Arc::clone(&store), history),
      roles:           RoleService::new(store),
    }
  }
}
