//! Integration tests for `SqliteStore` and the services running on it,
//! against an in-memory database.

mod characteristics;
mod materials;
mod roles;

use std::{sync::Arc, time::Duration};

use inventa_core::{
  characteristic::{Characteristic, CharacteristicKind, NewCharacteristic},
  history::{HistoryGenerator, StoreHistory},
  material::{Material, NewMaterial},
  service::Catalog,
  store::InventoryStore,
  tag::{Tag, TagInput},
};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

/// Wraps the real generator and reports every material it regenerated.
struct Recorder {
  inner: StoreHistory<SqliteStore>,
  seen:  mpsc::UnboundedSender<Uuid>,
}

impl HistoryGenerator for Recorder {
  async fn regenerate(&self, material_id: Uuid) -> inventa_core::Result<()> {
    let outcome = self.inner.regenerate(material_id).await;
    let _ = self.seen.send(material_id);
    outcome
  }
}

/// A catalog over a fresh store with one entity, observing history
/// regeneration.
struct Harness {
  store:       Arc<SqliteStore>,
  catalog:     Catalog<SqliteStore, Recorder>,
  entity:      Uuid,
  regenerated: mpsc::UnboundedReceiver<Uuid>,
}

/// How long to wait for background regeneration to go quiet.
const QUIET: Duration = Duration::from_millis(200);

impl Harness {
  async fn new() -> Self {
    let store = Arc::new(store().await);
    let entity = store.add_entity("Acme".into()).await.unwrap().id;

    let (seen, regenerated) = mpsc::unbounded_channel();
    let recorder = Recorder { inner: StoreHistory::new(Arc::clone(&store)), seen };
    let catalog = Catalog::with_history(Arc::clone(&store), Arc::new(recorder));

    Self { store, catalog, entity, regenerated }
  }

  /// Every material regenerated since the last call, sorted, once no new
  /// regeneration has been reported for [`QUIET`].
  async fn settle(&mut self) -> Vec<Uuid> {
    let mut seen = Vec::new();
    while let Ok(Some(id)) = tokio::time::timeout(QUIET, self.regenerated.recv()).await {
      seen.push(id);
    }
    seen.sort();
    seen
  }

  async fn characteristic(&self, name: &str, kind: CharacteristicKind) -> Characteristic {
    let options = kind
      .has_options()
      .then(|| vec!["small".to_owned(), "large".to_owned()]);
    self
      .catalog
      .characteristics
      .create(self.entity, NewCharacteristic {
        name: name.into(),
        description: None,
        kind,
        options,
        units: None,
      })
      .await
      .unwrap()
  }

  async fn tag(&self, name: &str) -> Tag {
    self
      .catalog
      .tags
      .create(self.entity, tag_input(name))
      .await
      .unwrap()
  }

  async fn material(&self, name: &str) -> Material {
    self
      .catalog
      .materials
      .create(self.entity, NewMaterial { name: name.into() })
      .await
      .unwrap()
  }

  /// A material carrying `tags`, with its regeneration already drained.
  async fn tagged_material(&mut self, name: &str, tags: &[&Tag]) -> Material {
    let material = self.material(name).await;
    self
      .catalog
      .materials
      .set_tags(material.id, self.entity, tags.iter().map(|t| t.id).collect())
      .await
      .unwrap();
    self.settle().await;
    material
  }
}

fn tag_input(name: &str) -> TagInput {
  TagInput {
    name:       name.into(),
    color:      "#ff0000".into(),
    font_color: "#ffffff".into(),
  }
}
