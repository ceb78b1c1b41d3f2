//! Deduplicated entity store.
//!
//! [`ResultStore`] accumulates the entities returned by tile fetches, keyed
//! by their stable external identifier. Insertion is first-write-wins: a
//! later batch returning an already-known identifier never overwrites the
//! stored value. The store is append-only for the lifetime of a filter
//! context and is reset together with the fetch cache on context change.

use std::collections::HashMap;

use serde_json::{Map, Value};

/// One displayed record: a stable identifier, a geographic position, and
/// arbitrary attributes carried through from the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Globally unique external identifier (bridge structure number in the
    /// reference deployment).
    pub id: String,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Remaining record fields, untyped.
    pub attributes: Map<String, Value>,
}

impl Entity {
    /// Create an entity with no attributes.
    pub fn new(id: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            id: id.into(),
            lat,
            lon,
            attributes: Map::new(),
        }
    }

    /// Returns a copy with one attribute added.
    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

/// Deduplicated, append-only entity collection.
///
/// Iteration order is insertion order, stable for a given store state.
#[derive(Debug, Default)]
pub struct ResultStore {
    entities: HashMap<String, Entity>,
    order: Vec<String>,
}

impl ResultStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a batch of entities, first-write-wins per identifier.
    ///
    /// Returns the number of entities actually inserted.
    pub fn merge(&mut self, batch: impl IntoIterator<Item = Entity>) -> usize {
        let mut inserted = 0;
        for entity in batch {
            if self.entities.contains_key(&entity.id) {
                continue;
            }
            self.order.push(entity.id.clone());
            self.entities.insert(entity.id.clone(), entity);
            inserted += 1;
        }
        inserted
    }

    /// Look up one entity by identifier.
    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Iterate the collection in insertion order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.order.iter().filter_map(|id| self.entities.get(id))
    }

    /// Number of distinct entities stored.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the store holds no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Empty the store. Always paired with a fetch-cache clear.
    pub fn reset(&mut self) {
        self.entities.clear();
        self.order.clear();
    }
}
