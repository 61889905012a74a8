//! The dual-indexed component store.
//!
//! A [`ComponentStore`] keeps every `(entity, component-id) -> value`
//! association reachable from two directions:
//!
//! - **entity-indexed**: entity -> (component-id -> value). This map owns the
//!   values and is the single source of truth.
//! - **component-indexed**: component-id -> set of entities. A derived index,
//!   written in the same call as every change to the entity-indexed map.
//!
//! An association is present in one index iff it is present in the other.
//! Values are stored exactly once, so both directions always observe the same
//! value. [`check_consistency`](ComponentStore::check_consistency) verifies
//! the symmetry and is exercised by the property tests.
//!
//! Every operation is total: writes upsert, removals of missing entities or
//! components are no-ops, and reads of missing data return `None` or an empty
//! iterator.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::trace;

use crate::component::{Component, ComponentId};
use crate::entity::{EntityAllocator, EntityId};
use crate::EcsError;

/// One entity's components, keyed by tag.
pub(crate) type Row = BTreeMap<ComponentId, Component>;

// ---------------------------------------------------------------------------
// ComponentStore
// ---------------------------------------------------------------------------

/// Heterogeneous, tag-keyed storage for all entity data of one world.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ComponentStore {
    /// Id source for [`spawn`](Self::spawn).
    #[serde(skip)]
    allocator: EntityAllocator,
    /// entity -> (component-id -> value). Owns the values.
    pub(crate) entities: BTreeMap<EntityId, Row>,
    /// component-id -> entities holding that component.
    #[serde(skip)]
    components: BTreeMap<ComponentId, BTreeSet<EntityId>>,
}

impl ComponentStore {
    /// Create an empty store. The first spawned entity gets id `1`.
    pub fn new() -> Self {
        Self::default()
    }

    // -- writes -------------------------------------------------------------

    /// Allocate a fresh entity and attach `components` to it in one call.
    ///
    /// If `components` is empty the id is still consumed, but no entity
    /// exists until a component is attached to it.
    pub fn spawn<I, C, V>(&mut self, components: I) -> EntityId
    where
        I: IntoIterator<Item = (C, V)>,
        C: Into<ComponentId>,
        V: Into<Component>,
    {
        let entity = self.allocator.allocate();
        self.add_components(entity, components);
        trace!(%entity, "spawned entity");
        entity
    }

    /// Attach (or overwrite) several components on `entity`.
    ///
    /// Pairs are written in order; a tag repeated in `components` ends up
    /// holding the last value given for it.
    pub fn add_components<I, C, V>(&mut self, entity: EntityId, components: I)
    where
        I: IntoIterator<Item = (C, V)>,
        C: Into<ComponentId>,
        V: Into<Component>,
    {
        for (component, value) in components {
            self.add_component(entity, component, value);
        }
    }

    /// Attach `value` to `entity` under `component`, creating the entity row
    /// and the component bucket if absent.
    ///
    /// Overwrites silently. Returns the value previously stored for this
    /// pair, if any.
    pub fn add_component(
        &mut self,
        entity: EntityId,
        component: impl Into<ComponentId>,
        value: impl Into<Component>,
    ) -> Option<Component> {
        let component = component.into();
        self.allocator.observe(entity);
        self.components
            .entry(component.clone())
            .or_default()
            .insert(entity);
        self.entities
            .entry(entity)
            .or_default()
            .insert(component, value.into())
    }

    /// Detach one component from `entity`.
    ///
    /// Removing an entity's last component removes the entity itself, since
    /// an entity only exists through its components. Returns the removed
    /// value, or `None` if the pair was absent.
    pub fn remove_component(&mut self, entity: EntityId, component: &str) -> Option<Component> {
        let row = self.entities.get_mut(&entity)?;
        let value = row.remove(component)?;
        if row.is_empty() {
            self.entities.remove(&entity);
        }
        if let Some(bucket) = self.components.get_mut(component) {
            bucket.remove(&entity);
        }
        Some(value)
    }

    /// Erase every association of `entity` from both indices.
    ///
    /// Returns `false` (and does nothing) if the entity does not exist.
    pub fn remove_entity(&mut self, entity: EntityId) -> bool {
        let Some(row) = self.entities.remove(&entity) else {
            return false;
        };
        for component in row.keys() {
            if let Some(bucket) = self.components.get_mut(component) {
                bucket.remove(&entity);
            }
        }
        trace!(%entity, components = row.len(), "removed entity");
        true
    }

    /// Remove every entity. The id counter keeps running, so ids handed out
    /// before the clear are never reused.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.components.clear();
    }

    // -- reads --------------------------------------------------------------

    /// Borrow one component of one entity.
    pub fn get(&self, entity: EntityId, component: &str) -> Option<&Component> {
        self.entities.get(&entity)?.get(component)
    }

    /// Mutably borrow one component of one entity.
    pub fn get_mut(&mut self, entity: EntityId, component: &str) -> Option<&mut Component> {
        self.entities.get_mut(&entity)?.get_mut(component)
    }

    pub fn has_component(&self, entity: EntityId, component: &str) -> bool {
        self.get(entity, component).is_some()
    }

    pub fn contains_entity(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    /// Number of entities with at least one component.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// All live entities in ascending id order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// The entity-indexed view: every component held by `entity`.
    ///
    /// Empty if the entity does not exist.
    pub fn components_of(
        &self,
        entity: EntityId,
    ) -> impl Iterator<Item = (&ComponentId, &Component)> + '_ {
        self.entities.get(&entity).into_iter().flat_map(|row| row.iter())
    }

    /// The component-indexed view: every entity holding `component`, with
    /// its value, in ascending id order.
    pub fn entities_with<'s>(
        &'s self,
        component: &'s str,
    ) -> impl Iterator<Item = (EntityId, &'s Component)> + 's {
        self.components
            .get(component)
            .into_iter()
            .flat_map(|bucket| bucket.iter())
            .filter_map(move |entity| {
                self.entities
                    .get(entity)
                    .and_then(|row| row.get(component))
                    .map(|value| (*entity, value))
            })
    }

    /// Every tag that has ever been written to this store.
    ///
    /// Buckets are created on first write and kept even when they empty out.
    pub fn component_ids(&self) -> impl Iterator<Item = &ComponentId> + '_ {
        self.components.keys()
    }

    /// Number of entities currently holding `component`.
    pub fn count_with(&self, component: &str) -> usize {
        self.components.get(component).map_or(0, BTreeSet::len)
    }

    /// The id the next [`spawn`](Self::spawn) will return.
    pub fn next_entity(&self) -> EntityId {
        self.allocator.peek()
    }

    // -- invariants ---------------------------------------------------------

    /// Verify that both indices describe the same set of associations.
    ///
    /// Returns [`EcsError::IndexDesync`] for the first pair found in one
    /// index but not the other.
    pub fn check_consistency(&self) -> Result<(), EcsError> {
        for (entity, row) in &self.entities {
            if row.is_empty() {
                return Err(EcsError::IndexDesync {
                    entity: *entity,
                    component: String::new(),
                });
            }
            for component in row.keys() {
                let indexed = self
                    .components
                    .get(component)
                    .is_some_and(|bucket| bucket.contains(entity));
                if !indexed {
                    return Err(EcsError::IndexDesync {
                        entity: *entity,
                        component: component.to_string(),
                    });
                }
            }
        }
        for (component, bucket) in &self.components {
            for entity in bucket {
                if !self.has_component(*entity, component.as_str()) {
                    return Err(EcsError::IndexDesync {
                        entity: *entity,
                        component: component.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    // -- crate-internal -----------------------------------------------------

    pub(crate) fn rows(&self) -> &BTreeMap<EntityId, Row> {
        &self.entities
    }

    /// Mutable row access for in-place queries. Callers may change values
    /// but never add or remove keys, which keeps the secondary index valid.
    pub(crate) fn rows_mut(&mut self) -> impl Iterator<Item = (&EntityId, &mut Row)> + '_ {
        self.entities.iter_mut()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
