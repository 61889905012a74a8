//! Query engine: "every requested component present" over a
//! [`ComponentStore`].
//!
//! A query names a [`ComponentSet`] and returns the entities holding all of
//! those components. Entities holding extra components still match; the
//! extras are simply not part of the returned row. Each row lists the
//! requested components in the order the set was built, so callers can
//! destructure it positionally:
//!
//! ```
//! use tessel_ecs::prelude::*;
//!
//! let mut store = ComponentStore::new();
//! let e = store.spawn([
//!     ("position", Component::from(Vec2::new(0.0, 0.0))),
//!     ("speed", Component::from(Vec2::new(1.0, 0.0))),
//! ]);
//!
//! for (_entity, row) in store.query_mut(["position", "speed"]) {
//!     let Some([pos, speed]) = row.into_array() else { continue };
//!     let speed = *speed.as_vec2().unwrap();
//!     *pos.as_vec2_mut().unwrap() += speed;
//! }
//!
//! assert_eq!(store.get(e, "position"), Some(&Component::Vec2(Vec2::new(1.0, 0.0))));
//! ```
//!
//! Matching is a scan of every entity with one map probe per requested id,
//! `O(entities * |set|)`. No per-combination index is kept.
//!
//! Results are computed at call time. [`query`](ComponentStore::query) and
//! [`query_mut`](ComponentStore::query_mut) borrow the store, so structural
//! changes wait until the borrow ends; systems that add or remove while
//! walking matches take an owned id list from
//! [`query_entities`](ComponentStore::query_entities) instead.

use std::collections::BTreeMap;

use crate::component::{Component, ComponentId};
use crate::entity::EntityId;
use crate::store::ComponentStore;

// ---------------------------------------------------------------------------
// ComponentSet
// ---------------------------------------------------------------------------

/// An ordered, duplicate-free list of component ids to query for.
///
/// Duplicates collapse onto their first occurrence, so `["a", "b", "a"]`
/// queries for `a` then `b`, and rows have two entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentSet {
    ids: Vec<ComponentId>,
}

impl ComponentSet {
    pub fn new<I, C>(ids: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ComponentId>,
    {
        let mut set = Self { ids: Vec::new() };
        for id in ids {
            let id = id.into();
            if !set.ids.contains(&id) {
                set.ids.push(id);
            }
        }
        set
    }

    /// Number of distinct ids.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentId> + '_ {
        self.ids.iter()
    }

    pub fn contains(&self, component: &str) -> bool {
        self.position(component).is_some()
    }

    /// Index of `component` within the set.
    pub fn position(&self, component: &str) -> Option<usize> {
        self.ids.iter().position(|id| id.as_str() == component)
    }
}

impl<C: Into<ComponentId>, const N: usize> From<[C; N]> for ComponentSet {
    fn from(ids: [C; N]) -> Self {
        Self::new(ids)
    }
}

impl<C: Into<ComponentId>> From<Vec<C>> for ComponentSet {
    fn from(ids: Vec<C>) -> Self {
        Self::new(ids)
    }
}

impl From<&ComponentSet> for ComponentSet {
    fn from(set: &ComponentSet) -> Self {
        set.clone()
    }
}

// ---------------------------------------------------------------------------
// QueryRow / QueryResult
// ---------------------------------------------------------------------------

/// The requested components of one matched entity, in set order.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRow<'s> {
    entries: Vec<(&'s ComponentId, &'s Component)>,
}

impl<'s> QueryRow<'s> {
    /// The value stored under `component`, if it was part of the query.
    pub fn get(&self, component: &str) -> Option<&'s Component> {
        self.entries
            .iter()
            .find(|(id, _)| id.as_str() == component)
            .map(|(_, value)| *value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'s ComponentId, &'s Component)> + '_ {
        self.entries.iter().copied()
    }

    pub fn values(&self) -> impl Iterator<Item = &'s Component> + '_ {
        self.entries.iter().map(|(_, value)| *value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The row as a fixed-size array for positional destructuring.
    ///
    /// `None` if `N` differs from the number of queried components.
    pub fn to_array<const N: usize>(&self) -> Option<[&'s Component; N]> {
        let values: Vec<&'s Component> = self.values().collect();
        values.try_into().ok()
    }
}

/// Matched entities of a read-only query, in ascending id order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult<'s> {
    rows: BTreeMap<EntityId, QueryRow<'s>>,
}

impl<'s> QueryResult<'s> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, entity: EntityId) -> Option<&QueryRow<'s>> {
        self.rows.get(&entity)
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.rows.contains_key(&entity)
    }

    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.rows.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &QueryRow<'s>)> + '_ {
        self.rows.iter().map(|(entity, row)| (*entity, row))
    }

    pub fn rows(&self) -> impl Iterator<Item = &QueryRow<'s>> + '_ {
        self.rows.values()
    }
}

impl<'s> IntoIterator for QueryResult<'s> {
    type Item = (EntityId, QueryRow<'s>);
    type IntoIter = std::collections::btree_map::IntoIter<EntityId, QueryRow<'s>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

// ---------------------------------------------------------------------------
// QueryRowMut
// ---------------------------------------------------------------------------

/// Mutable access to the requested components of one matched entity.
#[derive(Debug)]
pub struct QueryRowMut<'s> {
    entries: Vec<(&'s ComponentId, &'s mut Component)>,
}

impl<'s> QueryRowMut<'s> {
    pub fn get(&self, component: &str) -> Option<&Component> {
        self.entries
            .iter()
            .find(|(id, _)| id.as_str() == component)
            .map(|(_, value)| &**value)
    }

    pub fn get_mut(&mut self, component: &str) -> Option<&mut Component> {
        self.entries
            .iter_mut()
            .find(|(id, _)| id.as_str() == component)
            .map(|(_, value)| &mut **value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the row into a fixed-size array of mutable references, in
    /// set order. `None` if `N` differs from the number of queried components.
    pub fn into_array<const N: usize>(self) -> Option<[&'s mut Component; N]> {
        let values: Vec<&'s mut Component> =
            self.entries.into_iter().map(|(_, value)| value).collect();
        values.try_into().ok()
    }
}

// ---------------------------------------------------------------------------
// Query operations
// ---------------------------------------------------------------------------

impl ComponentStore {
    /// All entities holding every component in `set`, with those components.
    ///
    /// An empty set matches nothing.
    pub fn query(&self, set: impl Into<ComponentSet>) -> QueryResult<'_> {
        let set = set.into();
        let mut rows = BTreeMap::new();
        if set.is_empty() {
            return QueryResult { rows };
        }
        for (entity, row) in self.rows() {
            let entries: Vec<_> = set
                .iter()
                .map_while(|id| row.get_key_value(id.as_str()))
                .collect();
            if entries.len() == set.len() {
                rows.insert(*entity, QueryRow { entries });
            }
        }
        QueryResult { rows }
    }

    /// Ids of all entities holding every component in `set`.
    ///
    /// The returned list is owned, so the caller may add or remove
    /// components and entities while walking it. Changes made during the
    /// walk are not reflected in the list.
    pub fn query_entities(&self, set: impl Into<ComponentSet>) -> Vec<EntityId> {
        let set = set.into();
        if set.is_empty() {
            return Vec::new();
        }
        self.rows()
            .iter()
            .filter(|(_, row)| set.iter().all(|id| row.contains_key(id.as_str())))
            .map(|(entity, _)| *entity)
            .collect()
    }

    /// In-place mutable variant of [`query`](Self::query).
    ///
    /// Values may be changed freely; the set of components on each entity
    /// cannot change while the iterator is alive.
    pub fn query_mut(
        &mut self,
        set: impl Into<ComponentSet>,
    ) -> impl Iterator<Item = (EntityId, QueryRowMut<'_>)> + '_ {
        let set = set.into();
        self.rows_mut().filter_map(move |(entity, row)| {
            if set.is_empty() {
                return None;
            }
            let mut slots: Vec<Option<(&ComponentId, &mut Component)>> =
                (0..set.len()).map(|_| None).collect();
            for (id, value) in row.iter_mut() {
                if let Some(index) = set.position(id.as_str()) {
                    slots[index] = Some((id, value));
                }
            }
            let entries: Option<Vec<_>> = slots.into_iter().collect();
            entries.map(|entries| (*entity, QueryRowMut { entries }))
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
