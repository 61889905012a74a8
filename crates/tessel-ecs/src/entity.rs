//! Entity identifiers and allocation.
//!
//! An [`EntityId`] is a plain 64-bit counter value. Ids are handed out in
//! strictly increasing order and never recycled within a store, so iterating
//! entities by id visits them in creation order.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// An opaque entity identifier.
///
/// An entity carries no data of its own; it exists only while at least one
/// component is attached to it in a [`ComponentStore`](crate::store::ComponentStore).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Wrap a raw id value.
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw `u64` representation.
    #[inline]
    pub const fn to_raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for EntityId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// EntityAllocator
// ---------------------------------------------------------------------------

/// Hands out monotonically increasing [`EntityId`]s.
///
/// The first allocated id is `1`. Ids written explicitly by callers (see
/// [`observe`](Self::observe)) push the counter forward so that later
/// allocations never collide with them.
///
/// The counter saturates at `u64::MAX`. Once there, every allocation returns
/// `u64::MAX` again and logs a warning.
#[derive(Debug, Clone)]
pub struct EntityAllocator {
    /// The id the next call to [`allocate`](Self::allocate) returns.
    next: u64,
}

impl EntityAllocator {
    /// Create a new allocator starting at id `1`.
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Allocate a fresh [`EntityId`].
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        if self.next == u64::MAX {
            warn!(%id, "entity id space exhausted, handing out the last id again");
        }
        self.next = self.next.saturating_add(1);
        id
    }

    /// Record that `id` is in use, so it is never handed out again.
    pub fn observe(&mut self, id: EntityId) {
        if id.0 >= self.next {
            self.next = id.0.saturating_add(1);
        }
    }

    /// The id that the next allocation will return.
    pub fn peek(&self) -> EntityId {
        EntityId(self.next)
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
