//! Tessel ECS -- a small, tag-keyed Entity Component System.
//!
//! Entities are bare ids. Components are [`Component`](component::Component)
//! payloads stored under string tags in a dual-indexed
//! [`ComponentStore`](store::ComponentStore) (entity -> tags and
//! tag -> entities). Queries return the entities holding every requested tag.
//! Systems are plain functions run once per frame in a fixed, phase-ordered
//! sequence, and a [`World`](world::World) bundles one store with its systems.
//!
//! # Quick Start
//!
//! ```
//! use tessel_ecs::prelude::*;
//!
//! fn movement(
//!     store: &mut ComponentStore,
//!     _input: &(),
//!     _state: &mut (),
//!     dt: f32,
//! ) -> Result<(), EcsError> {
//!     for (entity, row) in store.query_mut(["position", "speed"]) {
//!         let Some([pos, speed]) = row.into_array() else { continue };
//!         let speed = *speed.expect_vec2(entity, "speed")?;
//!         *pos.expect_vec2_mut(entity, "position")? += speed * dt;
//!     }
//!     Ok(())
//! }
//!
//! let mut world: World<(), ()> = World::new("main");
//! world.add_system("movement", movement).unwrap();
//!
//! let e = world.store_mut().spawn([
//!     ("position", Component::from(Vec2::new(0.0, 0.0))),
//!     ("speed", Component::from(Vec2::new(2.0, 0.0))),
//! ]);
//! world.run_systems(&(), &mut (), 0.5);
//!
//! assert_eq!(world.store().get(e, "position"), Some(&Component::Vec2(Vec2::new(1.0, 0.0))));
//! ```

#![deny(unsafe_code)]

pub mod component;
pub mod entity;
pub mod query;
pub mod store;
pub mod system;
pub mod world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by ECS operations.
///
/// Store reads and writes never fail: writes upsert and removals of missing
/// data are no-ops. Errors cover typed access, registration, and world
/// selection.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// A component holds a different payload variant than the caller expected.
    #[error("component '{component}' on {entity} is {found}, expected {expected}")]
    ComponentKind {
        entity: entity::EntityId,
        component: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A component a system requires is absent.
    #[error("{entity} has no component '{component}'")]
    MissingComponent {
        entity: entity::EntityId,
        component: String,
    },

    /// A system name was registered twice in the same registry.
    #[error("system '{name}' is already registered")]
    DuplicateSystem { name: String },

    /// A system declared a dependency that is not registered.
    #[error("system '{system}' depends on '{dependency}', which is not registered")]
    UnknownDependency { system: String, dependency: String },

    /// A system declared a dependency that would run after it.
    #[error("system '{system}' depends on '{dependency}', which runs in a later phase")]
    DependencyOrder { system: String, dependency: String },

    /// A world name was added twice to the same set.
    #[error("world '{name}' already exists")]
    DuplicateWorld { name: String },

    /// A world name that is not part of the set.
    #[error("world '{name}' does not exist")]
    UnknownWorld { name: String },

    /// Dispatch was requested on a set with no worlds.
    #[error("no active world")]
    NoActiveWorld,

    /// The entity and component indices disagree about an association.
    #[error("index desync for {entity} component '{component}'")]
    IndexDesync {
        entity: entity::EntityId,
        component: String,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::component::{
        Component, ComponentId, Countdown, ImageHandle, Rect, SoundHandle, Vec2,
    };
    pub use crate::entity::EntityId;
    pub use crate::query::{ComponentSet, QueryResult, QueryRow, QueryRowMut};
    pub use crate::store::ComponentStore;
    pub use crate::system::{DispatchReport, Phase, SystemFailure, SystemFn, SystemRegistry};
    pub use crate::world::{World, WorldSelector, Worlds};
    pub use crate::EcsError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------
