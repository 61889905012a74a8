//! Worlds: a component store paired with its system registry, and a named
//! set of worlds with one active member.
//!
//! Worlds are fully isolated from each other. Each has its own entity id
//! counter, so two worlds can both contain an entity `1` that share nothing.
//! Only the active world of a [`Worlds`] set is dispatched; the others keep
//! their state untouched until they are selected again.
//!
//! Switching is requested through shared state rather than performed by the
//! systems themselves: a system records the target (see [`WorldSelector`]),
//! and the set applies it once the pass is over, so the switch takes effect
//! from the next frame.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::store::ComponentStore;
use crate::system::{DispatchReport, Phase, SystemFn, SystemRegistry};
use crate::EcsError;

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// A named component store together with the systems that update it.
pub struct World<S, I> {
    name: String,
    store: ComponentStore,
    systems: SystemRegistry<S, I>,
}

impl<S, I> std::fmt::Debug for World<S, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("name", &self.name)
            .field("entity_count", &self.store.entity_count())
            .field("systems", &self.systems.system_names())
            .finish()
    }
}

impl<S, I> World<S, I> {
    /// Create an empty world with no systems.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            store: ComponentStore::new(),
            systems: SystemRegistry::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &ComponentStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ComponentStore {
        &mut self.store
    }

    pub fn systems(&self) -> &SystemRegistry<S, I> {
        &self.systems
    }

    pub fn systems_mut(&mut self) -> &mut SystemRegistry<S, I> {
        &mut self.systems
    }

    /// See [`SystemRegistry::add_system`].
    pub fn add_system(&mut self, name: &str, func: SystemFn<S, I>) -> Result<(), EcsError> {
        self.systems.add_system(name, func)
    }

    /// See [`SystemRegistry::add_system_in`].
    pub fn add_system_in(
        &mut self,
        phase: Phase,
        name: &str,
        func: SystemFn<S, I>,
    ) -> Result<(), EcsError> {
        self.systems.add_system_in(phase, name, func)
    }

    /// See [`SystemRegistry::add_system_after`].
    pub fn add_system_after(
        &mut self,
        phase: Phase,
        name: &str,
        after: &[&str],
        func: SystemFn<S, I>,
    ) -> Result<(), EcsError> {
        self.systems.add_system_after(phase, name, after, func)
    }

    /// Run one frame of this world's systems against its own store.
    pub fn run_systems(&mut self, input: &I, state: &mut S, dt: f32) -> DispatchReport {
        self.systems.run(&mut self.store, input, state, dt)
    }
}

// ---------------------------------------------------------------------------
// WorldSelector
// ---------------------------------------------------------------------------

/// Shared state that can ask a [`Worlds`] set to change its active world.
///
/// Systems record a request on the state during the pass; the set consumes
/// it exactly once, after the pass.
pub trait WorldSelector {
    /// Take the pending switch request, if any.
    fn take_transition(&mut self) -> Option<String>;
}

impl WorldSelector for () {
    fn take_transition(&mut self) -> Option<String> {
        None
    }
}

// ---------------------------------------------------------------------------
// Worlds
// ---------------------------------------------------------------------------

/// A set of independent worlds addressed by name, with one active world.
pub struct Worlds<S, I> {
    worlds: BTreeMap<String, World<S, I>>,
    active: Option<String>,
}

impl<S, I> std::fmt::Debug for Worlds<S, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worlds")
            .field("worlds", &self.worlds.keys().collect::<Vec<_>>())
            .field("active", &self.active)
            .finish()
    }
}

impl<S, I> Default for Worlds<S, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, I> Worlds<S, I> {
    pub fn new() -> Self {
        Self {
            worlds: BTreeMap::new(),
            active: None,
        }
    }

    /// Add a world. The first world added becomes active.
    pub fn insert(&mut self, world: World<S, I>) -> Result<(), EcsError> {
        if self.worlds.contains_key(world.name()) {
            return Err(EcsError::DuplicateWorld {
                name: world.name().to_owned(),
            });
        }
        let name = world.name().to_owned();
        if self.active.is_none() {
            self.active = Some(name.clone());
        }
        self.worlds.insert(name, world);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&World<S, I>> {
        self.worlds.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut World<S, I>> {
        self.worlds.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.worlds.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.worlds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.worlds.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.worlds.keys().map(String::as_str)
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active(&self) -> Option<&World<S, I>> {
        self.worlds.get(self.active.as_deref()?)
    }

    pub fn active_mut(&mut self) -> Option<&mut World<S, I>> {
        let name = self.active.as_deref()?;
        self.worlds.get_mut(name)
    }

    /// Select the world that receives the next dispatch.
    pub fn set_active(&mut self, name: &str) -> Result<(), EcsError> {
        if !self.worlds.contains_key(name) {
            return Err(EcsError::UnknownWorld {
                name: name.to_owned(),
            });
        }
        if self.active.as_deref() != Some(name) {
            debug!(from = ?self.active, to = name, "active world changed");
            self.active = Some(name.to_owned());
        }
        Ok(())
    }
}

impl<S: WorldSelector, I> Worlds<S, I> {
    /// Dispatch one frame to the active world, then apply any transition the
    /// systems requested through `state`.
    ///
    /// A request naming an unknown world is logged and dropped; the active
    /// world stays as it was.
    pub fn run_active(
        &mut self,
        input: &I,
        state: &mut S,
        dt: f32,
    ) -> Result<DispatchReport, EcsError> {
        let world = self.active_mut().ok_or(EcsError::NoActiveWorld)?;
        let mut report = world.run_systems(input, state, dt);

        if let Some(target) = state.take_transition() {
            match self.set_active(&target) {
                Ok(()) => report.transition = Some(target),
                Err(error) => warn!(%error, "ignoring world transition"),
            }
        }
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Switch {
        frames: u32,
        request: Option<String>,
    }

    impl WorldSelector for Switch {
        fn take_transition(&mut self) -> Option<String> {
            self.request.take()
        }
    }

    fn count(_: &mut ComponentStore, _: &(), s: &mut Switch, _: f32) -> Result<(), EcsError> {
        s.frames += 1;
        Ok(())
    }

    fn go_to_b(_: &mut ComponentStore, _: &(), s: &mut Switch, _: f32) -> Result<(), EcsError> {
        s.request = Some("b".to_owned());
        Ok(())
    }

    fn go_nowhere(_: &mut ComponentStore, _: &(), s: &mut Switch, _: f32) -> Result<(), EcsError> {
        s.request = Some("missing".to_owned());
        Ok(())
    }

    #[test]
    fn first_inserted_world_is_active() {
        let mut worlds: Worlds<Switch, ()> = Worlds::new();
        worlds.insert(World::new("a")).unwrap();
        worlds.insert(World::new("b")).unwrap();
        assert_eq!(worlds.active_name(), Some("a"));
        assert!(matches!(
            worlds.insert(World::new("a")),
            Err(EcsError::DuplicateWorld { .. })
        ));
    }

    #[test]
    fn only_active_world_runs() {
        let mut a: World<Switch, ()> = World::new("a");
        a.add_system("count", count).unwrap();
        a.store_mut().spawn([("marker", true)]);
        let mut b: World<Switch, ()> = World::new("b");
        b.add_system("count", count).unwrap();
        b.add_system("go_to_b", go_to_b).unwrap();

        let mut worlds = Worlds::new();
        worlds.insert(a).unwrap();
        worlds.insert(b).unwrap();

        let mut state = Switch::default();
        worlds.run_active(&(), &mut state, 0.016).unwrap();
        assert_eq!(state.frames, 1);
        assert_eq!(worlds.active_name(), Some("a"));
        assert_eq!(worlds.get("a").unwrap().store().entity_count(), 1);
    }

    #[test]
    fn transition_applies_after_the_pass() {
        let mut a: World<Switch, ()> = World::new("a");
        a.add_system("go_to_b", go_to_b).unwrap();
        a.add_system("count", count).unwrap();
        let mut worlds = Worlds::new();
        worlds.insert(a).unwrap();
        worlds.insert(World::new("b")).unwrap();

        let mut state = Switch::default();
        let report = worlds.run_active(&(), &mut state, 0.016).unwrap();

        // Systems after the request still ran in the old world.
        assert_eq!(state.frames, 1);
        assert_eq!(report.transition.as_deref(), Some("b"));
        assert_eq!(worlds.active_name(), Some("b"));
    }

    #[test]
    fn unknown_transition_is_ignored() {
        let mut a: World<Switch, ()> = World::new("a");
        a.add_system("go_nowhere", go_nowhere).unwrap();
        let mut worlds = Worlds::new();
        worlds.insert(a).unwrap();

        let mut state = Switch::default();
        let report = worlds.run_active(&(), &mut state, 0.016).unwrap();
        assert_eq!(report.transition, None);
        assert_eq!(worlds.active_name(), Some("a"));
        assert_eq!(state.request, None);
    }

    #[test]
    fn empty_set_has_no_active_world() {
        let mut worlds: Worlds<Switch, ()> = Worlds::new();
        let err = worlds
            .run_active(&(), &mut Switch::default(), 0.016)
            .unwrap_err();
        assert!(matches!(err, EcsError::NoActiveWorld));
        assert!(matches!(
            worlds.set_active("a"),
            Err(EcsError::UnknownWorld { .. })
        ));
    }
}
