//! System registry and per-frame dispatcher.
//!
//! Systems are plain functions registered under unique names. Each frame the
//! [`SystemRegistry`] invokes every system exactly once, in a fixed order:
//! first by [`Phase`], then by registration order within the phase. The order
//! is part of the contract, because later systems observe the writes of
//! earlier ones within the same frame. The usual pairing is a `Mark` system
//! that flags entities (e.g. adds `dead`) and a `Sweep` system that acts on
//! the flag (e.g. removes the entity) before the frame ends.
//!
//! Dispatch is single-threaded and run-to-completion. A system that returns
//! an error is logged and recorded in the [`DispatchReport`]; the remaining
//! systems still run.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::store::ComponentStore;
use crate::EcsError;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Named slots in the frame. Phases run in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Turn input into component writes (velocities from keys, spawns from clicks).
    Input,
    /// Integrate motion and other continuous state.
    Simulate,
    /// Flag entities for later phases (dead, triggered).
    Mark,
    /// React to flags set earlier in the frame.
    React,
    /// Remove flagged entities.
    Sweep,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Input => "input",
            Phase::Simulate => "simulate",
            Phase::Mark => "mark",
            Phase::React => "react",
            Phase::Sweep => "sweep",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// SystemFn
// ---------------------------------------------------------------------------

/// A per-frame update function.
///
/// Receives the world's store, the frame input `I`, the shared state `S` and
/// the frame's delta time in seconds. All effects go through the store or the
/// shared state; references must not outlive the call.
pub type SystemFn<S, I> = fn(&mut ComponentStore, &I, &mut S, f32) -> Result<(), EcsError>;

struct RegisteredSystem<S, I> {
    name: String,
    phase: Phase,
    func: SystemFn<S, I>,
    after: Vec<String>,
}

impl<S, I> fmt::Debug for RegisteredSystem<S, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredSystem")
            .field("name", &self.name)
            .field("phase", &self.phase)
            .field("after", &self.after)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// DispatchReport
// ---------------------------------------------------------------------------

/// A system that returned an error during dispatch.
#[derive(Debug)]
pub struct SystemFailure {
    pub system: String,
    pub error: EcsError,
}

/// Outcome of one dispatch pass.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Wall-clock time per system, in execution order.
    pub system_times: Vec<(String, Duration)>,
    /// Total time for the pass.
    pub total_time: Duration,
    /// Systems that returned an error, in execution order.
    pub failures: Vec<SystemFailure>,
    /// World made active by a transition request at the end of the pass.
    pub transition: Option<String>,
}

impl DispatchReport {
    /// `true` if every system returned `Ok`.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Names of the systems that ran, in order.
    pub fn executed(&self) -> Vec<&str> {
        self.system_times.iter().map(|(name, _)| name.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// SystemRegistry
// ---------------------------------------------------------------------------

/// Ordered collection of systems for one world.
pub struct SystemRegistry<S, I> {
    /// Kept sorted by phase; registration order within a phase.
    systems: Vec<RegisteredSystem<S, I>>,
}

impl<S, I> fmt::Debug for SystemRegistry<S, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemRegistry")
            .field("systems", &self.systems)
            .finish()
    }
}

impl<S, I> Default for SystemRegistry<S, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, I> SystemRegistry<S, I> {
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
        }
    }

    /// Register a system in [`Phase::Simulate`].
    pub fn add_system(&mut self, name: &str, func: SystemFn<S, I>) -> Result<(), EcsError> {
        self.add_system_after(Phase::Simulate, name, &[], func)
    }

    /// Register a system at the end of `phase`.
    pub fn add_system_in(
        &mut self,
        phase: Phase,
        name: &str,
        func: SystemFn<S, I>,
    ) -> Result<(), EcsError> {
        self.add_system_after(phase, name, &[], func)
    }

    /// Register a system at the end of `phase`, asserting that every system
    /// named in `after` is already registered and runs before it.
    ///
    /// Fails with [`EcsError::DuplicateSystem`] if `name` is taken,
    /// [`EcsError::UnknownDependency`] if a dependency is not registered, and
    /// [`EcsError::DependencyOrder`] if a dependency sits in a later phase.
    pub fn add_system_after(
        &mut self,
        phase: Phase,
        name: &str,
        after: &[&str],
        func: SystemFn<S, I>,
    ) -> Result<(), EcsError> {
        if self.systems.iter().any(|s| s.name == name) {
            return Err(EcsError::DuplicateSystem {
                name: name.to_owned(),
            });
        }
        for dep in after {
            let Some(dep_system) = self.systems.iter().find(|s| s.name == *dep) else {
                return Err(EcsError::UnknownDependency {
                    system: name.to_owned(),
                    dependency: (*dep).to_owned(),
                });
            };
            if dep_system.phase > phase {
                return Err(EcsError::DependencyOrder {
                    system: name.to_owned(),
                    dependency: (*dep).to_owned(),
                });
            }
        }

        let index = self
            .systems
            .iter()
            .position(|s| s.phase > phase)
            .unwrap_or(self.systems.len());
        self.systems.insert(
            index,
            RegisteredSystem {
                name: name.to_owned(),
                phase,
                func,
                after: after.iter().map(|s| s.to_string()).collect(),
            },
        );
        debug!(system = name, %phase, index, "registered system");
        Ok(())
    }

    /// Unregister a system. Returns `false` if no system has that name.
    pub fn remove_system(&mut self, name: &str) -> bool {
        let before = self.systems.len();
        self.systems.retain(|s| s.name != name);
        self.systems.len() != before
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// System names in execution order.
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn phase_of(&self, name: &str) -> Option<Phase> {
        self.systems.iter().find(|s| s.name == name).map(|s| s.phase)
    }

    /// Systems `name` declared it must run after, as given at registration.
    pub fn dependencies_of(&self, name: &str) -> Option<&[String]> {
        self.systems
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.after.as_slice())
    }

    /// Run every system once, in order, against `store`.
    ///
    /// All systems see the same `input` and `dt`. Writes made by one system
    /// are visible to every later system in the same pass.
    pub fn run(
        &self,
        store: &mut ComponentStore,
        input: &I,
        state: &mut S,
        dt: f32,
    ) -> DispatchReport {
        let pass_start = Instant::now();
        let mut report = DispatchReport {
            system_times: Vec::with_capacity(self.systems.len()),
            ..Default::default()
        };

        for system in &self.systems {
            let start = Instant::now();
            let result = (system.func)(store, input, state, dt);
            report.system_times.push((system.name.clone(), start.elapsed()));
            if let Err(error) = result {
                warn!(system = %system.name, %error, "system failed");
                report.failures.push(SystemFailure {
                    system: system.name.clone(),
                    error,
                });
            }
        }

        report.total_time = pass_start.elapsed();
        report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
