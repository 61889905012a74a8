//! The per-frame host loop body.
//!
//! A [`FrameDriver`] owns a set of worlds and the state their systems share.
//! The host calls [`FrameDriver::step`] once per display frame with the raw
//! elapsed time and the events it collected, then draws with
//! [`FrameDriver::render`] and plays queued sounds.

use tessel_ecs::prelude::*;
use tracing::debug;

use crate::clock::FrameClock;
use crate::config::FrameConfig;
use crate::input::{FrameInput, InputEvent, InputSnapshot};
use crate::render::{draw_entities, Canvas};
use crate::EngineError;

/// What the host should do after a [`FrameDriver::step`].
#[derive(Debug)]
pub enum FrameOutcome {
    /// The frame was dispatched; keep going.
    Continue(DispatchReport),
    /// The user asked to quit. Nothing was dispatched this frame.
    Quit,
}

impl FrameOutcome {
    pub fn is_quit(&self) -> bool {
        matches!(self, FrameOutcome::Quit)
    }
}

// ---------------------------------------------------------------------------
// FrameDriver
// ---------------------------------------------------------------------------

/// Runs the active world once per frame.
pub struct FrameDriver<S> {
    worlds: Worlds<S, FrameInput>,
    state: S,
    clock: FrameClock,
    snapshot: InputSnapshot,
    frame_count: u64,
}

impl<S> std::fmt::Debug for FrameDriver<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameDriver")
            .field("worlds", &self.worlds)
            .field("clock", &self.clock)
            .field("frame_count", &self.frame_count)
            .finish()
    }
}

impl<S: WorldSelector> FrameDriver<S> {
    /// Validate `config` and build a driver around `worlds`.
    ///
    /// If the config names an initial world it becomes active; otherwise the
    /// first world added to `worlds` is.
    pub fn new(
        mut worlds: Worlds<S, FrameInput>,
        state: S,
        config: &FrameConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        if worlds.is_empty() {
            return Err(EcsError::NoActiveWorld.into());
        }
        if let Some(name) = &config.initial_world {
            worlds.set_active(name)?;
        }
        debug!(active = ?worlds.active_name(), worlds = worlds.len(), "frame driver ready");
        Ok(Self {
            worlds,
            state,
            clock: FrameClock::new(config),
            snapshot: InputSnapshot::new(),
            frame_count: 0,
        })
    }

    /// Run one frame.
    ///
    /// A quit event (window close or Escape) stops the loop before any
    /// system runs. Otherwise the events are folded into the held-input
    /// snapshot, `raw_dt` is clamped, and the active world is dispatched.
    pub fn step(
        &mut self,
        raw_dt: f64,
        events: Vec<InputEvent>,
    ) -> Result<FrameOutcome, EngineError> {
        if events.iter().any(InputEvent::is_quit) {
            debug!(frame = self.frame_count, "quit requested");
            return Ok(FrameOutcome::Quit);
        }

        let input = FrameInput::from_events(self.snapshot.clone(), events);
        let dt = self.clock.advance(raw_dt);
        let report = self.worlds.run_active(&input, &mut self.state, dt)?;
        self.snapshot = input.snapshot;
        self.frame_count += 1;
        Ok(FrameOutcome::Continue(report))
    }

    /// Draw the active world. Returns the number of images drawn.
    pub fn render(&self, canvas: &mut impl Canvas) -> usize {
        match self.worlds.active() {
            Some(world) => draw_entities(world.store(), canvas),
            None => 0,
        }
    }
}

impl<S> FrameDriver<S> {
    pub fn worlds(&self) -> &Worlds<S, FrameInput> {
        &self.worlds
    }

    pub fn worlds_mut(&mut self) -> &mut Worlds<S, FrameInput> {
        &mut self.worlds
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// Store of the active world.
    pub fn active_store(&self) -> Option<&ComponentStore> {
        self.worlds.active().map(World::store)
    }

    pub fn active_world(&self) -> Option<&str> {
        self.worlds.active_name()
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Held input state as of the last dispatched frame.
    pub fn snapshot(&self) -> &InputSnapshot {
        &self.snapshot
    }

    /// Number of frames dispatched so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}
