//! Levels: three worlds linked by teleporters.
//!
//! The player walks left and right with A and D. Stepping fully inside a
//! teleporter switches the driver to the teleporter's target level and puts
//! the player back at the start position of the level it left.
//!
//! | level     | teleporter | at          | leads to  |
//! |-----------|------------|-------------|-----------|
//! | `level_1` | red        | (1570, 930) | `level_2` |
//! | `level_2` | green      | (1570, 930) | `level_3` |
//! | `level_2` | purple     | (200, 930)  | `level_1` |
//! | `level_3` | orange     | (200, 930)  | `level_2` |

use tessel_ecs::prelude::*;
use tracing::debug;

use crate::config::FrameConfig;
use crate::driver::FrameDriver;
use crate::input::{FrameInput, InputEvent, Key};
use crate::render::{IMAGE, POSITION};
use crate::EngineError;

pub const LEVELS: [&str; 3] = ["level_1", "level_2", "level_3"];

const SIZE: &str = "size";
const SPEED: &str = "speed";
const VELOCITY: &str = "velocity";
const COLLIDER: &str = "collider";
const COLLIDABLE: &str = "collidable";
const TRIGGER: &str = "trigger";
const TRANSITION: &str = "transition";

pub const PLAYER_START: Vec2 = Vec2::new(935.0, 1030.0);
pub const PLAYER_SIZE: f32 = 50.0;
/// Horizontal displacement per frame while a movement key is held.
pub const PLAYER_SPEED: f32 = 10.0;
pub const TELEPORTER_SIZE: f32 = 150.0;

pub const PLAYER_IMAGE: u32 = 100;

/// Teleporter colours, used as image ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Colour {
    Red = 101,
    Green = 102,
    Purple = 103,
    Orange = 104,
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// State shared by the level systems: the pending world switch.
#[derive(Debug, Clone, Default)]
pub struct LevelState {
    pending: Option<String>,
    /// Teleports taken so far.
    pub transitions: u32,
}

impl LevelState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for `level` to become active once the current pass completes.
    pub fn request(&mut self, level: impl Into<String>) {
        self.pending = Some(level.into());
    }
}

impl WorldSelector for LevelState {
    fn take_transition(&mut self) -> Option<String> {
        let target = self.pending.take()?;
        self.transitions += 1;
        Some(target)
    }
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

pub fn spawn_player(store: &mut ComponentStore) -> EntityId {
    store.spawn([
        (POSITION, Component::from(PLAYER_START)),
        (SIZE, Component::from(Vec2::new(PLAYER_SIZE, PLAYER_SIZE))),
        (SPEED, Component::from(Vec2::new(PLAYER_SPEED, 0.0))),
        (VELOCITY, Component::from(Vec2::ZERO)),
        (COLLIDER, Component::from(true)),
        (
            IMAGE,
            Component::from(ImageHandle::new(PLAYER_IMAGE, PLAYER_SIZE as u32, PLAYER_SIZE as u32)),
        ),
    ])
}

pub fn spawn_teleporter(
    store: &mut ComponentStore,
    colour: Colour,
    position: Vec2,
    target: &str,
) -> EntityId {
    let side = TELEPORTER_SIZE as u32;
    store.spawn([
        (POSITION, Component::from(position)),
        (SIZE, Component::from(Vec2::new(TELEPORTER_SIZE, TELEPORTER_SIZE))),
        (TRIGGER, Component::from(false)),
        (TRANSITION, Component::from(target)),
        (COLLIDABLE, Component::from(true)),
        (IMAGE, Component::from(ImageHandle::new(colour as u32, side, side))),
    ])
}

/// Build one level world with its player, teleporters and systems.
pub fn level(name: &str) -> Result<World<LevelState, FrameInput>, EcsError> {
    let mut world = World::new(name);
    world.add_system_in(Phase::Input, "velocity", velocity_system)?;
    world.add_system("movement", movement_system)?;
    world.add_system_in(Phase::Mark, "collision", collision_system)?;
    world.add_system_after(Phase::React, "trigger", &["collision"], trigger_system)?;
    world.add_system_after(Phase::React, "transition", &["trigger"], transition_system)?;

    let store = world.store_mut();
    spawn_player(store);
    let right = Vec2::new(1570.0, 930.0);
    let left = Vec2::new(200.0, 930.0);
    match name {
        "level_1" => {
            spawn_teleporter(store, Colour::Red, right, "level_2");
        }
        "level_2" => {
            spawn_teleporter(store, Colour::Green, right, "level_3");
            spawn_teleporter(store, Colour::Purple, left, "level_1");
        }
        "level_3" => {
            spawn_teleporter(store, Colour::Orange, left, "level_2");
        }
        other => debug!(level = other, "level has no teleporters"),
    }
    Ok(world)
}

/// All three levels; `level_1` is active.
pub fn worlds() -> Result<Worlds<LevelState, FrameInput>, EcsError> {
    let mut worlds = Worlds::new();
    for name in LEVELS {
        worlds.insert(level(name)?)?;
    }
    Ok(worlds)
}

pub fn driver(config: &FrameConfig) -> Result<FrameDriver<LevelState>, EngineError> {
    FrameDriver::new(worlds()?, LevelState::new(), config)
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// A or D pressed sets the velocity to -/+ speed; releasing either stops.
fn velocity_system(
    store: &mut ComponentStore,
    input: &FrameInput,
    _state: &mut LevelState,
    _dt: f32,
) -> Result<(), EcsError> {
    for (entity, row) in store.query_mut([SPEED, VELOCITY]) {
        let Some([speed, velocity]) = row.into_array() else {
            continue;
        };
        let speed = speed.expect_vec2(entity, SPEED)?.x;
        let velocity = velocity.expect_vec2_mut(entity, VELOCITY)?;
        for event in &input.events {
            match event {
                InputEvent::KeyDown(Key::A) => velocity.x = -speed,
                InputEvent::KeyDown(Key::D) => velocity.x = speed,
                InputEvent::KeyUp(Key::A | Key::D) => velocity.x = 0.0,
                _ => {}
            }
        }
    }
    Ok(())
}

/// Per-frame displacement; the velocity is in pixels per frame, not per second.
fn movement_system(
    store: &mut ComponentStore,
    _input: &FrameInput,
    _state: &mut LevelState,
    _dt: f32,
) -> Result<(), EcsError> {
    for (entity, row) in store.query_mut([POSITION, VELOCITY]) {
        let Some([position, velocity]) = row.into_array() else {
            continue;
        };
        let velocity = *velocity.expect_vec2(entity, VELOCITY)?;
        *position.expect_vec2_mut(entity, POSITION)? += velocity;
    }
    Ok(())
}

fn bounds(entity: EntityId, row: &QueryRow<'_>) -> Result<Rect, EcsError> {
    let position = row.get(POSITION).ok_or_else(|| missing(entity, POSITION))?;
    let size = row.get(SIZE).ok_or_else(|| missing(entity, SIZE))?;
    Ok(Rect::from_pos_size(
        *position.expect_vec2(entity, POSITION)?,
        *size.expect_vec2(entity, SIZE)?,
    ))
}

fn missing(entity: EntityId, component: &str) -> EcsError {
    EcsError::MissingComponent {
        entity,
        component: component.to_owned(),
    }
}

/// Trigger every armed collidable that fully contains an armed collider.
fn collision_system(
    store: &mut ComponentStore,
    _input: &FrameInput,
    _state: &mut LevelState,
    _dt: f32,
) -> Result<(), EcsError> {
    let mut colliders = Vec::new();
    for (entity, row) in store.query([POSITION, SIZE, COLLIDER]).iter() {
        if row.get(COLLIDER).is_some_and(Component::is_set) {
            colliders.push(bounds(entity, row)?);
        }
    }

    let mut hit = Vec::new();
    for (entity, row) in store.query([POSITION, SIZE, TRIGGER, COLLIDABLE]).iter() {
        if !row.get(COLLIDABLE).is_some_and(Component::is_set) {
            continue;
        }
        let area = bounds(entity, row)?;
        if colliders.iter().any(|collider| area.contains_rect(collider)) {
            hit.push(entity);
        }
    }

    for entity in hit {
        store.add_component(entity, TRIGGER, true);
    }
    Ok(())
}

/// Disarm triggered entities that are both collider and collidable.
fn trigger_system(
    store: &mut ComponentStore,
    _input: &FrameInput,
    _state: &mut LevelState,
    _dt: f32,
) -> Result<(), EcsError> {
    for (entity, row) in store.query_mut([TRIGGER, COLLIDER, COLLIDABLE]) {
        let Some([trigger, collider, collidable]) = row.into_array() else {
            continue;
        };
        if *trigger.expect_flag(entity, TRIGGER)? {
            *collider.expect_flag_mut(entity, COLLIDER)? = false;
            *collidable.expect_flag_mut(entity, COLLIDABLE)? = false;
        }
    }
    Ok(())
}

/// Request the target level of a triggered teleporter, re-arm it, and send
/// the player back to the start.
fn transition_system(
    store: &mut ComponentStore,
    _input: &FrameInput,
    state: &mut LevelState,
    _dt: f32,
) -> Result<(), EcsError> {
    let mut fired = false;
    for (entity, row) in store.query_mut([TRIGGER, TRANSITION, POSITION]) {
        let Some([trigger, transition, _]) = row.into_array() else {
            continue;
        };
        let trigger = trigger.expect_flag_mut(entity, TRIGGER)?;
        if *trigger {
            state.request(transition.expect_label(entity, TRANSITION)?.clone());
            *trigger = false;
            fired = true;
        }
    }
    if !fired {
        return Ok(());
    }

    for (entity, row) in store.query_mut([POSITION, VELOCITY, COLLIDER]) {
        let Some([position, velocity, _]) = row.into_array() else {
            continue;
        };
        *position.expect_vec2_mut(entity, POSITION)? = PLAYER_START;
        *velocity.expect_vec2_mut(entity, VELOCITY)? = Vec2::ZERO;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 60.0;

    fn player_position(driver: &FrameDriver<LevelState>) -> Vec2 {
        let store = driver.active_store().unwrap();
        let (_, row) = store.query([POSITION, COLLIDER]).into_iter().next().unwrap();
        *row.get(POSITION).unwrap().as_vec2().unwrap()
    }

    /// Hold D until the active world changes. Returns the frames taken.
    fn walk_right_until_transition(driver: &mut FrameDriver<LevelState>) -> u32 {
        let start = driver.active_world().unwrap().to_owned();
        driver.step(DT, vec![InputEvent::KeyDown(Key::D)]).unwrap();
        let mut frames = 1;
        while driver.active_world() == Some(start.as_str()) {
            driver.step(DT, Vec::new()).unwrap();
            frames += 1;
            assert!(frames < 500, "never reached a teleporter");
        }
        frames
    }

    #[test]
    fn every_level_has_a_player_and_its_teleporters() {
        let worlds = worlds().unwrap();
        assert_eq!(worlds.names().collect::<Vec<_>>(), LEVELS.to_vec());
        assert_eq!(worlds.active_name(), Some("level_1"));

        let teleporters = |name: &str| worlds.get(name).unwrap().store().count_with(TRANSITION);
        assert_eq!(teleporters("level_1"), 1);
        assert_eq!(teleporters("level_2"), 2);
        assert_eq!(teleporters("level_3"), 1);
        for name in LEVELS {
            assert_eq!(worlds.get(name).unwrap().store().count_with(COLLIDER), 1);
        }
    }

    #[test]
    fn keys_drive_velocity() {
        let mut driver = driver(&FrameConfig::default()).unwrap();
        driver.step(DT, vec![InputEvent::KeyDown(Key::D)]).unwrap();
        assert_eq!(player_position(&driver), Vec2::new(945.0, 1030.0));
        driver.step(DT, Vec::new()).unwrap();
        assert_eq!(player_position(&driver), Vec2::new(955.0, 1030.0));

        driver.step(DT, vec![InputEvent::KeyDown(Key::A)]).unwrap();
        assert_eq!(player_position(&driver), Vec2::new(945.0, 1030.0));
        driver.step(DT, vec![InputEvent::KeyUp(Key::A)]).unwrap();
        driver.step(DT, Vec::new()).unwrap();
        assert_eq!(player_position(&driver), Vec2::new(945.0, 1030.0));
    }

    #[test]
    fn teleporter_switches_level_and_resets_player() {
        let mut driver = driver(&FrameConfig::default()).unwrap();
        walk_right_until_transition(&mut driver);

        assert_eq!(driver.active_world(), Some("level_2"));
        assert_eq!(driver.state().transitions, 1);

        // The level we left has its player back at the start, standing still
        // and its teleporter re-armed.
        let left = driver.worlds().get("level_1").unwrap().store();
        for (_, row) in left.query([POSITION, VELOCITY]).iter() {
            assert_eq!(row.get(POSITION), Some(&Component::from(PLAYER_START)));
            assert_eq!(row.get(VELOCITY), Some(&Component::from(Vec2::ZERO)));
        }
        for (_, row) in left.query([TRIGGER]).iter() {
            assert_eq!(row.get(TRIGGER), Some(&Component::Flag(false)));
        }
        assert_eq!(player_position(&driver), PLAYER_START);
    }

    #[test]
    fn collision_needs_full_containment() {
        let mut store = ComponentStore::new();
        let player = spawn_player(&mut store);
        let teleporter = spawn_teleporter(&mut store, Colour::Red, Vec2::new(1570.0, 930.0), "x");
        let mut state = LevelState::new();
        let input = FrameInput::default();

        // Overlapping the left edge is not enough.
        store.add_component(player, POSITION, Vec2::new(1550.0, 1030.0));
        collision_system(&mut store, &input, &mut state, 0.0).unwrap();
        assert_eq!(store.get(teleporter, TRIGGER), Some(&Component::Flag(false)));

        store.add_component(player, POSITION, Vec2::new(1570.0, 1030.0));
        collision_system(&mut store, &input, &mut state, 0.0).unwrap();
        assert_eq!(store.get(teleporter, TRIGGER), Some(&Component::Flag(true)));

        transition_system(&mut store, &input, &mut state, 0.0).unwrap();
        assert_eq!(state.take_transition().as_deref(), Some("x"));
        assert_eq!(store.get(player, POSITION), Some(&Component::from(PLAYER_START)));
    }

    #[test]
    fn disarmed_collider_triggers_nothing() {
        let mut store = ComponentStore::new();
        let player = spawn_player(&mut store);
        let teleporter = spawn_teleporter(&mut store, Colour::Red, Vec2::new(900.0, 930.0), "x");
        store.add_component(player, COLLIDER, false);

        collision_system(&mut store, &FrameInput::default(), &mut LevelState::new(), 0.0).unwrap();
        assert_eq!(store.get(teleporter, TRIGGER), Some(&Component::Flag(false)));
    }

    #[test]
    fn trigger_disarms_entities_that_collide_both_ways() {
        let mut store = ComponentStore::new();
        let e = store.spawn([
            (TRIGGER, true),
            (COLLIDER, true),
            (COLLIDABLE, true),
        ]);
        trigger_system(&mut store, &FrameInput::default(), &mut LevelState::new(), 0.0).unwrap();
        assert_eq!(store.get(e, COLLIDER), Some(&Component::Flag(false)));
        assert_eq!(store.get(e, COLLIDABLE), Some(&Component::Flag(false)));
    }
}
