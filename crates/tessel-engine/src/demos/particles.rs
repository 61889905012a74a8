//! Particles: squares that bounce around the display and burst into
//! shrapnel when their lifetime runs out.
//!
//! Holding the left mouse button spawns squares at the pointer. Each square
//! flies off at a random heading, reflects off the display edges, and
//! explodes with a sound when its countdown goes cold. Shrapnel flies freely
//! and disappears after a fraction of a second.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use tessel_ecs::prelude::*;

use crate::audio::AudioQueue;
use crate::config::FrameConfig;
use crate::driver::FrameDriver;
use crate::input::{FrameInput, MouseButton};
use crate::render::{IMAGE, POSITION};
use crate::EngineError;

/// Name of the only world in this demo.
pub const WORLD: &str = "particles";

const SPEED: &str = "speed";
const BOUNDARY: &str = "boundary";
const LIFETIME: &str = "lifetime";
const EXPLODE: &str = "explode";
const AUDIO: &str = "audio";
const DEAD: &str = "dead";

/// Square speed in pixels per second.
pub const SQUARE_SPEED: f32 = 100.0;
/// Top shrapnel speed in pixels per second; each piece gets 50-100% of it.
pub const SHRAPNEL_SPEED: f32 = 500.0;
pub const SQUARES_PER_FRAME: usize = 5;
pub const SHRAPNEL_PER_EXPLOSION: usize = 5;
pub const SQUARE_SIZE: u32 = 16;
pub const SHRAPNEL_SIZE: u32 = 8;
/// Number of distinct square colours; image ids run from 1 to this.
pub const PALETTE_SIZE: u32 = 64;
/// Image id used by every shrapnel piece.
pub const SHRAPNEL_IMAGE: u32 = 0;
pub const EXPLOSION_SOUND: SoundHandle = SoundHandle(1);

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// State shared by the particle systems.
#[derive(Debug, Clone)]
pub struct ParticleState {
    rng: Pcg32,
    boundary: Rect,
    /// Explosion sounds waiting for the host to play them.
    pub audio: AudioQueue,
    /// Squares spawned so far.
    pub spawned: u64,
    /// Explosions so far.
    pub explosions: u64,
}

impl ParticleState {
    pub fn new(config: &FrameConfig) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(config.seed),
            boundary: Rect::new(
                0.0,
                0.0,
                config.display_width as f32,
                config.display_height as f32,
            ),
            audio: AudioQueue::new(),
            spawned: 0,
            explosions: 0,
        }
    }

    pub fn boundary(&self) -> Rect {
        self.boundary
    }

    fn random_heading(&mut self) -> Vec2 {
        Vec2::from_angle_degrees(self.rng.gen::<f32>() * 360.0)
    }
}

impl WorldSelector for ParticleState {
    fn take_transition(&mut self) -> Option<String> {
        None
    }
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

/// Build the particle world with its systems registered.
pub fn world() -> Result<World<ParticleState, FrameInput>, EcsError> {
    let mut world = World::new(WORLD);
    world.add_system_in(Phase::Input, "spawn", spawn_system)?;
    world.add_system("speed", speed_system)?;
    world.add_system_after(Phase::Simulate, "boundary", &["speed"], boundary_system)?;
    world.add_system_in(Phase::Mark, "lifetime", lifetime_system)?;
    world.add_system_after(Phase::React, "explode", &["lifetime"], explode_system)?;
    world.add_system_after(Phase::Sweep, "dead", &["lifetime", "explode"], dead_system)?;
    Ok(world)
}

/// A driver running the particle world.
pub fn driver(config: &FrameConfig) -> Result<FrameDriver<ParticleState>, EngineError> {
    let mut worlds = Worlds::new();
    worlds.insert(world()?)?;
    FrameDriver::new(worlds, ParticleState::new(config), config)
}

/// Add one square at `position` and return its id.
pub fn spawn_square(
    store: &mut ComponentStore,
    state: &mut ParticleState,
    position: Vec2,
) -> EntityId {
    let speed = state.random_heading() * SQUARE_SPEED;
    let image = ImageHandle::new(
        state.rng.gen_range(1..=PALETTE_SIZE),
        SQUARE_SIZE,
        SQUARE_SIZE,
    );
    let lifetime = Countdown::new(state.rng.gen_range(3.0..6.0));
    state.spawned += 1;
    store.spawn([
        (POSITION, Component::from(position)),
        (SPEED, Component::from(speed)),
        (IMAGE, Component::from(image)),
        (BOUNDARY, Component::from(state.boundary)),
        (LIFETIME, Component::from(lifetime)),
        (EXPLODE, Component::from(true)),
        (AUDIO, Component::from(EXPLOSION_SOUND)),
    ])
}

fn spawn_shrapnel(store: &mut ComponentStore, state: &mut ParticleState, position: Vec2) {
    let speed = state.random_heading() * (SHRAPNEL_SPEED * state.rng.gen_range(0.5..1.0));
    let lifetime = Countdown::new(state.rng.gen_range(0.1..0.3));
    store.spawn([
        (POSITION, Component::from(position)),
        (SPEED, Component::from(speed)),
        (
            IMAGE,
            Component::from(ImageHandle::new(SHRAPNEL_IMAGE, SHRAPNEL_SIZE, SHRAPNEL_SIZE)),
        ),
        (LIFETIME, Component::from(lifetime)),
    ]);
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

fn spawn_system(
    store: &mut ComponentStore,
    input: &FrameInput,
    state: &mut ParticleState,
    _dt: f32,
) -> Result<(), EcsError> {
    if !input.snapshot.is_button_down(MouseButton::Left) {
        return Ok(());
    }
    let position = input.snapshot.mouse_position();
    for _ in 0..SQUARES_PER_FRAME {
        spawn_square(store, state, position);
    }
    Ok(())
}

fn speed_system(
    store: &mut ComponentStore,
    _input: &FrameInput,
    _state: &mut ParticleState,
    dt: f32,
) -> Result<(), EcsError> {
    for (entity, row) in store.query_mut([POSITION, SPEED]) {
        let Some([position, speed]) = row.into_array() else {
            continue;
        };
        let speed = *speed.expect_vec2(entity, SPEED)?;
        *position.expect_vec2_mut(entity, POSITION)? += speed * dt;
    }
    Ok(())
}

/// Reverse a speed component when the image has left `0 < p < edge - size`.
fn boundary_system(
    store: &mut ComponentStore,
    _input: &FrameInput,
    _state: &mut ParticleState,
    _dt: f32,
) -> Result<(), EcsError> {
    for (entity, row) in store.query_mut([POSITION, SPEED, BOUNDARY, IMAGE]) {
        let Some([position, speed, boundary, image]) = row.into_array() else {
            continue;
        };
        let position = *position.expect_vec2(entity, POSITION)?;
        let boundary = *boundary.expect_rect(entity, BOUNDARY)?;
        let size = image.expect_image(entity, IMAGE)?.size();
        let speed = speed.expect_vec2_mut(entity, SPEED)?;

        if !(0.0 < position.x && position.x < boundary.width - size.x) {
            speed.x = -speed.x;
        }
        if !(0.0 < position.y && position.y < boundary.height - size.y) {
            speed.y = -speed.y;
        }
    }
    Ok(())
}

fn lifetime_system(
    store: &mut ComponentStore,
    _input: &FrameInput,
    _state: &mut ParticleState,
    dt: f32,
) -> Result<(), EcsError> {
    let mut expired = Vec::new();
    for (entity, row) in store.query_mut([LIFETIME]) {
        let Some([lifetime]) = row.into_array() else {
            continue;
        };
        let lifetime = lifetime.expect_countdown_mut(entity, LIFETIME)?;
        lifetime.tick(dt);
        if lifetime.is_cold() {
            expired.push(entity);
        }
    }
    for entity in expired {
        store.add_component(entity, DEAD, true);
    }
    Ok(())
}

/// Dead squares burst into shrapnel and queue their sound. The shrapnel is
/// new this frame and carries no `dead` flag, so the sweep leaves it alone.
fn explode_system(
    store: &mut ComponentStore,
    _input: &FrameInput,
    state: &mut ParticleState,
    _dt: f32,
) -> Result<(), EcsError> {
    let mut bursts = Vec::new();
    for (entity, row) in store.query([POSITION, DEAD, EXPLODE, AUDIO]) {
        let Some([position, _, _, audio]) = row.to_array() else {
            continue;
        };
        bursts.push((
            *position.expect_vec2(entity, POSITION)?,
            *audio.expect_sound(entity, AUDIO)?,
        ));
    }
    for (position, sound) in bursts {
        for _ in 0..SHRAPNEL_PER_EXPLOSION {
            spawn_shrapnel(store, state, position);
        }
        state.audio.push(sound);
        state.explosions += 1;
    }
    Ok(())
}

fn dead_system(
    store: &mut ComponentStore,
    _input: &FrameInput,
    _state: &mut ParticleState,
    _dt: f32,
) -> Result<(), EcsError> {
    for entity in store.query_entities([DEAD]) {
        store.remove_entity(entity);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::FrameOutcome;
    use crate::input::InputEvent;

    const DT: f64 = 1.0 / 60.0;

    fn press_at(x: f32, y: f32) -> Vec<InputEvent> {
        vec![
            InputEvent::MouseMotion(Vec2::new(x, y)),
            InputEvent::MouseButtonDown(MouseButton::Left),
        ]
    }

    fn active(driver: &FrameDriver<ParticleState>) -> &ComponentStore {
        driver.active_store().unwrap()
    }

    #[test]
    fn holding_the_button_spawns_five_per_frame() {
        let mut driver = driver(&FrameConfig::default()).unwrap();
        driver.step(DT, press_at(500.0, 500.0)).unwrap();
        assert_eq!(active(&driver).count_with(EXPLODE), 5);
        driver.step(DT, Vec::new()).unwrap();
        assert_eq!(active(&driver).count_with(EXPLODE), 10);

        driver
            .step(DT, vec![InputEvent::MouseButtonUp(MouseButton::Left)])
            .unwrap();
        assert_eq!(active(&driver).count_with(EXPLODE), 10);
        assert_eq!(driver.state().spawned, 10);
    }

    #[test]
    fn squares_move_at_square_speed() {
        let mut driver = driver(&FrameConfig::default()).unwrap();
        driver.step(0.0, press_at(500.0, 500.0)).unwrap();
        driver
            .step(0.5, vec![InputEvent::MouseButtonUp(MouseButton::Left)])
            .unwrap();
        // dt is clamped to 3/60 s.
        let travelled = SQUARE_SPEED * 0.05;
        for (entity, row) in active(&driver).query([POSITION]) {
            let position = *row.get(POSITION).unwrap().as_vec2().unwrap();
            let moved = (position - Vec2::new(500.0, 500.0)).length();
            assert!((moved - travelled).abs() < 1e-3, "{entity} moved {moved}");
        }
    }

    #[test]
    fn boundary_reflects_outside_squares() {
        let config = FrameConfig::default();
        let mut state = ParticleState::new(&config);
        let mut store = ComponentStore::new();
        let inside = spawn_square(&mut store, &mut state, Vec2::new(100.0, 100.0));
        let past_right = spawn_square(&mut store, &mut state, Vec2::new(1910.0, 100.0));
        let before = |store: &ComponentStore, e| *store.get(e, SPEED).unwrap().as_vec2().unwrap();
        let inside_speed = before(&store, inside);
        let right_speed = before(&store, past_right);

        boundary_system(&mut store, &FrameInput::default(), &mut state, 0.0).unwrap();

        assert_eq!(before(&store, inside), inside_speed);
        let reflected = before(&store, past_right);
        assert_eq!(reflected.x, -right_speed.x);
        assert_eq!(reflected.y, right_speed.y);
    }

    #[test]
    fn expired_square_explodes_and_is_swept_in_one_frame() {
        let config = FrameConfig::default();
        let mut driver = driver(&config).unwrap();
        let mut state = ParticleState::new(&config);
        let mut store = ComponentStore::new();
        let square = spawn_square(&mut store, &mut state, Vec2::new(300.0, 300.0));
        store.add_component(square, LIFETIME, Countdown::new(0.01));
        // Keep the square still so the burst point is known: speed runs
        // before explode, and shrapnel starts where the square ends the frame.
        store.add_component(square, SPEED, Vec2::ZERO);
        *driver.state_mut() = state;
        *driver.worlds_mut().get_mut(WORLD).unwrap().store_mut() = store;

        let FrameOutcome::Continue(report) = driver.step(DT, Vec::new()).unwrap() else {
            panic!("no quit event was sent");
        };
        assert!(report.is_clean());

        let store = active(&driver);
        assert!(!store.contains_entity(square));
        assert_eq!(store.entity_count(), SHRAPNEL_PER_EXPLOSION);
        assert_eq!(store.count_with(DEAD), 0);
        for (_, row) in store.query([IMAGE, POSITION]) {
            let image = row.get(IMAGE).unwrap().as_image().unwrap();
            assert_eq!(image.id, SHRAPNEL_IMAGE);
            assert_eq!(*row.get(POSITION).unwrap().as_vec2().unwrap(), Vec2::new(300.0, 300.0));
        }
        assert_eq!(driver.state().audio.len(), 1);
        assert_eq!(driver.state().explosions, 1);
    }

    #[test]
    fn shrapnel_starts_where_the_moving_square_ended_the_frame() {
        let config = FrameConfig::default();
        let mut driver = driver(&config).unwrap();
        let mut state = ParticleState::new(&config);
        let mut store = ComponentStore::new();
        let square = spawn_square(&mut store, &mut state, Vec2::new(300.0, 300.0));
        store.add_component(square, LIFETIME, Countdown::new(0.01));
        store.add_component(square, SPEED, Vec2::new(60.0, 0.0));
        *driver.state_mut() = state;
        *driver.worlds_mut().get_mut(WORLD).unwrap().store_mut() = store;

        driver.step(DT, Vec::new()).unwrap();

        let store = active(&driver);
        assert_eq!(store.query([POSITION]).len(), SHRAPNEL_PER_EXPLOSION);
        for (_, row) in store.query([POSITION]) {
            let position = *row.get(POSITION).unwrap().as_vec2().unwrap();
            assert!((position.x - 301.0).abs() < 1e-3, "burst at {position:?}");
            assert_eq!(position.y, 300.0);
        }
    }

    #[test]
    fn shrapnel_is_short_lived_and_silent() {
        let config = FrameConfig::default();
        let mut state = ParticleState::new(&config);
        let mut store = ComponentStore::new();
        spawn_shrapnel(&mut store, &mut state, Vec2::ZERO);

        let (entity, row) = store.query([LIFETIME, SPEED]).into_iter().next().unwrap();
        let lifetime = row.get(LIFETIME).unwrap().as_countdown().unwrap();
        assert!((0.1..0.3).contains(&lifetime.duration()));
        let speed = row.get(SPEED).unwrap().as_vec2().unwrap().length();
        assert!((SHRAPNEL_SPEED * 0.5 - 1e-3..=SHRAPNEL_SPEED + 1e-3).contains(&speed));
        assert!(!store.has_component(entity, EXPLODE));
        assert!(!store.has_component(entity, AUDIO));
    }
}
