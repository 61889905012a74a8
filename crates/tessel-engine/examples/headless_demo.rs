//! Headless run of both demos with scripted input.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example headless_demo -p tessel-engine
//!
//! An optional argument names a JSON file holding a `FrameConfig`.

use anyhow::Context;
use tessel_engine::demos::{levels, particles};
use tessel_engine::prelude::*;

const FRAMES: usize = 600;

fn load_config() -> anyhow::Result<FrameConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config from {path}"))?;
            Ok(FrameConfig::from_json_str(&json)?)
        }
        None => Ok(FrameConfig::default()),
    }
}

fn run_particles(config: &FrameConfig) -> anyhow::Result<()> {
    let mut driver = particles::driver(config)?;
    let mut canvas = DrawList::new();
    let mut sink = RecordingSink::default();
    let frame_dt = 1.0 / f64::from(config.target_fps);

    for frame in 0..FRAMES {
        let events = match frame {
            0 => vec![
                InputEvent::MouseMotion(Vec2::new(960.0, 540.0)),
                InputEvent::MouseButtonDown(MouseButton::Left),
            ],
            30 => vec![InputEvent::MouseButtonUp(MouseButton::Left)],
            _ => Vec::new(),
        };
        if driver.step(frame_dt, events)?.is_quit() {
            break;
        }
        driver.render(&mut canvas);
        driver.state_mut().audio.drain_into(&mut sink);
    }

    let store = driver.active_store().context("particle world missing")?;
    println!(
        "particles: {} frames, {} squares spawned, {} explosions, {} sounds, {} entities left",
        driver.frame_count(),
        driver.state().spawned,
        driver.state().explosions,
        sink.played.len(),
        store.entity_count(),
    );
    Ok(())
}

fn run_levels(config: &FrameConfig) -> anyhow::Result<()> {
    let mut driver = levels::driver(config)?;
    let frame_dt = 1.0 / f64::from(config.target_fps);

    for frame in 0..FRAMES {
        let events = match frame {
            0 => vec![InputEvent::KeyDown(Key::D)],
            // Let go once the player is in level_2 and start walking back.
            120 => vec![InputEvent::KeyUp(Key::D), InputEvent::KeyDown(Key::A)],
            599 => vec![InputEvent::Quit],
            _ => Vec::new(),
        };
        match driver.step(frame_dt, events)? {
            FrameOutcome::Quit => break,
            FrameOutcome::Continue(report) => {
                if let Some(world) = report.transition {
                    println!("levels: frame {frame} -> {world}");
                }
            }
        }
    }

    println!(
        "levels: {} transitions, ended in {}",
        driver.state().transitions,
        driver.active_world().unwrap_or("<none>"),
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tessel_engine::init_tracing();
    let config = load_config()?;
    run_particles(&config)?;
    run_levels(&config)?;
    Ok(())
}
