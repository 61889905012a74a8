//! Tessel Engine -- frame driver, host seams and demos for [`tessel_ecs`].
//!
//! This crate turns a set of worlds into a running program: it clamps the
//! frame delta, folds host input into a per-frame snapshot, dispatches the
//! active world, and exposes drawing and audio through small traits the host
//! implements. No windowing or graphics API is linked; everything runs
//! headless.
//!
//! # Quick Start
//!
//! ```
//! use tessel_engine::demos::levels;
//! use tessel_engine::prelude::*;
//!
//! let config = FrameConfig::default();
//! let mut driver = levels::driver(&config).unwrap();
//!
//! driver.step(1.0 / 60.0, vec![InputEvent::KeyDown(Key::D)]).unwrap();
//! assert_eq!(driver.active_world(), Some("level_1"));
//!
//! let mut canvas = DrawList::new();
//! assert_eq!(driver.render(&mut canvas), 2);
//! ```

#![deny(unsafe_code)]

pub mod audio;
pub mod clock;
pub mod config;
pub mod demos;
pub mod driver;
pub mod input;
pub mod render;

/// Re-export the ECS crate for convenience.
pub use tessel_ecs;

use tessel_ecs::EcsError;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while configuring or driving the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The config parsed but holds values the driver cannot use.
    #[error("invalid frame config: {0}")]
    InvalidConfig(String),

    /// The config is not valid JSON for [`FrameConfig`](config::FrameConfig).
    #[error("failed to parse frame config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error(transparent)]
    Ecs(#[from] EcsError),
}

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Install a formatting subscriber filtered by `RUST_LOG`, defaulting to
/// `warn`. Hosts call this once at startup; calling it again is a no-op.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::audio::{AudioQueue, AudioSink, RecordingSink};
    pub use crate::clock::FrameClock;
    pub use crate::config::FrameConfig;
    pub use crate::driver::{FrameDriver, FrameOutcome};
    pub use crate::input::{FrameInput, InputEvent, InputSnapshot, Key, MouseButton};
    pub use crate::render::{draw_entities, Canvas, DrawCommand, DrawList};
    pub use crate::EngineError;
    pub use tessel_ecs::prelude::*;
}
