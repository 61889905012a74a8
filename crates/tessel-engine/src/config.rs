//! Host frame configuration.

use serde::{Deserialize, Serialize};

use crate::EngineError;

// ---------------------------------------------------------------------------
// FrameConfig
// ---------------------------------------------------------------------------

/// Default seed for the demos' random number generators.
pub const DEFAULT_SEED: u64 = 0x7e55_e1_5eed;

/// Configuration for the frame driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Frames per second the host aims for.
    pub target_fps: u32,
    /// Upper bound on the frame delta, in frames at `target_fps`.
    pub max_frames_per_step: u32,
    /// World to activate at startup. `None` keeps the first world added.
    pub initial_world: Option<String>,
    /// Seed for anything random in the running simulation.
    pub seed: u64,
    /// Display size in pixels, used as the movement boundary by the demos.
    pub display_width: u32,
    pub display_height: u32,
}

impl Default for FrameConfig {
    /// 60 Hz, at most three frames per step, 1920x1080.
    fn default() -> Self {
        Self {
            target_fps: 60,
            max_frames_per_step: 3,
            initial_world: None,
            seed: DEFAULT_SEED,
            display_width: 1920,
            display_height: 1080,
        }
    }
}

impl FrameConfig {
    /// Parse a config from JSON. Missing fields take their default value.
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the driver cannot work with.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.target_fps == 0 {
            return Err(EngineError::InvalidConfig(
                "target_fps must be positive".to_owned(),
            ));
        }
        if self.max_frames_per_step == 0 {
            return Err(EngineError::InvalidConfig(
                "max_frames_per_step must be positive".to_owned(),
            ));
        }
        if self.display_width == 0 || self.display_height == 0 {
            return Err(EngineError::InvalidConfig(format!(
                "display size {}x{} is empty",
                self.display_width, self.display_height
            )));
        }
        Ok(())
    }

    /// Largest delta time handed to systems, in seconds.
    pub fn dt_max(&self) -> f32 {
        self.max_frames_per_step as f32 / self.target_fps as f32
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
