//! Frame delta clamping.

use crate::config::FrameConfig;

/// Turns raw elapsed time into the `dt` handed to systems.
///
/// Long stalls (a dragged window, a debugger pause) would otherwise produce
/// one huge step; the clock caps every step at `dt_max` seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    dt_max: f32,
    elapsed: f64,
}

impl FrameClock {
    pub fn new(config: &FrameConfig) -> Self {
        Self {
            dt_max: config.dt_max(),
            elapsed: 0.0,
        }
    }

    /// Clamp `raw_seconds` into `[0, dt_max]` and add it to the simulated time.
    ///
    /// Negative, NaN and infinite inputs count as zero.
    pub fn advance(&mut self, raw_seconds: f64) -> f32 {
        let dt = if raw_seconds.is_finite() && raw_seconds > 0.0 {
            (raw_seconds as f32).min(self.dt_max)
        } else {
            0.0
        };
        self.elapsed += f64::from(dt);
        dt
    }

    pub fn dt_max(&self) -> f32 {
        self.dt_max
    }

    /// Simulated seconds so far (sum of clamped deltas).
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}
