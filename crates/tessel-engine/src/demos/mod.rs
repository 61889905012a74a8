//! Demo programs built on the engine.
//!
//! Both run headless and deterministic: randomness comes from a seeded
//! [`rand_pcg::Pcg32`] and time only from the `dt` the driver hands out.

pub mod levels;
pub mod particles;
