// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animation drivers for `OrdoPlay` Animated.
//!
//! A driver is a small state machine that advances one numeric value once per
//! rendered frame until it reaches a finished condition:
//! - Frame tables (precomputed progress curves sampled at 60 fps)
//! - Springs (closed-form damped harmonic oscillator)
//! - Decay (exponential slow-down from an initial velocity)
//!
//! ## Architecture
//!
//! Drivers know nothing about the node graph. They are handed the raw value
//! of their target on every step and write the new value back; the graph
//! engine owns identity, callbacks and propagation.

pub mod config;
pub mod decay;
pub mod driver;
pub mod frames;
pub mod spring;

pub use config::{
    AnimationConfig, DecayConfig, DriverError, DriverType, FramesConfig, Iterations, Result,
    SpringConfig,
};
pub use decay::DecayDriver;
pub use driver::{DriverModel, DriverPhase, LoopCounter, FRAME_TIME_MILLIS};
pub use frames::FrameDriver;
pub use spring::SpringDriver;
