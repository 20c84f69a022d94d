// SPDX-License-Identifier: MIT OR Apache-2.0
//! Driver dispatch and shared stepping state.

use crate::config::{AnimationConfig, DriverType, Iterations, Result};
use crate::decay::DecayDriver;
use crate::frames::FrameDriver;
use crate::spring::SpringDriver;
use serde_json::Value;

/// Duration of one frame of a frame table, in milliseconds
pub const FRAME_TIME_MILLIS: f64 = 1000.0 / 60.0;

/// Lifecycle of a driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriverPhase {
    /// Created, not stepped yet
    #[default]
    Pending,
    /// Stepped at least once, not finished
    Running,
    /// Reached its end condition
    Finished,
}

/// Tracks which loop of a repeating animation is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopCounter {
    iterations: Iterations,
    current: i32,
}

impl LoopCounter {
    /// Start at the first loop
    pub fn new(iterations: Iterations) -> Self {
        Self {
            iterations,
            current: 1,
        }
    }

    /// The loop currently running, starting at 1
    pub fn current(&self) -> i32 {
        self.current
    }

    /// Whether this is the first loop
    pub fn is_first(&self) -> bool {
        self.current == 1
    }

    /// Whether no loop should run at all
    pub fn is_empty(&self) -> bool {
        self.iterations.is_empty()
    }

    /// Move to the next loop; returns false once all loops are done
    pub fn advance(&mut self) -> bool {
        if self.iterations.is_infinite() || self.current < self.iterations.0 {
            self.current += 1;
            true
        } else {
            false
        }
    }
}

/// Convert a frame timestamp to whole milliseconds
pub(crate) fn nanos_to_millis(frame_time_nanos: i64) -> i64 {
    frame_time_nanos / 1_000_000
}

/// One of the supported driver models
#[derive(Debug, Clone)]
pub enum DriverModel {
    /// Frame table
    Frames(FrameDriver),
    /// Spring
    Spring(SpringDriver),
    /// Decay
    Decay(DecayDriver),
}

impl DriverModel {
    /// Build a driver from a host config map
    pub fn from_config(config: &Value) -> Result<Self> {
        Ok(Self::from_parsed(AnimationConfig::from_value(config)?))
    }

    /// Build a driver from an already parsed config
    pub fn from_parsed(config: AnimationConfig) -> Self {
        match config {
            AnimationConfig::Frames(frames) => Self::Frames(FrameDriver::new(frames)),
            AnimationConfig::Spring(spring) => Self::Spring(SpringDriver::new(spring)),
            AnimationConfig::Decay(decay) => Self::Decay(DecayDriver::new(decay)),
        }
    }

    /// Reconfigure a running driver in place.
    ///
    /// A config of the same type keeps the driver's simulation state (a
    /// spring keeps its velocity); a config of another type replaces the
    /// model.
    pub fn reset_config(&mut self, config: &Value) -> Result<()> {
        let parsed = AnimationConfig::from_value(config)?;
        match (self, parsed) {
            (Self::Frames(driver), AnimationConfig::Frames(frames)) => driver.reset_config(frames),
            (Self::Spring(driver), AnimationConfig::Spring(spring)) => driver.reset_config(spring),
            (Self::Decay(driver), AnimationConfig::Decay(decay)) => driver.reset_config(decay),
            (model, parsed) => {
                tracing::debug!(
                    "Replacing {} driver with {} driver",
                    model.driver_type().name(),
                    parsed.driver_type().name()
                );
                *model = Self::from_parsed(parsed);
            }
        }
        Ok(())
    }

    /// Advance the animation to `frame_time_nanos`, writing into `value`
    pub fn run_animation_step(&mut self, frame_time_nanos: i64, value: &mut f64) {
        match self {
            Self::Frames(driver) => driver.run_animation_step(frame_time_nanos, value),
            Self::Spring(driver) => driver.run_animation_step(frame_time_nanos, value),
            Self::Decay(driver) => driver.run_animation_step(frame_time_nanos, value),
        }
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> DriverPhase {
        match self {
            Self::Frames(driver) => driver.phase(),
            Self::Spring(driver) => driver.phase(),
            Self::Decay(driver) => driver.phase(),
        }
    }

    /// Whether the driver reached its end condition
    pub fn has_finished(&self) -> bool {
        self.phase() == DriverPhase::Finished
    }

    /// Driver type
    pub fn driver_type(&self) -> DriverType {
        match self {
            Self::Frames(_) => DriverType::Frames,
            Self::Spring(_) => DriverType::Spring,
            Self::Decay(_) => DriverType::Decay,
        }
    }
}
