// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame table driver.
//!
//! The host precomputes an easing curve as one progress value per 60 fps
//! frame. Each step picks the frame matching the elapsed time and maps its
//! progress onto `[from_value, to_value]`.

use crate::config::FramesConfig;
use crate::driver::{nanos_to_millis, DriverPhase, LoopCounter, FRAME_TIME_MILLIS};

/// Linear interpolation between two values
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Drives a value through a precomputed progress table
#[derive(Debug, Clone)]
pub struct FrameDriver {
    frames: Vec<f64>,
    to_value: f64,
    from_value: f64,
    start_frame_time_nanos: Option<i64>,
    loops: LoopCounter,
    phase: DriverPhase,
}

impl FrameDriver {
    /// Create a driver from its config
    pub fn new(config: FramesConfig) -> Self {
        let mut driver = Self {
            frames: Vec::new(),
            to_value: 0.0,
            from_value: 0.0,
            start_frame_time_nanos: None,
            loops: LoopCounter::new(config.iterations),
            phase: DriverPhase::Pending,
        };
        driver.reset_config(config);
        driver
    }

    /// Replace the table and restart from the first loop
    pub fn reset_config(&mut self, config: FramesConfig) {
        self.frames = config.frames;
        self.to_value = config.to_value;
        self.loops = LoopCounter::new(config.iterations);
        self.start_frame_time_nanos = None;
        self.phase = if self.loops.is_empty() {
            DriverPhase::Finished
        } else {
            DriverPhase::Pending
        };
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> DriverPhase {
        self.phase
    }

    /// Write the table value for `frame_time_nanos` into `value`
    pub fn run_animation_step(&mut self, frame_time_nanos: i64, value: &mut f64) {
        if self.phase == DriverPhase::Finished {
            return;
        }

        let start = match self.start_frame_time_nanos {
            Some(start) => start,
            None => {
                if self.loops.is_first() {
                    self.from_value = *value;
                }
                self.start_frame_time_nanos = Some(frame_time_nanos);
                frame_time_nanos
            }
        };
        self.phase = DriverPhase::Running;

        let elapsed_millis = nanos_to_millis(frame_time_nanos - start).max(0);
        let frame_index = (elapsed_millis as f64 / FRAME_TIME_MILLIS).round() as usize;

        // The last table entry is always exactly `to_value`
        *value = if frame_index + 1 >= self.frames.len() {
            if self.loops.advance() {
                self.start_frame_time_nanos = None;
            } else {
                self.phase = DriverPhase::Finished;
            }
            self.to_value
        } else {
            lerp(self.from_value, self.to_value, self.frames[frame_index])
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Iterations;

    const FRAME_NANOS: i64 = 1_000_000_000 / 60;
    const START_NANOS: i64 = 14_599_233_201_256;

    fn config(frames: &[f64], to_value: f64, iterations: i32) -> FramesConfig {
        FramesConfig {
            frames: frames.to_vec(),
            to_value,
            iterations: Iterations(iterations),
        }
    }

    #[test]
    fn test_walks_table_once() {
        let frames = [0.0, 0.2, 0.4, 0.6, 0.8, 1.0];
        let mut driver = FrameDriver::new(config(&frames, 1.0, 1));
        let mut value = 0.0;
        let mut time = START_NANOS;

        assert_eq!(driver.phase(), DriverPhase::Pending);
        for expected in frames {
            time += FRAME_NANOS;
            driver.run_animation_step(time, &mut value);
            assert_eq!(value, expected);
        }
        assert_eq!(driver.phase(), DriverPhase::Finished);
    }

    #[test]
    fn test_maps_progress_onto_range() {
        let mut driver = FrameDriver::new(config(&[0.0, 0.5, 1.0], 20.0, 1));
        let mut value = 10.0;
        driver.run_animation_step(START_NANOS, &mut value);
        assert_eq!(value, 10.0);
        driver.run_animation_step(START_NANOS + FRAME_NANOS, &mut value);
        assert_eq!(value, 15.0);
        driver.run_animation_step(START_NANOS + 2 * FRAME_NANOS, &mut value);
        assert_eq!(value, 20.0);
        assert_eq!(driver.phase(), DriverPhase::Finished);
    }

    #[test]
    fn test_loops_restart_from_original_value() {
        let frames = [0.0, 0.5, 1.0];
        let mut driver = FrameDriver::new(config(&frames, 1.0, 3));
        let mut value = 0.0;
        let mut time = START_NANOS;

        for _ in 0..3 {
            for expected in frames {
                time += FRAME_NANOS;
                driver.run_animation_step(time, &mut value);
                assert_eq!(value, expected);
            }
        }
        assert_eq!(driver.phase(), DriverPhase::Finished);
    }

    #[test]
    fn test_empty_table_jumps_to_end() {
        let mut driver = FrameDriver::new(config(&[], 7.0, 1));
        let mut value = 0.0;
        driver.run_animation_step(START_NANOS, &mut value);
        assert_eq!(value, 7.0);
        assert_eq!(driver.phase(), DriverPhase::Finished);
    }

    #[test]
    fn test_finished_driver_leaves_value_alone() {
        let mut driver = FrameDriver::new(config(&[0.0, 1.0], 1.0, 0));
        let mut value = 3.0;
        driver.run_animation_step(START_NANOS, &mut value);
        assert_eq!(value, 3.0);
    }
}
