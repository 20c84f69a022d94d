// SPDX-License-Identifier: MIT OR Apache-2.0
//! Decay driver.
//!
//! Velocity shrinks by `deceleration` every millisecond, so the value
//! approaches `from + velocity / (1 - deceleration)` asymptotically. The
//! driver finishes once a frame moves the value by less than
//! [`MIN_FRAME_DELTA`].

use crate::config::DecayConfig;
use crate::driver::{nanos_to_millis, DriverPhase, LoopCounter};

/// Movement per frame under which the decay counts as stopped
pub const MIN_FRAME_DELTA: f64 = 0.1;

/// Assumed length of the frame before the first step, in milliseconds
const FIRST_FRAME_MILLIS: i64 = 16;

/// Drives a value with exponential slow-down
#[derive(Debug, Clone)]
pub struct DecayDriver {
    velocity: f64,
    deceleration: f64,
    start_frame_time_millis: Option<i64>,
    from_value: f64,
    last_value: f64,
    loops: LoopCounter,
    phase: DriverPhase,
}

impl DecayDriver {
    /// Create a driver from its config
    pub fn new(config: DecayConfig) -> Self {
        let mut driver = Self {
            velocity: 0.0,
            deceleration: 0.0,
            start_frame_time_millis: None,
            from_value: 0.0,
            last_value: 0.0,
            loops: LoopCounter::new(config.iterations),
            phase: DriverPhase::Pending,
        };
        driver.reset_config(config);
        driver
    }

    /// Replace velocity and deceleration and restart from the first loop
    pub fn reset_config(&mut self, config: DecayConfig) {
        self.velocity = config.velocity;
        self.deceleration = config.deceleration;
        self.start_frame_time_millis = None;
        self.from_value = 0.0;
        self.loops = LoopCounter::new(config.iterations);
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

    /// Value the decay converges to from `from_value`
    pub fn resting_value(&self, from_value: f64) -> f64 {
        from_value + self.velocity / (1.0 - self.deceleration)
    }

    /// Step the decay to `frame_time_nanos`, writing into `value`
    pub fn run_animation_step(&mut self, frame_time_nanos: i64, value: &mut f64) {
        if self.phase == DriverPhase::Finished {
            return;
        }

        let frame_time_millis = nanos_to_millis(frame_time_nanos);
        let start = match self.start_frame_time_millis {
            Some(start) => start,
            None => {
                // The first step counts as one frame in
                let start = frame_time_millis - FIRST_FRAME_MILLIS;
                self.start_frame_time_millis = Some(start);
                if self.loops.is_first() {
                    self.from_value = *value;
                } else {
                    *value = self.from_value;
                }
                self.last_value = *value;
                start
            }
        };
        self.phase = DriverPhase::Running;

        let retention = 1.0 - self.deceleration;
        let elapsed = (frame_time_millis - start) as f64;
        let next = self.from_value
            + self.velocity / retention * (1.0 - (-retention * elapsed).exp());

        if (self.last_value - next).abs() < MIN_FRAME_DELTA {
            if self.loops.advance() {
                self.start_frame_time_millis = None;
            } else {
                self.phase = DriverPhase::Finished;
                return;
            }
        }

        self.last_value = next;
        *value = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Iterations;
    use proptest::prelude::*;

    const FRAME_NANOS: i64 = 1_000_000_000 / 60;
    const START_NANOS: i64 = 14_599_233_201_256;

    fn config(velocity: f64, deceleration: f64, iterations: i32) -> DecayConfig {
        DecayConfig {
            velocity,
            deceleration,
            iterations: Iterations(iterations),
        }
    }

    fn run(driver: &mut DecayDriver, value: &mut f64, max_frames: usize) -> Vec<f64> {
        let mut values = Vec::new();
        let mut time = START_NANOS;
        for _ in 0..max_frames {
            time += FRAME_NANOS;
            driver.run_animation_step(time, value);
            values.push(*value);
            if driver.phase() == DriverPhase::Finished {
                break;
            }
        }
        values
    }

    #[test]
    fn test_first_step_moves_one_frame() {
        let mut driver = DecayDriver::new(config(0.5, 0.998, 1));
        let mut value = 0.0;
        driver.run_animation_step(START_NANOS, &mut value);

        let expected = 0.5 / 0.002 * (1.0 - (-0.002_f64 * 16.0).exp());
        assert!((value - expected).abs() < 1e-9);
        assert_eq!(driver.phase(), DriverPhase::Running);
    }

    #[test]
    fn test_decay_approaches_resting_value() {
        let mut driver = DecayDriver::new(config(0.5, 0.998, 1));
        let mut value = 10.0;
        run(&mut driver, &mut value, 10_000);

        assert_eq!(driver.phase(), DriverPhase::Finished);
        let resting = driver.resting_value(10.0);
        assert!(value < resting);
        assert!(resting - value < 60.0);
    }

    #[test]
    fn test_loops_restart_from_baseline() {
        let mut driver = DecayDriver::new(config(0.5, 0.99, 2));
        let mut value = 0.0;
        let values = run(&mut driver, &mut value, 10_000);

        assert_eq!(driver.phase(), DriverPhase::Finished);
        // The second loop starts over near the baseline
        let drops = values.windows(2).filter(|pair| pair[1] < pair[0]).count();
        assert_eq!(drops, 1);
    }

    #[test]
    fn test_zero_velocity_finishes_immediately() {
        let mut driver = DecayDriver::new(config(0.0, 0.998, 1));
        let mut value = 4.0;
        driver.run_animation_step(START_NANOS, &mut value);
        assert_eq!(driver.phase(), DriverPhase::Finished);
        assert_eq!(value, 4.0);
    }

    proptest! {
        #[test]
        fn prop_positive_velocity_never_reverses(
            velocity in 0.01f64..5.0,
            deceleration in 0.9f64..0.999,
            from in -100.0f64..100.0,
        ) {
            let mut driver = DecayDriver::new(config(velocity, deceleration, 1));
            let mut value = from;
            let values = run(&mut driver, &mut value, 20_000);

            prop_assert_eq!(driver.phase(), DriverPhase::Finished);
            for pair in values.windows(2) {
                prop_assert!(pair[1] >= pair[0]);
            }
            prop_assert!(value <= driver.resting_value(from));
        }
    }
}
