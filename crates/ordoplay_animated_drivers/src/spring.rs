// SPDX-License-Identifier: MIT OR Apache-2.0
//! Spring driver.
//!
//! Solves the damped harmonic oscillator in closed form from the time
//! accumulated since the spring was released, so the result does not drift
//! with frame rate.

use crate::config::SpringConfig;
use crate::driver::{nanos_to_millis, DriverPhase, LoopCounter};

/// Largest time step fed to the solver, in seconds
const MAX_DELTA_TIME_SEC: f64 = 0.064;

#[derive(Debug, Clone, Copy, Default)]
struct PhysicsState {
    position: f64,
    velocity: f64,
}

/// Drives a value with a damped spring towards `to_value`
#[derive(Debug, Clone)]
pub struct SpringDriver {
    stiffness: f64,
    damping: f64,
    mass: f64,
    initial_velocity: f64,
    end_value: f64,
    rest_speed_threshold: f64,
    rest_displacement_threshold: f64,
    overshoot_clamping: bool,
    max_duration_ms: Option<f64>,

    state: PhysicsState,
    start_value: f64,
    original_value: f64,
    started: bool,
    start_time_millis: i64,
    last_time_millis: i64,
    time_accumulator: f64,

    loops: LoopCounter,
    phase: DriverPhase,
}

impl SpringDriver {
    /// Create a driver from its config
    pub fn new(config: SpringConfig) -> Self {
        let mut driver = Self {
            stiffness: 0.0,
            damping: 0.0,
            mass: 1.0,
            initial_velocity: 0.0,
            end_value: 0.0,
            rest_speed_threshold: 0.0,
            rest_displacement_threshold: 0.0,
            overshoot_clamping: false,
            max_duration_ms: None,
            state: PhysicsState {
                position: 0.0,
                velocity: config.initial_velocity,
            },
            start_value: 0.0,
            original_value: 0.0,
            started: false,
            start_time_millis: 0,
            last_time_millis: 0,
            time_accumulator: 0.0,
            loops: LoopCounter::new(config.iterations),
            phase: DriverPhase::Pending,
        };
        driver.reset_config(config);
        driver
    }

    /// Retarget the spring.
    ///
    /// The velocity the spring currently has becomes its new initial
    /// velocity, so retargeting mid-flight stays continuous.
    pub fn reset_config(&mut self, config: SpringConfig) {
        self.stiffness = config.stiffness;
        self.damping = config.damping;
        self.mass = config.mass;
        self.initial_velocity = self.state.velocity;
        self.end_value = config.to_value;
        self.rest_speed_threshold = config.rest_speed_threshold;
        self.rest_displacement_threshold = config.rest_displacement_threshold;
        self.overshoot_clamping = config.overshoot_clamping;
        self.max_duration_ms = config.max_duration_ms;
        self.started = false;
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

    /// Current spring velocity, in units per second
    pub fn velocity(&self) -> f64 {
        self.state.velocity
    }

    /// Step the spring to `frame_time_nanos`, writing its position into `value`
    pub fn run_animation_step(&mut self, frame_time_nanos: i64, value: &mut f64) {
        if self.phase == DriverPhase::Finished {
            return;
        }

        let frame_time_millis = nanos_to_millis(frame_time_nanos);
        if !self.started {
            if self.loops.is_first() {
                self.original_value = *value;
            }
            self.start_value = *value;
            self.state.position = *value;
            self.start_time_millis = frame_time_millis;
            self.last_time_millis = frame_time_millis;
            self.time_accumulator = 0.0;
            self.started = true;
        }
        self.phase = DriverPhase::Running;

        self.advance((frame_time_millis - self.last_time_millis) as f64 / 1000.0);
        self.last_time_millis = frame_time_millis;

        if let Some(max_duration_ms) = self.max_duration_ms {
            if (frame_time_millis - self.start_time_millis) as f64 >= max_duration_ms {
                self.snap_to_end();
            }
        }

        *value = self.state.position;

        if self.is_at_rest() {
            if self.loops.advance() {
                self.started = false;
                *value = self.original_value;
            } else {
                self.phase = DriverPhase::Finished;
            }
        }
    }

    fn is_at_rest(&self) -> bool {
        self.state.velocity.abs() <= self.rest_speed_threshold
            && ((self.end_value - self.state.position).abs() <= self.rest_displacement_threshold
                || self.stiffness == 0.0)
    }

    fn is_overshooting(&self) -> bool {
        self.stiffness > 0.0
            && ((self.start_value < self.end_value && self.state.position > self.end_value)
                || (self.start_value > self.end_value && self.state.position < self.end_value))
    }

    /// Settle the spring where it should rest
    fn snap_to_end(&mut self) {
        if self.stiffness > 0.0 {
            self.start_value = self.end_value;
            self.state.position = self.end_value;
        } else {
            // Without a restoring force the spring rests wherever it is
            self.end_value = self.state.position;
            self.start_value = self.end_value;
        }
        self.state.velocity = 0.0;
    }

    fn advance(&mut self, real_delta_time: f64) {
        if self.is_at_rest() {
            return;
        }

        self.time_accumulator += real_delta_time.min(MAX_DELTA_TIME_SEC);

        let c = self.damping;
        let m = self.mass;
        let k = self.stiffness;
        let v0 = -self.initial_velocity;

        let zeta = c / (2.0 * (k * m).sqrt());
        let omega0 = (k / m).sqrt();
        let omega1 = omega0 * (1.0 - zeta * zeta).sqrt();
        let x0 = self.end_value - self.start_value;
        let t = self.time_accumulator;

        let (position, velocity) = if zeta < 1.0 {
            // Underdamped
            let envelope = (-zeta * omega0 * t).exp();
            let (sin, cos) = (omega1 * t).sin_cos();
            let a = (v0 + zeta * omega0 * x0) / omega1;
            let position = self.end_value - envelope * (a * sin + x0 * cos);
            let velocity = zeta * omega0 * envelope * (sin * a + x0 * cos)
                - envelope * (cos * (v0 + zeta * omega0 * x0) - omega1 * x0 * sin);
            (position, velocity)
        } else {
            // Critically damped; overdamped springs use the same envelope
            let envelope = (-omega0 * t).exp();
            let position = self.end_value - envelope * (x0 + (v0 + omega0 * x0) * t);
            let velocity = envelope * (v0 * (t * omega0 - 1.0) + t * x0 * omega0 * omega0);
            (position, velocity)
        };

        self.state.position = position;
        self.state.velocity = velocity;

        if self.is_at_rest() || (self.overshoot_clamping && self.is_overshooting()) {
            self.snap_to_end();
        }
    }
}
