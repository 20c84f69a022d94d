// SPDX-License-Identifier: MIT OR Apache-2.0
//! Driver configuration as sent by the host.
//!
//! Configs arrive as dynamic JSON-like maps with a `"type"` discriminator and
//! camelCase keys, e.g. `{"type": "spring", "stiffness": 230.2, "toValue": 1}`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error while building or reconfiguring a driver
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Config has no string `type` field
    #[error("Animation config is missing a \"type\" field")]
    MissingType,

    /// Unknown driver type name
    #[error("Unsupported animation type: {0}")]
    UnsupportedType(String),

    /// Config fields could not be read
    #[error("Invalid {driver} animation config: {source}")]
    InvalidConfig {
        /// Driver type name
        driver: &'static str,
        /// Underlying decoding error
        #[source]
        source: serde_json::Error,
    },

    /// Decay deceleration would divide by zero or grow without bound
    #[error("Invalid decay deceleration {0}: must be in (0, 1)")]
    InvalidDeceleration(f64),

    /// Spring mass must be positive
    #[error("Invalid spring mass {0}: must be positive")]
    InvalidMass(f64),
}

/// Result type for driver operations
pub type Result<T> = std::result::Result<T, DriverError>;

/// Driver kind, keyed by the config's `type` string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverType {
    /// Precomputed progress table
    Frames,
    /// Damped harmonic oscillator
    Spring,
    /// Exponential decay from an initial velocity
    Decay,
}

impl DriverType {
    /// Look up a driver type by its config name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "frames" => Some(Self::Frames),
            "spring" => Some(Self::Spring),
            "decay" => Some(Self::Decay),
            _ => None,
        }
    }

    /// Config name of this driver type
    pub fn name(&self) -> &'static str {
        match self {
            Self::Frames => "frames",
            Self::Spring => "spring",
            Self::Decay => "decay",
        }
    }
}

/// How many times an animation runs; `-1` loops forever, `0` never runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Iterations(pub i32);

impl Iterations {
    /// Loop forever
    pub const INFINITE: Self = Self(-1);

    /// Whether the animation never stops on its own
    pub fn is_infinite(self) -> bool {
        self.0 < 0
    }

    /// Whether the animation is finished before it starts
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl Default for Iterations {
    fn default() -> Self {
        Self(1)
    }
}

/// Frame table animation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FramesConfig {
    /// Progress values in `[0, 1]`, one per 60 fps frame
    pub frames: Vec<f64>,
    /// Value reached at progress 1
    #[serde(default)]
    pub to_value: f64,
    /// Loop count
    #[serde(default)]
    pub iterations: Iterations,
}

/// Spring animation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpringConfig {
    /// Spring constant `k`
    #[serde(default = "default_stiffness")]
    pub stiffness: f64,
    /// Damping coefficient `c`
    #[serde(default = "default_damping")]
    pub damping: f64,
    /// Mass `m`
    #[serde(default = "default_mass")]
    pub mass: f64,
    /// Velocity at start, in units per second
    #[serde(default)]
    pub initial_velocity: f64,
    /// Rest position
    #[serde(default)]
    pub to_value: f64,
    /// Speed under which the spring may come to rest
    #[serde(default = "default_rest_threshold")]
    pub rest_speed_threshold: f64,
    /// Distance from `to_value` under which the spring may come to rest
    #[serde(default = "default_rest_threshold")]
    pub rest_displacement_threshold: f64,
    /// Stop as soon as the spring passes `to_value`
    #[serde(default)]
    pub overshoot_clamping: bool,
    /// Loop count
    #[serde(default)]
    pub iterations: Iterations,
    /// Hard stop: snap to `to_value` after this many milliseconds
    #[serde(default)]
    pub max_duration_ms: Option<f64>,
}

fn default_stiffness() -> f64 {
    100.0
}

fn default_damping() -> f64 {
    10.0
}

fn default_mass() -> f64 {
    1.0
}

fn default_rest_threshold() -> f64 {
    0.001
}

/// Decay animation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecayConfig {
    /// Initial velocity, in units per millisecond
    pub velocity: f64,
    /// Per-millisecond velocity retention factor, in `(0, 1)`
    #[serde(default = "default_deceleration")]
    pub deceleration: f64,
    /// Loop count
    #[serde(default)]
    pub iterations: Iterations,
}

fn default_deceleration() -> f64 {
    0.998
}

/// Parsed driver configuration
#[derive(Debug, Clone, PartialEq)]
pub enum AnimationConfig {
    /// Frame table
    Frames(FramesConfig),
    /// Spring
    Spring(SpringConfig),
    /// Decay
    Decay(DecayConfig),
}

impl AnimationConfig {
    /// Parse a host config map
    pub fn from_value(config: &Value) -> Result<Self> {
        let type_name = config
            .get("type")
            .and_then(Value::as_str)
            .ok_or(DriverError::MissingType)?;
        let driver_type = DriverType::from_name(type_name)
            .ok_or_else(|| DriverError::UnsupportedType(type_name.to_string()))?;

        match driver_type {
            DriverType::Frames => Ok(Self::Frames(decode(driver_type, config)?)),
            DriverType::Spring => {
                let spring: SpringConfig = decode(driver_type, config)?;
                if spring.mass <= 0.0 {
                    return Err(DriverError::InvalidMass(spring.mass));
                }
                Ok(Self::Spring(spring))
            }
            DriverType::Decay => {
                let decay: DecayConfig = decode(driver_type, config)?;
                if !(decay.deceleration > 0.0 && decay.deceleration < 1.0) {
                    return Err(DriverError::InvalidDeceleration(decay.deceleration));
                }
                Ok(Self::Decay(decay))
            }
        }
    }

    /// Driver type of this config
    pub fn driver_type(&self) -> DriverType {
        match self {
            Self::Frames(_) => DriverType::Frames,
            Self::Spring(_) => DriverType::Spring,
            Self::Decay(_) => DriverType::Decay,
        }
    }
}

fn decode<T: DeserializeOwned>(driver_type: DriverType, config: &Value) -> Result<T> {
    T::deserialize(config).map_err(|source| DriverError::InvalidConfig {
        driver: driver_type.name(),
        source,
    })
}
