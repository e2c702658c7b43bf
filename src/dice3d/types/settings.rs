//! Engine settings and persistence
//!
//! Settings are plain JSON. Every field has a default so partial files load;
//! `validate` rejects values the simulation cannot work with.

use std::fs;
use std::path::Path;

use bevy::log::{info, warn};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::error::DiceError;

/// Closed play area: floor plus four vertical walls, centered on the origin
/// in X/Z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaBounds {
    pub half_width: f32,
    pub half_depth: f32,
    pub floor_y: f32,
    pub wall_height: f32,
}

impl Default for ArenaBounds {
    fn default() -> Self {
        // 14 x 10 table.
        Self {
            half_width: 7.0,
            half_depth: 5.0,
            floor_y: 0.0,
            wall_height: 8.0,
        }
    }
}

impl ArenaBounds {
    pub fn top_y(&self) -> f32 {
        self.floor_y + self.wall_height
    }

    /// Whether a point lies inside the X/Z footprint and above the floor.
    pub fn contains(&self, point: Vec3) -> bool {
        point.x.abs() <= self.half_width
            && point.z.abs() <= self.half_depth
            && point.y >= self.floor_y
    }
}

/// Settle detection and the maximum-duration safeguard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlePolicy {
    /// Linear speed below which a die counts as calm.
    pub linear_threshold: f32,
    /// Angular speed below which a die counts as calm.
    pub angular_threshold: f32,
    /// Consecutive calm ticks required before a die settles. `1` settles on
    /// the first calm sample.
    pub window_ticks: u32,
    /// Ticks after which a die still rolling is force-resolved.
    pub max_roll_ticks: u32,
}

impl Default for SettlePolicy {
    fn default() -> Self {
        Self {
            linear_threshold: 0.05,
            angular_threshold: 0.05,
            window_ticks: 10,
            // 15 seconds at 60 Hz
            max_roll_ticks: 900,
        }
    }
}

/// Launch parameters for newly spawned dice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchSettings {
    pub origin: [f32; 3],
    /// Horizontal velocity components are drawn from `[-speed, speed)`.
    pub horizontal_speed: f32,
    pub lift_min: f32,
    pub lift_max: f32,
    /// Upper bound of the spin magnitude on each axis.
    pub spin: f32,
    /// Lower bound of the spin magnitude on each axis, so no axis is still.
    pub min_spin: f32,
    /// X offset between lanes when several dice launch in one frame.
    pub lane_spacing: f32,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self {
            origin: [0.0, 3.0, 0.0],
            horizontal_speed: 5.0,
            lift_min: 6.0,
            lift_max: 9.0,
            spin: 5.0,
            min_spin: 0.5,
            lane_spacing: 1.5,
        }
    }
}

impl LaunchSettings {
    pub fn origin(&self) -> Vec3 {
        Vec3::from_array(self.origin)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
pub struct EngineSettings {
    #[serde(default)]
    pub arena: ArenaBounds,

    #[serde(default)]
    pub settle: SettlePolicy,

    #[serde(default)]
    pub launch: LaunchSettings,

    #[serde(default = "default_gravity")]
    pub gravity: f32,

    #[serde(default = "default_fixed_timestep")]
    pub fixed_timestep: f32,

    /// Fixed seed for reproducible sessions; entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_gravity() -> f32 {
    9.82
}

fn default_fixed_timestep() -> f32 {
    1.0 / 60.0
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            arena: ArenaBounds::default(),
            settle: SettlePolicy::default(),
            launch: LaunchSettings::default(),
            gravity: default_gravity(),
            fixed_timestep: default_fixed_timestep(),
            seed: None,
        }
    }
}

impl EngineSettings {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn gravity_vector(&self) -> Vec3 {
        Vec3::new(0.0, -self.gravity, 0.0)
    }

    pub fn validate(&self) -> Result<(), DiceError> {
        let fail = |msg: &str| Err(DiceError::InvalidSettings(msg.to_string()));

        let a = &self.arena;
        if !(a.half_width > 0.0 && a.half_depth > 0.0 && a.wall_height > 0.0) {
            return fail("arena dimensions must be positive");
        }

        let s = &self.settle;
        if !(s.linear_threshold > 0.0 && s.angular_threshold > 0.0) {
            return fail("settle thresholds must be positive");
        }
        if s.window_ticks == 0 {
            return fail("settle window must be at least one tick");
        }
        if s.max_roll_ticks < s.window_ticks {
            return fail("max roll ticks must not be shorter than the settle window");
        }

        let l = &self.launch;
        if l.horizontal_speed < 0.0 || l.lane_spacing < 0.0 {
            return fail("launch speed and lane spacing must not be negative");
        }
        if l.lift_min > l.lift_max {
            return fail("lift_min must not exceed lift_max");
        }
        if !(l.min_spin > 0.0 && l.spin > l.min_spin) {
            return fail("spin range must satisfy 0 < min_spin < spin");
        }
        if !a.contains(l.origin()) {
            return fail("launch origin must lie inside the arena");
        }

        if !(self.gravity > 0.0 && self.fixed_timestep > 0.0) {
            return fail("gravity and fixed timestep must be positive");
        }

        Ok(())
    }

    /// Load and validate settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DiceError> {
        let raw = fs::read_to_string(path.as_ref())?;
        let settings: EngineSettings = serde_json::from_str(&raw)?;
        settings.validate()?;
        info!("Loaded engine settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Like `load`, but falls back to defaults on any error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(
                    "Using default engine settings ({}): {}",
                    path.as_ref().display(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DiceError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
