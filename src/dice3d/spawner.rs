//! Die spawner
//!
//! Turns a catalog record into a launched body: shape from the catalog,
//! position at the launch origin (offset by lane), randomized throw velocity,
//! spin on every axis, and a random starting orientation.

use bevy::log::debug;
use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::dice3d::physics::{BodyHandle, BodySpec, PhysicsWorld};
use crate::dice3d::render::{DiceRenderer, VisualHandle};
use crate::dice3d::types::{ArenaBounds, DieDefinition, LaunchSettings};

pub const DIE_RESTITUTION: f32 = 0.3;
pub const DIE_FRICTION: f32 = 0.8;

pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// `lo` when the range is empty.
fn draw(rng: &mut StdRng, lo: f32, hi: f32) -> f32 {
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}

pub struct DieSpawner {
    launch: LaunchSettings,
    arena: ArenaBounds,
    rng: StdRng,
}

impl DieSpawner {
    pub fn new(launch: LaunchSettings, arena: ArenaBounds, seed: Option<u64>) -> Self {
        Self {
            launch,
            arena,
            rng: seeded_rng(seed),
        }
    }

    /// X offset of a lane: 0, +s, -s, +2s, -2s, ...
    pub fn lane_offset(&self, lane: usize) -> f32 {
        let step = lane.div_ceil(2) as f32 * self.launch.lane_spacing;
        if lane % 2 == 1 {
            step
        } else {
            -step
        }
    }

    fn spawn_position(&self, def: &DieDefinition, lane: usize) -> Vec3 {
        let mut position = self.launch.origin();
        let limit = (self.arena.half_width - def.shape.bounding_radius()).max(0.0);
        position.x = (position.x + self.lane_offset(lane)).clamp(-limit, limit);
        position
    }

    fn spin_component(&mut self) -> f32 {
        let magnitude = draw(&mut self.rng, self.launch.min_spin, self.launch.spin);
        if self.rng.gen_bool(0.5) {
            magnitude
        } else {
            -magnitude
        }
    }

    /// Draws the launch state for one die without touching any world.
    pub fn launch(&mut self, def: &DieDefinition, lane: usize) -> BodySpec {
        let hs = self.launch.horizontal_speed;
        let linear_velocity = Vec3::new(
            draw(&mut self.rng, -hs, hs),
            draw(&mut self.rng, self.launch.lift_min, self.launch.lift_max),
            draw(&mut self.rng, -hs, hs),
        );
        let angular_velocity = Vec3::new(
            self.spin_component(),
            self.spin_component(),
            self.spin_component(),
        );
        let orientation = Quat::from_euler(
            EulerRot::XYZ,
            self.rng.gen_range(0.0..std::f32::consts::TAU),
            self.rng.gen_range(0.0..std::f32::consts::TAU),
            self.rng.gen_range(0.0..std::f32::consts::TAU),
        );

        BodySpec {
            shape: def.shape.clone(),
            position: self.spawn_position(def, lane),
            orientation,
            linear_velocity,
            angular_velocity,
            density: def.density,
            restitution: DIE_RESTITUTION,
            friction: DIE_FRICTION,
        }
    }

    /// Adds the body and its visual.
    pub fn spawn<W, R>(
        &mut self,
        def: &DieDefinition,
        lane: usize,
        world: &mut W,
        renderer: &mut R,
    ) -> (BodyHandle, VisualHandle)
    where
        W: PhysicsWorld + ?Sized,
        R: DiceRenderer + ?Sized,
    {
        let spec = self.launch(def, lane);
        let state = spec.initial_state();
        let body = world.add_body(spec);
        let visual = renderer.add_visual(def, &state);
        debug!(
            "Spawned {} in lane {} at {:?} (body {:?})",
            def.kind, lane, state.position, body
        );
        (body, visual)
    }
}
