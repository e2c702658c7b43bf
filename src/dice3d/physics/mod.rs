//! Physics world adapter
//!
//! The dice engine never integrates rigid bodies itself. It talks to a
//! physics collaborator through `PhysicsWorld`: build the arena, add and
//! remove bodies, and sample their state. Worlds that the session loop
//! steps directly also implement `SteppedWorld`.
//!
//! Backends:
//! - `arena::ArenaWorld` - headless deterministic ground-contact world
//! - `rapier::RapierDiceWorld` - bevy_rapier3d, stepped by Rapier's own schedule
//! - `scripted::ScriptedWorld` - replays fixed velocity traces for tests

pub mod arena;
pub mod rapier;
pub mod scripted;

use bevy::prelude::*;

use crate::dice3d::types::{ArenaBounds, DiceError};

pub use arena::ArenaWorld;
pub use rapier::{ArenaCollider, DieBody, RapierBodyRegistry, RapierDiceWorld};
pub use scripted::{ScriptedTrace, ScriptedWorld};

/// Opaque reference to a body owned by a physics world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u64);

/// Collision shape descriptor, independent of any physics backend.
#[derive(Clone, Debug, PartialEq)]
pub enum ColliderShape {
    Cuboid { half_extents: Vec3 },
    ConvexHull { points: Vec<Vec3> },
    Ball { radius: f32 },
}

impl ColliderShape {
    /// Radius of a sphere around the origin that contains the shape.
    pub fn bounding_radius(&self) -> f32 {
        match self {
            ColliderShape::Cuboid { half_extents } => half_extents.length(),
            ColliderShape::ConvexHull { points } => {
                points.iter().map(|p| p.length()).fold(0.0, f32::max)
            }
            ColliderShape::Ball { radius } => *radius,
        }
    }
}

/// Everything a world needs to create one dynamic body.
#[derive(Clone, Debug, PartialEq)]
pub struct BodySpec {
    pub shape: ColliderShape,
    pub position: Vec3,
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub density: f32,
    pub restitution: f32,
    pub friction: f32,
}

impl BodySpec {
    pub fn initial_state(&self) -> BodyState {
        BodyState {
            position: self.position,
            orientation: self.orientation,
            linear_velocity: self.linear_velocity,
            angular_velocity: self.angular_velocity,
        }
    }
}

/// Instantaneous sample of a dynamic body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyState {
    pub position: Vec3,
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
}

impl BodyState {
    pub fn at_rest(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
        }
    }

    pub fn is_motionless(&self) -> bool {
        self.linear_velocity == Vec3::ZERO && self.angular_velocity == Vec3::ZERO
    }
}

pub trait PhysicsWorld {
    /// Creates gravity, floor, and walls. Fails with `AlreadyInitialized`
    /// when called twice without `teardown`.
    fn initialize(&mut self, arena: &ArenaBounds, gravity: Vec3) -> Result<(), DiceError>;

    fn is_initialized(&self) -> bool;

    fn add_body(&mut self, spec: BodySpec) -> BodyHandle;

    /// Releases a body. Returns `false` if the handle was already released.
    fn remove_body(&mut self, handle: BodyHandle) -> bool;

    fn query_state(&self, handle: BodyHandle) -> Option<BodyState>;

    /// Number of live dynamic bodies.
    fn body_count(&self) -> usize;

    /// Releases every body and the arena.
    fn teardown(&mut self);
}

/// A world advanced by the caller, one fixed timestep at a time.
pub trait SteppedWorld: PhysicsWorld {
    fn step(&mut self, dt: f32);
}
