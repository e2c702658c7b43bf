//! bevy_rapier3d backend
//!
//! `RapierDiceWorld` is a system parameter: bodies are ECS entities carrying
//! Rapier components and `RapierPhysicsPlugin` steps them in its own
//! schedule. Spawns and despawns go through `Commands`, so a freshly added
//! body has no state until the commands are applied.

use std::collections::HashMap;

use bevy::ecs::system::SystemParam;
use bevy::log::{debug, info};
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::{BodyHandle, BodySpec, BodyState, ColliderShape, PhysicsWorld};
use crate::dice3d::render::DieVisual;
use crate::dice3d::types::{ArenaBounds, DiceError};

const WALL_THICKNESS: f32 = 0.5;

/// Marker for dynamic die bodies.
#[derive(Component, Debug, Clone, Copy)]
pub struct DieBody;

/// Marker for the floor, walls, and ceiling.
#[derive(Component, Debug, Clone, Copy)]
pub struct ArenaCollider;

/// Live body handles and arena state shared by every system using
/// `RapierDiceWorld`.
#[derive(Resource, Debug, Default)]
pub struct RapierBodyRegistry {
    bodies: HashMap<BodyHandle, Entity>,
    next_id: u64,
    gravity: Option<Vec3>,
}

impl RapierBodyRegistry {
    /// Gravity set by `initialize`, if the arena exists.
    pub fn gravity(&self) -> Option<Vec3> {
        self.gravity
    }

    pub fn entity(&self, handle: BodyHandle) -> Option<Entity> {
        self.bodies.get(&handle).copied()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

#[derive(SystemParam)]
pub struct RapierDiceWorld<'w, 's> {
    commands: Commands<'w, 's>,
    registry: ResMut<'w, RapierBodyRegistry>,
    bodies: Query<
        'w,
        's,
        (&'static Transform, &'static Velocity),
        (With<DieBody>, Without<DieVisual>),
    >,
    arena: Query<'w, 's, Entity, With<ArenaCollider>>,
}

fn collider_for(shape: &ColliderShape) -> Collider {
    match shape {
        ColliderShape::Cuboid { half_extents } => {
            Collider::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }
        ColliderShape::ConvexHull { points } => Collider::convex_hull(points)
            .unwrap_or(Collider::ball(shape.bounding_radius())),
        ColliderShape::Ball { radius } => Collider::ball(*radius),
    }
}

/// Floor, four walls, and a ceiling as (center, half extents).
pub fn arena_slabs(arena: &ArenaBounds) -> Vec<(Vec3, Vec3)> {
    let t = WALL_THICKNESS;
    let hw = arena.half_width;
    let hd = arena.half_depth;
    let half_h = arena.wall_height / 2.0;
    let mid_y = arena.floor_y + half_h;

    vec![
        // floor
        (
            Vec3::new(0.0, arena.floor_y - t, 0.0),
            Vec3::new(hw + 2.0 * t, t, hd + 2.0 * t),
        ),
        // ceiling
        (
            Vec3::new(0.0, arena.top_y() + t, 0.0),
            Vec3::new(hw + 2.0 * t, t, hd + 2.0 * t),
        ),
        (Vec3::new(hw + t, mid_y, 0.0), Vec3::new(t, half_h, hd)),
        (Vec3::new(-hw - t, mid_y, 0.0), Vec3::new(t, half_h, hd)),
        (Vec3::new(0.0, mid_y, hd + t), Vec3::new(hw, half_h, t)),
        (Vec3::new(0.0, mid_y, -hd - t), Vec3::new(hw, half_h, t)),
    ]
}

impl PhysicsWorld for RapierDiceWorld<'_, '_> {
    fn initialize(&mut self, arena: &ArenaBounds, gravity: Vec3) -> Result<(), DiceError> {
        if self.registry.gravity.is_some() {
            return Err(DiceError::AlreadyInitialized);
        }

        for (center, half) in arena_slabs(arena) {
            self.commands.spawn((
                Transform::from_translation(center),
                RigidBody::Fixed,
                Collider::cuboid(half.x, half.y, half.z),
                Restitution::coefficient(0.3),
                Friction::coefficient(0.8),
                ArenaCollider,
            ));
        }

        self.registry.gravity = Some(gravity);
        info!(
            "Rapier arena initialized ({} x {}, gravity {:?})",
            arena.half_width * 2.0,
            arena.half_depth * 2.0,
            gravity
        );
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.registry.gravity.is_some()
    }

    fn add_body(&mut self, spec: BodySpec) -> BodyHandle {
        let entity = self
            .commands
            .spawn((
                Transform::from_translation(spec.position).with_rotation(spec.orientation),
                RigidBody::Dynamic,
                collider_for(&spec.shape),
                Velocity {
                    linvel: spec.linear_velocity,
                    angvel: spec.angular_velocity,
                },
                Restitution::coefficient(spec.restitution),
                Friction::coefficient(spec.friction),
                ColliderMassProperties::Density(spec.density),
                Ccd::enabled(),
                Sleeping::default(),
                DieBody,
            ))
            .id();

        let handle = BodyHandle(self.registry.next_id);
        self.registry.next_id += 1;
        self.registry.bodies.insert(handle, entity);
        debug!("rapier: spawned body {:?} as {:?}", handle, entity);
        handle
    }

    fn remove_body(&mut self, handle: BodyHandle) -> bool {
        match self.registry.bodies.remove(&handle) {
            Some(entity) => {
                self.commands.entity(entity).try_despawn();
                true
            }
            None => false,
        }
    }

    fn query_state(&self, handle: BodyHandle) -> Option<BodyState> {
        let entity = self.registry.entity(handle)?;
        let (transform, velocity) = self.bodies.get(entity).ok()?;
        Some(BodyState {
            position: transform.translation,
            orientation: transform.rotation,
            linear_velocity: velocity.linvel,
            angular_velocity: velocity.angvel,
        })
    }

    fn body_count(&self) -> usize {
        self.registry.bodies.len()
    }

    fn teardown(&mut self) {
        for (_, entity) in self.registry.bodies.drain() {
            self.commands.entity(entity).try_despawn();
        }
        for entity in &self.arena {
            self.commands.entity(entity).try_despawn();
        }
        self.registry.gravity = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_slabs_enclose_play_area() {
        let arena = ArenaBounds::default();
        let slabs = arena_slabs(&arena);
        assert_eq!(slabs.len(), 6);

        let (floor, floor_half) = slabs[0];
        assert!((floor.y + floor_half.y - arena.floor_y).abs() < 1e-6);

        let (ceiling, ceiling_half) = slabs[1];
        assert!((ceiling.y - ceiling_half.y - arena.top_y()).abs() < 1e-6);

        let (wall, wall_half) = slabs[2];
        assert!((wall.x - wall_half.x - arena.half_width).abs() < 1e-6);
    }
}
