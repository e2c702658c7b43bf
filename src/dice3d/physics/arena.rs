//! Headless ground-contact world
//!
//! A small deterministic rigid-body integrator for running rolls without the
//! Bevy app: semi-implicit Euler, impulse contacts against the floor and
//! wall planes with Coulomb friction, rolling resistance, and a sleep test
//! that zeroes the velocities of a body that stays calm on the ground.
//!
//! Bodies only collide with the arena, never with each other. Inertia uses
//! the bounding sphere of the shape.

use std::collections::BTreeMap;

use bevy::log::debug;
use bevy::prelude::*;

use super::{BodyHandle, BodySpec, BodyState, ColliderShape, PhysicsWorld, SteppedWorld};
use crate::dice3d::types::{ArenaBounds, DiceError};

const SUBSTEPS: u32 = 4;
const SOLVER_ITERATIONS: usize = 6;
/// Approach speeds below this do not bounce.
const RESTITUTION_THRESHOLD: f32 = 0.5;
const ROLLING_RESISTANCE: f32 = 1.5;
const SLEEP_LINEAR: f32 = 0.04;
const SLEEP_ANGULAR: f32 = 0.08;
/// Calm substeps on the ground before a body falls asleep.
const SLEEP_SUBSTEPS: u32 = 30;

/// Half-space `normal . p >= offset`.
#[derive(Clone, Copy, Debug)]
struct Plane {
    normal: Vec3,
    offset: f32,
}

#[derive(Clone, Debug)]
enum Hull {
    Points(Vec<Vec3>),
    Ball(f32),
}

#[derive(Clone, Debug)]
struct Body {
    hull: Hull,
    position: Vec3,
    orientation: Quat,
    linear: Vec3,
    angular: Vec3,
    inv_mass: f32,
    inv_inertia: f32,
    restitution: f32,
    friction: f32,
    calm_substeps: u32,
    asleep: bool,
}

impl Body {
    fn from_spec(spec: BodySpec) -> Self {
        let radius = spec.shape.bounding_radius().max(0.05);
        let mass = spec.density.max(0.01) * 4.0 / 3.0 * std::f32::consts::PI * radius.powi(3);
        let inertia = 0.4 * mass * radius * radius;

        let hull = match spec.shape {
            ColliderShape::Cuboid { half_extents: h } => {
                let mut corners = Vec::with_capacity(8);
                for x in [-h.x, h.x] {
                    for y in [-h.y, h.y] {
                        for z in [-h.z, h.z] {
                            corners.push(Vec3::new(x, y, z));
                        }
                    }
                }
                Hull::Points(corners)
            }
            ColliderShape::ConvexHull { points } => Hull::Points(points),
            ColliderShape::Ball { radius } => Hull::Ball(radius),
        };

        Self {
            hull,
            position: spec.position,
            orientation: spec.orientation.normalize(),
            linear: spec.linear_velocity,
            angular: spec.angular_velocity,
            inv_mass: 1.0 / mass,
            inv_inertia: 1.0 / inertia,
            restitution: spec.restitution,
            friction: spec.friction,
            calm_substeps: 0,
            asleep: false,
        }
    }

    /// Contact lever arms (relative to the center) and penetration depths.
    fn contacts(&self, plane: &Plane) -> Vec<(Vec3, f32)> {
        match &self.hull {
            Hull::Points(points) => points
                .iter()
                .filter_map(|p| {
                    let r = self.orientation * *p;
                    let depth = plane.offset - plane.normal.dot(self.position + r);
                    (depth > 0.0).then_some((r, depth))
                })
                .collect(),
            Hull::Ball(radius) => {
                let depth = plane.offset - (plane.normal.dot(self.position) - radius);
                if depth > 0.0 {
                    vec![(-plane.normal * *radius, depth)]
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn apply_impulse(&mut self, impulse: Vec3, r: Vec3) {
        self.linear += impulse * self.inv_mass;
        self.angular += r.cross(impulse) * self.inv_inertia;
    }

    fn resolve_contact(&mut self, n: Vec3, r: Vec3) {
        let v_rel = self.linear + self.angular.cross(r);
        let vn = v_rel.dot(n);
        if vn >= 0.0 {
            return;
        }

        let e = if -vn > RESTITUTION_THRESHOLD {
            self.restitution
        } else {
            0.0
        };
        let denom = self.inv_mass + self.inv_inertia * r.cross(n).length_squared();
        let jn = -(1.0 + e) * vn / denom;
        self.apply_impulse(n * jn, r);

        let v_rel = self.linear + self.angular.cross(r);
        let vt = v_rel - n * v_rel.dot(n);
        let vt_len = vt.length();
        if vt_len > 1e-6 {
            let t = vt / vt_len;
            let denom_t = self.inv_mass + self.inv_inertia * r.cross(t).length_squared();
            let jt = (-vt_len / denom_t).max(-self.friction * jn);
            self.apply_impulse(t * jt, r);
        }
    }

    fn substep(&mut self, h: f32, gravity: Vec3, planes: &[Plane]) {
        if self.asleep {
            return;
        }

        self.linear += gravity * h;
        self.position += self.linear * h;
        self.orientation = (Quat::from_scaled_axis(self.angular * h) * self.orientation).normalize();

        let mut grounded = false;
        for plane in planes {
            let contacts = self.contacts(plane);
            if contacts.is_empty() {
                continue;
            }
            grounded = true;

            for _ in 0..SOLVER_ITERATIONS {
                for (r, _) in &contacts {
                    self.resolve_contact(plane.normal, *r);
                }
            }

            let depth = contacts.iter().map(|(_, d)| *d).fold(0.0, f32::max);
            self.position += plane.normal * depth;
        }

        if grounded {
            self.angular /= 1.0 + ROLLING_RESISTANCE * h;
        }

        if grounded
            && self.linear.length() < SLEEP_LINEAR
            && self.angular.length() < SLEEP_ANGULAR
        {
            self.calm_substeps += 1;
        } else {
            self.calm_substeps = 0;
        }

        if self.calm_substeps >= SLEEP_SUBSTEPS {
            self.linear = Vec3::ZERO;
            self.angular = Vec3::ZERO;
            self.asleep = true;
        }
    }

    fn state(&self) -> BodyState {
        BodyState {
            position: self.position,
            orientation: self.orientation,
            linear_velocity: self.linear,
            angular_velocity: self.angular,
        }
    }
}

/// Deterministic headless world: floor plus four infinite wall planes.
#[derive(Debug, Default)]
pub struct ArenaWorld {
    gravity: Vec3,
    planes: Vec<Plane>,
    bodies: BTreeMap<u64, Body>,
    next_id: u64,
    initialized: bool,
}

impl ArenaWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience for `new` followed by `initialize`.
    pub fn with_arena(arena: &ArenaBounds, gravity: Vec3) -> Result<Self, DiceError> {
        let mut world = Self::new();
        world.initialize(arena, gravity)?;
        Ok(world)
    }

    pub fn is_asleep(&self, handle: BodyHandle) -> bool {
        self.bodies.get(&handle.0).is_some_and(|b| b.asleep)
    }
}

impl PhysicsWorld for ArenaWorld {
    fn initialize(&mut self, arena: &ArenaBounds, gravity: Vec3) -> Result<(), DiceError> {
        if self.initialized {
            return Err(DiceError::AlreadyInitialized);
        }

        self.gravity = gravity;
        self.planes = vec![
            Plane {
                normal: Vec3::Y,
                offset: arena.floor_y,
            },
            Plane {
                normal: Vec3::NEG_X,
                offset: -arena.half_width,
            },
            Plane {
                normal: Vec3::X,
                offset: -arena.half_width,
            },
            Plane {
                normal: Vec3::NEG_Z,
                offset: -arena.half_depth,
            },
            Plane {
                normal: Vec3::Z,
                offset: -arena.half_depth,
            },
        ];
        self.initialized = true;
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn add_body(&mut self, spec: BodySpec) -> BodyHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.bodies.insert(id, Body::from_spec(spec));
        debug!("arena: added body {}", id);
        BodyHandle(id)
    }

    fn remove_body(&mut self, handle: BodyHandle) -> bool {
        self.bodies.remove(&handle.0).is_some()
    }

    fn query_state(&self, handle: BodyHandle) -> Option<BodyState> {
        self.bodies.get(&handle.0).map(Body::state)
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn teardown(&mut self) {
        self.bodies.clear();
        self.planes.clear();
        self.initialized = false;
    }
}

impl SteppedWorld for ArenaWorld {
    fn step(&mut self, dt: f32) {
        if !self.initialized {
            return;
        }
        let h = dt / SUBSTEPS as f32;
        for body in self.bodies.values_mut() {
            for _ in 0..SUBSTEPS {
                body.substep(h, self.gravity, &self.planes);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn cube_spec(position: Vec3, linear: Vec3, angular: Vec3) -> BodySpec {
        BodySpec {
            shape: ColliderShape::Cuboid {
                half_extents: Vec3::splat(0.5),
            },
            position,
            orientation: Quat::from_rotation_x(0.3),
            linear_velocity: linear,
            angular_velocity: angular,
            density: 1.5,
            restitution: 0.3,
            friction: 0.8,
        }
    }

    fn world() -> ArenaWorld {
        ArenaWorld::with_arena(&ArenaBounds::default(), Vec3::new(0.0, -9.82, 0.0)).unwrap()
    }

    #[test]
    fn test_initialize_twice_fails() {
        let mut w = world();
        let err = w
            .initialize(&ArenaBounds::default(), Vec3::NEG_Y)
            .unwrap_err();
        assert!(matches!(err, DiceError::AlreadyInitialized));
        w.teardown();
        assert!(w.initialize(&ArenaBounds::default(), Vec3::NEG_Y).is_ok());
    }

    #[test]
    fn test_body_falls_under_gravity() {
        let mut w = world();
        let h = w.add_body(cube_spec(Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO, Vec3::ZERO));
        w.step(DT);
        let s = w.query_state(h).unwrap();
        assert!(s.linear_velocity.y < 0.0);
        assert!(s.position.y < 5.0);
    }

    #[test]
    fn test_dropped_die_comes_to_rest_on_floor() {
        let mut w = world();
        let h = w.add_body(cube_spec(
            Vec3::new(0.0, 3.0, 0.0),
            Vec3::new(2.0, 4.0, -1.0),
            Vec3::new(4.0, -3.0, 2.0),
        ));
        for _ in 0..60 * 30 {
            w.step(DT);
            if w.is_asleep(h) {
                break;
            }
        }
        let s = w.query_state(h).unwrap();
        assert!(w.is_asleep(h), "die should fall asleep within 30 s");
        assert!(s.is_motionless());
        assert!(s.position.y > 0.0 && s.position.y < 1.0);
    }

    #[test]
    fn test_walls_contain_fast_die() {
        let mut w = world();
        let arena = ArenaBounds::default();
        let h = w.add_body(cube_spec(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(40.0, 0.0, 25.0),
            Vec3::ZERO,
        ));
        for _ in 0..600 {
            w.step(DT);
            let p = w.query_state(h).unwrap().position;
            assert!(p.x.abs() < arena.half_width + 0.1);
            assert!(p.z.abs() < arena.half_depth + 0.1);
        }
    }

    #[test]
    fn test_remove_body_once() {
        let mut w = world();
        let h = w.add_body(cube_spec(Vec3::Y, Vec3::ZERO, Vec3::ZERO));
        assert_eq!(w.body_count(), 1);
        assert!(w.remove_body(h));
        assert!(!w.remove_body(h));
        assert!(w.query_state(h).is_none());
        assert_eq!(w.body_count(), 0);
    }

    #[test]
    fn test_stepping_is_deterministic() {
        let spec = cube_spec(
            Vec3::new(1.0, 3.0, -1.0),
            Vec3::new(3.0, 6.0, 2.0),
            Vec3::new(5.0, 2.0, -4.0),
        );
        let mut a = world();
        let mut b = world();
        let ha = a.add_body(spec.clone());
        let hb = b.add_body(spec);
        for _ in 0..240 {
            a.step(DT);
            b.step(DT);
        }
        assert_eq!(a.query_state(ha), b.query_state(hb));
    }

    #[test]
    fn test_uninitialized_world_does_not_step() {
        let mut w = ArenaWorld::new();
        let h = w.add_body(cube_spec(Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO, Vec3::ZERO));
        w.step(DT);
        assert_eq!(w.query_state(h).unwrap().position.y, 5.0);
    }
}
