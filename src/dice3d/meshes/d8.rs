use bevy::prelude::*;

use super::{with_opposites, Polyhedron};

/// Regular octahedron, vertices on the axes.
pub fn create_d8() -> Polyhedron {
    let vertices = vec![
        Vec3::X,
        Vec3::NEG_X,
        Vec3::Y,
        Vec3::NEG_Y,
        Vec3::Z,
        Vec3::NEG_Z,
    ];

    let half = [
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(-1.0, 1.0, 1.0),
        Vec3::new(1.0, 1.0, -1.0),
        Vec3::new(-1.0, 1.0, -1.0),
    ];

    Polyhedron::from_support_directions(vertices, &with_opposites(&half))
}
