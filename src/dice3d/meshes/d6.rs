use bevy::prelude::*;

use super::Polyhedron;

/// Cube. Faces in value order: +Y, -Y, +X, -X, +Z, -Z.
pub fn create_d6() -> Polyhedron {
    let mut vertices = Vec::with_capacity(8);
    for x in [-1.0, 1.0] {
        for y in [-1.0, 1.0] {
            for z in [-1.0, 1.0] {
                vertices.push(Vec3::new(x, y, z));
            }
        }
    }

    let directions = [
        Vec3::Y,
        Vec3::NEG_Y,
        Vec3::X,
        Vec3::NEG_X,
        Vec3::Z,
        Vec3::NEG_Z,
    ];

    Polyhedron::from_support_directions(vertices, &directions)
}
