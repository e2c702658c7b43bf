use bevy::prelude::*;

use super::{with_opposites, Polyhedron, PHI};

/// Regular dodecahedron. Face normals are the icosahedron's vertex
/// directions.
pub fn create_d12() -> Polyhedron {
    let inv = 1.0 / PHI;
    let mut vertices = Vec::with_capacity(20);
    for x in [-1.0, 1.0] {
        for y in [-1.0, 1.0] {
            for z in [-1.0, 1.0] {
                vertices.push(Vec3::new(x, y, z));
            }
        }
    }
    for a in [-1.0, 1.0] {
        for b in [-1.0, 1.0] {
            vertices.push(Vec3::new(0.0, a * inv, b * PHI));
            vertices.push(Vec3::new(a * inv, b * PHI, 0.0));
            vertices.push(Vec3::new(a * PHI, 0.0, b * inv));
        }
    }

    let half = [
        Vec3::new(0.0, PHI, 1.0),
        Vec3::new(0.0, -PHI, 1.0),
        Vec3::new(1.0, 0.0, PHI),
        Vec3::new(-1.0, 0.0, PHI),
        Vec3::new(PHI, 1.0, 0.0),
        Vec3::new(PHI, -1.0, 0.0),
    ];

    Polyhedron::from_support_directions(vertices, &with_opposites(&half))
}
