use bevy::prelude::*;

use super::{with_opposites, Polyhedron, PHI};

/// Regular icosahedron. Face normals are the dodecahedron's vertex
/// directions.
pub fn create_d20() -> Polyhedron {
    let mut vertices = Vec::with_capacity(12);
    for a in [-1.0, 1.0] {
        for b in [-1.0, 1.0] {
            vertices.push(Vec3::new(0.0, a, b * PHI));
            vertices.push(Vec3::new(a, b * PHI, 0.0));
            vertices.push(Vec3::new(b * PHI, 0.0, a));
        }
    }

    let inv = 1.0 / PHI;
    let half = [
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(1.0, 1.0, -1.0),
        Vec3::new(1.0, -1.0, 1.0),
        Vec3::new(1.0, -1.0, -1.0),
        Vec3::new(inv, 0.0, PHI),
        Vec3::new(-inv, 0.0, PHI),
        Vec3::new(0.0, PHI, inv),
        Vec3::new(0.0, PHI, -inv),
        Vec3::new(PHI, inv, 0.0),
        Vec3::new(PHI, -inv, 0.0),
    ];

    Polyhedron::from_support_directions(vertices, &with_opposites(&half))
}
