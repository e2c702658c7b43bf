//! Polyhedron geometry for the physical dice
//!
//! Every die is described once as a convex polyhedron centered on the origin.
//! The same description feeds the visual mesh, the convex-hull collider, and
//! the face-normal table used to read the settled result.

pub mod d10;
pub mod d12;
pub mod d20;
pub mod d4;
pub mod d6;
pub mod d8;

use bevy::prelude::*;
use bevy_mesh::PrimitiveTopology;

use crate::dice3d::types::{DiceType, DieDefinition};

pub use d10::create_d10;
pub use d12::create_d12;
pub use d20::create_d20;
pub use d4::create_d4;
pub use d6::create_d6;
pub use d8::create_d8;

/// Golden ratio, shared by the dodecahedron and icosahedron.
pub const PHI: f32 = 1.618_034;

/// Convex polyhedron: vertices plus faces as ordered vertex-index loops.
#[derive(Clone, Debug)]
pub struct Polyhedron {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<Vec<usize>>,
}

impl Polyhedron {
    pub fn new(vertices: Vec<Vec3>, faces: Vec<Vec<usize>>) -> Self {
        Self { vertices, faces }
    }

    /// Builds faces from outward directions: each face is the set of vertices
    /// that maximize the dot product with its direction, wound
    /// counter-clockwise when seen from outside.
    pub fn from_support_directions(vertices: Vec<Vec3>, directions: &[Vec3]) -> Self {
        let faces = directions
            .iter()
            .map(|dir| {
                let n = dir.normalize();
                let support = vertices
                    .iter()
                    .map(|v| v.dot(n))
                    .fold(f32::MIN, f32::max);
                let mut face: Vec<usize> = vertices
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| v.dot(n) > support - 1e-4)
                    .map(|(i, _)| i)
                    .collect();

                let center =
                    face.iter().map(|&i| vertices[i]).sum::<Vec3>() / face.len() as f32;
                let u = (vertices[face[0]] - center).normalize();
                let w = n.cross(u);
                let angle = |i: &usize| {
                    let d = vertices[*i] - center;
                    d.dot(w).atan2(d.dot(u))
                };
                face.sort_by(|a, b| angle(a).total_cmp(&angle(b)));
                face
            })
            .collect();

        Self { vertices, faces }
    }

    /// Uniformly rescale so the farthest vertex sits at `radius`.
    pub fn scaled_to_radius(mut self, radius: f32) -> Self {
        let current = self
            .vertices
            .iter()
            .map(|v| v.length())
            .fold(0.0_f32, f32::max);
        if current > f32::EPSILON {
            let k = radius / current;
            for v in &mut self.vertices {
                *v *= k;
            }
        }
        self
    }

    pub fn face_center(&self, face: usize) -> Vec3 {
        let loop_ = &self.faces[face];
        loop_.iter().map(|&i| self.vertices[i]).sum::<Vec3>() / loop_.len() as f32
    }

    /// Outward unit normal of every face, in face order.
    pub fn face_normals(&self) -> Vec<Vec3> {
        (0..self.faces.len()).map(|f| self.face_normal(f)).collect()
    }

    fn face_normal(&self, face: usize) -> Vec3 {
        let loop_ = &self.faces[face];
        // Newell's method works for any planar loop regardless of winding.
        let mut n = Vec3::ZERO;
        for (k, &i) in loop_.iter().enumerate() {
            let a = self.vertices[i];
            let b = self.vertices[loop_[(k + 1) % loop_.len()]];
            n += a.cross(b);
        }
        if n.dot(self.face_center(face)) < 0.0 {
            n = -n;
        }
        n.normalize_or_zero()
    }

    /// Flat-shaded triangle mesh, one fan per face.
    pub fn to_mesh(&self) -> Mesh {
        let mut positions: Vec<[f32; 3]> = Vec::new();
        let mut normals: Vec<[f32; 3]> = Vec::new();
        let mut uvs: Vec<[f32; 2]> = Vec::new();

        for (f, loop_) in self.faces.iter().enumerate() {
            let n = self.face_normal(f);
            let a = self.vertices[loop_[0]];
            for k in 1..loop_.len() - 1 {
                let mut b = self.vertices[loop_[k]];
                let mut c = self.vertices[loop_[k + 1]];
                if (b - a).cross(c - a).dot(n) < 0.0 {
                    std::mem::swap(&mut b, &mut c);
                }
                for p in [a, b, c] {
                    positions.push(p.to_array());
                    normals.push(n.to_array());
                    uvs.push([0.5, 0.5]);
                }
            }
        }

        Mesh::new(PrimitiveTopology::TriangleList, Default::default())
            .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
            .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
            .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
    }
}

/// Expands half of a centrally symmetric direction set into the full set, so
/// that direction `i` and direction `n - 1 - i` are opposite. Opposite faces
/// then sum to `n + 1`, as on a real die.
pub fn with_opposites(half: &[Vec3]) -> Vec<Vec3> {
    let mut all = half.to_vec();
    all.extend(half.iter().rev().map(|d| -*d));
    all
}

/// Polyhedron for a die kind at the given circumradius. `None` for d100,
/// which is simulated as a ball.
pub fn polyhedron_for(kind: DiceType, radius: f32) -> Option<Polyhedron> {
    let poly = match kind {
        DiceType::D4 => create_d4(),
        DiceType::D6 => create_d6(),
        DiceType::D8 => create_d8(),
        DiceType::D10 => create_d10(),
        DiceType::D12 => create_d12(),
        DiceType::D20 => create_d20(),
        DiceType::D100 => return None,
    };
    Some(poly.scaled_to_radius(radius))
}

/// Visual mesh for a catalog entry.
pub fn create_die_mesh(def: &DieDefinition) -> Mesh {
    match polyhedron_for(def.kind, def.circumradius()) {
        Some(poly) => poly.to_mesh(),
        None => Mesh::from(Sphere::new(def.size / 2.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_polyhedra() -> Vec<(DiceType, Polyhedron)> {
        DiceType::all()
            .iter()
            .filter_map(|&kind| polyhedron_for(kind, 1.0).map(|p| (kind, p)))
            .collect()
    }

    #[test]
    fn test_face_counts_match_sides() {
        for (kind, poly) in all_polyhedra() {
            assert_eq!(
                poly.faces.len() as u32,
                kind.max_value(),
                "{} should have one face per side",
                kind.name()
            );
        }
    }

    #[test]
    fn test_faces_are_planar() {
        for (kind, poly) in all_polyhedra() {
            for (f, n) in poly.face_normals().iter().enumerate() {
                let reference = poly.vertices[poly.faces[f][0]].dot(*n);
                for &i in &poly.faces[f] {
                    let d = poly.vertices[i].dot(*n);
                    assert!(
                        (d - reference).abs() < 1e-3,
                        "{} face {} is not planar",
                        kind.name(),
                        f
                    );
                }
            }
        }
    }

    #[test]
    fn test_normals_are_unit_and_distinct() {
        for (kind, poly) in all_polyhedra() {
            let normals = poly.face_normals();
            for (i, a) in normals.iter().enumerate() {
                assert!((a.length() - 1.0).abs() < 1e-4);
                for b in normals.iter().skip(i + 1) {
                    assert!(a.dot(*b) < 0.999, "{} has duplicate faces", kind.name());
                }
            }
        }
    }

    #[test]
    fn test_opposite_faces_sum_to_sides_plus_one() {
        for kind in [DiceType::D8, DiceType::D12, DiceType::D20] {
            let poly = polyhedron_for(kind, 1.0).unwrap();
            let normals = poly.face_normals();
            let n = normals.len();
            for i in 0..n {
                assert!(
                    normals[i].dot(normals[n - 1 - i]) < -0.999,
                    "{} faces {} and {} should be opposite",
                    kind.name(),
                    i + 1,
                    n - i
                );
            }
        }
    }

    #[test]
    fn test_scaled_to_radius() {
        let poly = create_d20().scaled_to_radius(0.75);
        let max = poly.vertices.iter().map(|v| v.length()).fold(0.0, f32::max);
        assert!((max - 0.75).abs() < 1e-5);
    }

    #[test]
    fn test_d100_has_no_polyhedron() {
        assert!(polyhedron_for(DiceType::D100, 1.0).is_none());
    }
}
