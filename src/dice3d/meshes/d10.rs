use bevy::prelude::*;

use super::Polyhedron;

/// Half-height of the zig-zag ring.
const RING_HEIGHT: f32 = 0.1;

/// Pentagonal trapezohedron.
///
/// Ten ring vertices alternate between `+RING_HEIGHT` and `-RING_HEIGHT`
/// every 36 degrees. The apex height is chosen so each kite is planar:
/// apex, the midpoint of the two same-side ring vertices, and the opposite
/// ring vertex must be collinear.
pub fn create_d10() -> Polyhedron {
    let step = std::f32::consts::PI / 5.0;
    let c = step.cos();
    let apex = RING_HEIGHT * (1.0 + c) / (1.0 - c);

    let mut vertices = vec![Vec3::new(0.0, apex, 0.0), Vec3::new(0.0, -apex, 0.0)];
    for k in 0..10 {
        let a = k as f32 * step;
        let y = if k % 2 == 0 { RING_HEIGHT } else { -RING_HEIGHT };
        vertices.push(Vec3::new(a.cos(), y, a.sin()));
    }

    let ring = |k: usize| 2 + k % 10;

    // Upper and lower kites interleave: odd values on top, even below.
    let mut faces = Vec::with_capacity(10);
    for j in 0..5 {
        faces.push(vec![0, ring(2 * j), ring(2 * j + 1), ring(2 * j + 2)]);
        faces.push(vec![1, ring(2 * j + 1), ring(2 * j + 2), ring(2 * j + 3)]);
    }

    Polyhedron::new(vertices, faces)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_d10_upper_and_lower_faces_alternate() {
        let normals = create_d10().face_normals();
        for (i, n) in normals.iter().enumerate() {
            if i % 2 == 0 {
                assert!(n.y > 0.0, "face {} should face up", i + 1);
            } else {
                assert!(n.y < 0.0, "face {} should face down", i + 1);
            }
        }
    }
}
