use bevy::prelude::*;

use super::Polyhedron;

/// Regular tetrahedron. Face `i` is the face opposite vertex `i`.
pub fn create_d4() -> Polyhedron {
    let vertices = vec![
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(1.0, -1.0, -1.0),
        Vec3::new(-1.0, 1.0, -1.0),
        Vec3::new(-1.0, -1.0, 1.0),
    ];

    let faces = vec![vec![1, 2, 3], vec![0, 3, 2], vec![0, 1, 3], vec![0, 2, 1]];

    Polyhedron::new(vertices, faces)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_d4_faces_point_away_from_their_vertex() {
        let poly = create_d4();
        for (i, n) in poly.face_normals().iter().enumerate() {
            let opposite = poly.vertices[i].normalize();
            assert!(n.dot(opposite) < -0.999);
        }
    }
}
