//! Face resolver
//!
//! Geometric dice read the face whose outward normal, rotated into world
//! space, points most nearly straight up. Dice without a face table draw a
//! uniform value instead.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::Rng;

use crate::dice3d::spawner::seeded_rng;
use crate::dice3d::types::{DieDefinition, FacePolicy, FaceTable, ResolutionPolicy};

/// Index of the most upward-facing normal. Ties go to the lowest index.
/// `None` for an empty table.
pub fn top_face(table: &FaceTable, orientation: Quat) -> Option<usize> {
    // Dotting rotated normals with world up is the same as dotting the
    // local normals with world up carried into the body frame.
    let local_up = orientation.normalize().inverse() * Vec3::Y;

    let mut best: Option<(usize, f32)> = None;
    for (i, normal) in table.normals().iter().enumerate() {
        let dot = normal.dot(local_up);
        if best.is_none_or(|(_, d)| dot > d) {
            best = Some((i, dot));
        }
    }
    best.map(|(i, _)| i)
}

pub struct FaceResolver {
    rng: StdRng,
}

impl FaceResolver {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: seeded_rng(seed),
        }
    }

    /// Uniform value in `[1, sides]`.
    pub fn statistical(&mut self, sides: u32) -> u32 {
        self.rng.gen_range(1..=sides.max(1))
    }

    pub fn resolve(&mut self, def: &DieDefinition, orientation: Quat) -> (u32, ResolutionPolicy) {
        if let FacePolicy::Geometric(table) = &def.faces {
            if let Some(index) = top_face(table, orientation) {
                let value = index as u32 + 1;
                if (1..=def.sides).contains(&value) {
                    return (value, ResolutionPolicy::Geometric);
                }
            }
        }
        (self.statistical(def.sides), ResolutionPolicy::Statistical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice3d::types::{DiceType, DieCatalog};

    #[test]
    fn test_identity_d6_reads_up_face() {
        // d6 face order: +Y, -Y, +X, -X, +Z, -Z
        let def = DieCatalog::standard().get(DiceType::D6).unwrap();
        let mut resolver = FaceResolver::new(Some(0));
        assert_eq!(
            resolver.resolve(def, Quat::IDENTITY),
            (1, ResolutionPolicy::Geometric)
        );
        let upside_down = Quat::from_rotation_x(std::f32::consts::PI);
        assert_eq!(resolver.resolve(def, upside_down).0, 2);
        // +X rotated onto +Y
        let tipped = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        assert_eq!(resolver.resolve(def, tipped).0, 3);
    }

    #[test]
    fn test_ties_resolve_to_lowest_index() {
        let table = FaceTable::new(vec![Vec3::X, Vec3::Y, Vec3::Y, Vec3::NEG_Y]);
        assert_eq!(top_face(&table, Quat::IDENTITY), Some(1));

        let symmetric = FaceTable::new(vec![Vec3::X, Vec3::NEG_X]);
        assert_eq!(top_face(&symmetric, Quat::IDENTITY), Some(0));
    }

    #[test]
    fn test_empty_table_falls_back_to_statistical() {
        let mut def = DieCatalog::standard().get(DiceType::D8).unwrap().clone();
        def.faces = FacePolicy::Geometric(FaceTable::new(Vec::new()));
        let mut resolver = FaceResolver::new(Some(5));
        let (value, policy) = resolver.resolve(&def, Quat::IDENTITY);
        assert_eq!(policy, ResolutionPolicy::Statistical);
        assert!((1..=8).contains(&value));
    }

    #[test]
    fn test_d100_is_statistical() {
        let def = DieCatalog::standard().get(DiceType::D100).unwrap();
        let mut resolver = FaceResolver::new(Some(1));
        for _ in 0..1000 {
            let (value, policy) = resolver.resolve(def, Quat::from_rotation_y(0.3));
            assert_eq!(policy, ResolutionPolicy::Statistical);
            assert!((1..=100).contains(&value));
        }
    }
}
