//! Dice catalog types
//!
//! `DiceType` is the tag every lookup dispatches on; `DieDefinition` is the
//! immutable catalog record for one tag. The catalog is built once per
//! process and handed out as `&'static` references.

use std::sync::LazyLock;

use bevy::prelude::*;

use super::error::DiceError;
use crate::dice3d::meshes::polyhedron_for;
use crate::dice3d::physics::ColliderShape;

/// All supported dice types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiceType {
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
    D100,
}

impl DiceType {
    pub fn all() -> &'static [DiceType] {
        &[
            DiceType::D4,
            DiceType::D6,
            DiceType::D8,
            DiceType::D10,
            DiceType::D12,
            DiceType::D20,
            DiceType::D100,
        ]
    }

    pub fn max_value(&self) -> u32 {
        match self {
            DiceType::D4 => 4,
            DiceType::D6 => 6,
            DiceType::D8 => 8,
            DiceType::D10 => 10,
            DiceType::D12 => 12,
            DiceType::D20 => 20,
            DiceType::D100 => 100,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DiceType::D4 => "D4",
            DiceType::D6 => "D6",
            DiceType::D8 => "D8",
            DiceType::D10 => "D10",
            DiceType::D12 => "D12",
            DiceType::D20 => "D20",
            DiceType::D100 => "D100",
        }
    }

    pub fn parse(s: &str) -> Option<DiceType> {
        match s.trim().to_lowercase().as_str() {
            "d4" => Some(DiceType::D4),
            "d6" => Some(DiceType::D6),
            "d8" => Some(DiceType::D8),
            "d10" => Some(DiceType::D10),
            "d12" => Some(DiceType::D12),
            "d20" => Some(DiceType::D20),
            "d100" => Some(DiceType::D100),
            _ => None,
        }
    }

    /// Display color as sRGB bytes.
    fn rgb(&self) -> [u8; 3] {
        match self {
            DiceType::D4 => [0xf4, 0x43, 0x36],   // red
            DiceType::D6 => [0x21, 0x96, 0xf3],   // blue
            DiceType::D8 => [0x4c, 0xaf, 0x50],   // green
            DiceType::D10 => [0xff, 0x98, 0x00],  // orange
            DiceType::D12 => [0xff, 0xeb, 0x3b],  // yellow
            DiceType::D20 => [0x9c, 0x27, 0xb0],  // purple
            DiceType::D100 => [0x60, 0x7d, 0x8b], // slate
        }
    }

    /// Nominal size of the die. Edge length for the cube, diameter for the
    /// d100 ball; other polyhedra share the cube's circumradius ratio.
    fn size(&self) -> f32 {
        match self {
            DiceType::D4 => 1.2,
            DiceType::D6 => 1.0,
            DiceType::D8 => 1.1,
            DiceType::D10 => 1.1,
            DiceType::D12 => 1.2,
            DiceType::D20 => 1.3,
            DiceType::D100 => 1.0,
        }
    }

    /// Larger dice are heavier, affecting how they roll and bounce.
    fn density(&self) -> f32 {
        match self {
            DiceType::D4 => 1.0,
            DiceType::D6 => 1.5,
            DiceType::D8 => 1.8,
            DiceType::D10 => 2.0,
            DiceType::D12 => 2.5,
            DiceType::D20 => 3.0,
            DiceType::D100 => 2.0,
        }
    }
}

impl std::fmt::Display for DiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Outward face normals in body-local space; entry `i` is face value `i + 1`.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceTable {
    normals: Vec<Vec3>,
}

impl FaceTable {
    /// Normalizes every entry. Zero-length entries are kept as zero and can
    /// never win a top-face comparison against a real face.
    pub fn new(normals: Vec<Vec3>) -> Self {
        Self {
            normals: normals.into_iter().map(|n| n.normalize_or_zero()).collect(),
        }
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn len(&self) -> usize {
        self.normals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.normals.is_empty()
    }
}

/// How the settled value of a die is read.
#[derive(Clone, Debug, PartialEq)]
pub enum FacePolicy {
    /// Pick the face whose normal points most upward.
    Geometric(FaceTable),
    /// Uniform draw in `[1, sides]`, independent of the settled pose.
    Statistical,
}

/// Immutable catalog record for one die type.
#[derive(Clone, Debug)]
pub struct DieDefinition {
    pub kind: DiceType,
    pub sides: u32,
    pub color: Color,
    pub size: f32,
    pub density: f32,
    pub shape: ColliderShape,
    pub faces: FacePolicy,
}

impl DieDefinition {
    fn build(kind: DiceType) -> Self {
        let size = kind.size();
        let [r, g, b] = kind.rgb();
        let mut def = Self {
            kind,
            sides: kind.max_value(),
            color: Color::srgb_u8(r, g, b),
            size,
            density: kind.density(),
            shape: ColliderShape::Ball { radius: size / 2.0 },
            faces: FacePolicy::Statistical,
        };

        if let Some(poly) = polyhedron_for(kind, def.circumradius()) {
            def.shape = match kind {
                DiceType::D6 => ColliderShape::Cuboid {
                    half_extents: Vec3::splat(size / 2.0),
                },
                _ => ColliderShape::ConvexHull {
                    points: poly.vertices.clone(),
                },
            };
            def.faces = FacePolicy::Geometric(FaceTable::new(poly.face_normals()));
        }

        def
    }

    /// Radius of the sphere through the polyhedron's vertices.
    pub fn circumradius(&self) -> f32 {
        self.size * 3.0_f32.sqrt() / 2.0
    }

    pub fn face_table(&self) -> Option<&FaceTable> {
        match &self.faces {
            FacePolicy::Geometric(table) => Some(table),
            FacePolicy::Statistical => None,
        }
    }
}

/// Static lookup from die identifiers to catalog records.
#[derive(Debug)]
pub struct DieCatalog {
    entries: Vec<DieDefinition>,
}

static STANDARD_CATALOG: LazyLock<DieCatalog> = LazyLock::new(|| DieCatalog {
    entries: DiceType::all()
        .iter()
        .map(|&kind| DieDefinition::build(kind))
        .collect(),
});

impl DieCatalog {
    /// The standard d4..d20 + d100 catalog, computed on first use.
    pub fn standard() -> &'static DieCatalog {
        &STANDARD_CATALOG
    }

    pub fn get(&self, kind: DiceType) -> Option<&DieDefinition> {
        self.entries.iter().find(|d| d.kind == kind)
    }

    pub fn resolve(&self, identifier: &str) -> Result<&DieDefinition, DiceError> {
        DiceType::parse(identifier)
            .and_then(|kind| self.get(kind))
            .ok_or_else(|| DiceError::UnknownDieType(identifier.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &DieDefinition> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dice_type_max_value() {
        assert_eq!(DiceType::D4.max_value(), 4);
        assert_eq!(DiceType::D6.max_value(), 6);
        assert_eq!(DiceType::D8.max_value(), 8);
        assert_eq!(DiceType::D10.max_value(), 10);
        assert_eq!(DiceType::D12.max_value(), 12);
        assert_eq!(DiceType::D20.max_value(), 20);
        assert_eq!(DiceType::D100.max_value(), 100);
    }

    #[test]
    fn test_dice_type_parse() {
        assert_eq!(DiceType::parse("d4"), Some(DiceType::D4));
        assert_eq!(DiceType::parse("D4"), Some(DiceType::D4));
        assert_eq!(DiceType::parse(" d20 "), Some(DiceType::D20));
        assert_eq!(DiceType::parse("d100"), Some(DiceType::D100));
        assert_eq!(DiceType::parse("invalid"), None);
        assert_eq!(DiceType::parse("d50"), None);
    }

    #[test]
    fn test_catalog_resolves_every_kind() {
        let catalog = DieCatalog::standard();
        for kind in DiceType::all() {
            let def = catalog.resolve(&kind.name().to_lowercase()).unwrap();
            assert_eq!(def.kind, *kind);
            assert_eq!(def.sides, kind.max_value());
            assert!(def.sides >= 2);
        }
    }

    #[test]
    fn test_catalog_unknown_identifier() {
        let err = DieCatalog::standard().resolve("unknown").unwrap_err();
        assert!(matches!(err, DiceError::UnknownDieType(ref id) if id == "unknown"));
    }

    #[test]
    fn test_face_tables_match_side_counts() {
        for def in DieCatalog::standard().iter() {
            match &def.faces {
                FacePolicy::Geometric(table) => assert_eq!(table.len() as u32, def.sides),
                FacePolicy::Statistical => assert_eq!(def.kind, DiceType::D100),
            }
        }
    }

    #[test]
    fn test_collider_shapes() {
        let catalog = DieCatalog::standard();
        assert!(matches!(
            catalog.get(DiceType::D6).unwrap().shape,
            ColliderShape::Cuboid { .. }
        ));
        assert!(matches!(
            catalog.get(DiceType::D20).unwrap().shape,
            ColliderShape::ConvexHull { .. }
        ));
        assert!(matches!(
            catalog.get(DiceType::D100).unwrap().shape,
            ColliderShape::Ball { .. }
        ));
    }

    #[test]
    fn test_catalog_is_shared() {
        assert!(std::ptr::eq(DieCatalog::standard(), DieCatalog::standard()));
    }
}
