//! Renderer collaborator
//!
//! The session adds one visual per die, moves it to the body transform every
//! tick, and removes it when the roll resolves or is cancelled.

use std::collections::{BTreeMap, HashMap};

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::dice3d::meshes::create_die_mesh;
use crate::dice3d::physics::{BodyState, DieBody};
use crate::dice3d::types::{DiceType, DieDefinition};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualHandle(pub u64);

pub trait DiceRenderer {
    fn add_visual(&mut self, def: &DieDefinition, state: &BodyState) -> VisualHandle;

    fn update_visual(&mut self, handle: VisualHandle, position: Vec3, orientation: Quat);

    /// Returns `false` if the visual was already removed.
    fn remove_visual(&mut self, handle: VisualHandle) -> bool;

    fn visual_count(&self) -> usize;
}

/// Headless renderer that only tracks visual transforms.
#[derive(Debug, Default)]
pub struct NullRenderer {
    visuals: BTreeMap<VisualHandle, (DiceType, Vec3, Quat)>,
    next_id: u64,
    added: usize,
    removed: usize,
    updates: usize,
}

impl NullRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transform(&self, handle: VisualHandle) -> Option<(Vec3, Quat)> {
        self.visuals.get(&handle).map(|(_, p, q)| (*p, *q))
    }

    pub fn added_count(&self) -> usize {
        self.added
    }

    pub fn removed_count(&self) -> usize {
        self.removed
    }

    pub fn update_count(&self) -> usize {
        self.updates
    }
}

impl DiceRenderer for NullRenderer {
    fn add_visual(&mut self, def: &DieDefinition, state: &BodyState) -> VisualHandle {
        let handle = VisualHandle(self.next_id);
        self.next_id += 1;
        self.added += 1;
        self.visuals
            .insert(handle, (def.kind, state.position, state.orientation));
        handle
    }

    fn update_visual(&mut self, handle: VisualHandle, position: Vec3, orientation: Quat) {
        if let Some(entry) = self.visuals.get_mut(&handle) {
            entry.1 = position;
            entry.2 = orientation;
            self.updates += 1;
        }
    }

    fn remove_visual(&mut self, handle: VisualHandle) -> bool {
        let removed = self.visuals.remove(&handle).is_some();
        if removed {
            self.removed += 1;
        }
        removed
    }

    fn visual_count(&self) -> usize {
        self.visuals.len()
    }
}

/// Marker for die mesh entities.
#[derive(Component, Debug, Clone, Copy)]
pub struct DieVisual {
    pub handle: VisualHandle,
    pub kind: DiceType,
}

/// Per-type mesh and material cache plus the live visual entities.
#[derive(Resource, Debug, Default)]
pub struct DieVisualAssets {
    cache: HashMap<DiceType, (Handle<Mesh>, Handle<StandardMaterial>)>,
    entities: HashMap<VisualHandle, Entity>,
    next_id: u64,
}

impl DieVisualAssets {
    pub fn entity(&self, handle: VisualHandle) -> Option<Entity> {
        self.entities.get(&handle).copied()
    }
}

#[derive(SystemParam)]
pub struct BevyDiceRenderer<'w, 's> {
    commands: Commands<'w, 's>,
    meshes: ResMut<'w, Assets<Mesh>>,
    materials: ResMut<'w, Assets<StandardMaterial>>,
    assets: ResMut<'w, DieVisualAssets>,
    visuals: Query<'w, 's, &'static mut Transform, (With<DieVisual>, Without<DieBody>)>,
}

impl BevyDiceRenderer<'_, '_> {
    fn handles_for(&mut self, def: &DieDefinition) -> (Handle<Mesh>, Handle<StandardMaterial>) {
        if let Some(cached) = self.assets.cache.get(&def.kind) {
            return cached.clone();
        }

        let mesh = self.meshes.add(create_die_mesh(def));
        let material = self.materials.add(StandardMaterial {
            base_color: def.color,
            reflectance: 0.7,
            perceptual_roughness: 0.15,
            metallic: 0.1,
            ..default()
        });
        self.assets
            .cache
            .insert(def.kind, (mesh.clone(), material.clone()));
        (mesh, material)
    }
}

impl DiceRenderer for BevyDiceRenderer<'_, '_> {
    fn add_visual(&mut self, def: &DieDefinition, state: &BodyState) -> VisualHandle {
        let (mesh, material) = self.handles_for(def);
        let handle = VisualHandle(self.assets.next_id);
        self.assets.next_id += 1;

        let entity = self
            .commands
            .spawn((
                Mesh3d(mesh),
                MeshMaterial3d(material),
                Transform::from_translation(state.position).with_rotation(state.orientation),
                DieVisual {
                    handle,
                    kind: def.kind,
                },
            ))
            .id();
        self.assets.entities.insert(handle, entity);
        handle
    }

    fn update_visual(&mut self, handle: VisualHandle, position: Vec3, orientation: Quat) {
        let Some(entity) = self.assets.entity(handle) else {
            return;
        };
        match self.visuals.get_mut(entity) {
            Ok(mut transform) => {
                transform.translation = position;
                transform.rotation = orientation;
            }
            // Spawn commands not applied yet.
            Err(_) => {
                self.commands
                    .entity(entity)
                    .try_insert(Transform::from_translation(position).with_rotation(orientation));
            }
        }
    }

    fn remove_visual(&mut self, handle: VisualHandle) -> bool {
        match self.assets.entities.remove(&handle) {
            Some(entity) => {
                self.commands.entity(entity).try_despawn();
                true
            }
            None => false,
        }
    }

    fn visual_count(&self) -> usize {
        self.assets.entities.len()
    }
}
