//! Scene setup and arena initialization

use bevy::log::warn;
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::state::{DiceSession, MainCamera, ResultsText};
use crate::dice3d::physics::rapier::arena_slabs;
use crate::dice3d::physics::{RapierBodyRegistry, RapierDiceWorld};
use crate::dice3d::types::EngineSettings;

/// Camera, light, table visuals, and the results panel.
pub fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    settings: Res<EngineSettings>,
) {
    let arena = settings.arena;

    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, arena.half_width * 2.0, arena.half_depth * 2.0)
            .looking_at(Vec3::ZERO, Vec3::Y),
        MainCamera,
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 10000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(5.0, 10.0, 5.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // Fill light from the opposite corner.
    commands.spawn((
        PointLight {
            intensity: 1_500_000.0,
            range: 40.0,
            ..default()
        },
        Transform::from_xyz(-6.0, 8.0, -4.0),
    ));

    let felt = materials.add(StandardMaterial {
        base_color: Color::srgb(0.12, 0.35, 0.2),
        perceptual_roughness: 0.9,
        ..default()
    });
    let glass = materials.add(StandardMaterial {
        base_color: Color::srgba(0.7, 0.85, 0.95, 0.25),
        alpha_mode: AlphaMode::Blend,
        reflectance: 0.8,
        perceptual_roughness: 0.1,
        ..default()
    });

    // Index 1 is the ceiling, which stays invisible.
    for (i, (center, half)) in arena_slabs(&arena).into_iter().enumerate() {
        if i == 1 {
            continue;
        }
        let material = if i == 0 { felt.clone() } else { glass.clone() };
        commands.spawn((
            Mesh3d(meshes.add(Cuboid::from_size(half * 2.0))),
            MeshMaterial3d(material),
            Transform::from_translation(center),
        ));
    }

    commands.spawn((
        Text::new("Press 1-7 to pick a die, SPACE to roll, C to clear"),
        TextFont {
            font_size: 22.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(10.0),
            left: Val::Px(10.0),
            max_width: Val::Px(360.0),
            ..default()
        },
        ResultsText,
    ));
}

/// Builds the Rapier arena and starts the session.
pub fn initialize_arena(mut dice: ResMut<DiceSession>, mut world: RapierDiceWorld) {
    match dice.session.initialize(&mut world) {
        Ok(()) => dice.start(),
        Err(e) => warn!("Dice arena not initialized: {}", e),
    }
}

/// Keeps the Rapier context gravity in line with the arena.
pub fn configure_physics(
    registry: Res<RapierBodyRegistry>,
    mut configs: Query<&mut RapierConfiguration>,
) {
    let Some(gravity) = registry.gravity() else {
        return;
    };
    for mut config in configs.iter_mut() {
        if config.gravity != gravity {
            config.gravity = gravity;
        }
    }
}
