//! Tests for the Rapier world adapter and the Bevy roll systems

use bevy::ecs::system::RunSystemOnce;
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use tabletop_dice::dice3d::physics::{ArenaCollider, DieBody, RapierBodyRegistry, RapierDiceWorld};
use tabletop_dice::dice3d::render::{DieVisual, DieVisualAssets};
use tabletop_dice::dice3d::systems::{
    configure_physics, initialize_arena, process_roll_requests, tick_dice_session, DiceResults,
    DiceSession, DieRollCompleted, RollRequests,
};
use tabletop_dice::dice3d::{
    ArenaBounds, BodyHandle, BodySpec, BodyState, ColliderShape, DiceError, DiceType,
    EngineSettings, PhysicsWorld, RollOutcome, SettlePolicy,
};

fn cube_spec() -> BodySpec {
    BodySpec {
        shape: ColliderShape::Cuboid {
            half_extents: Vec3::splat(0.5),
        },
        position: Vec3::new(1.0, 3.0, -1.0),
        orientation: Quat::from_rotation_y(0.4),
        linear_velocity: Vec3::new(2.0, 6.0, 0.0),
        angular_velocity: Vec3::new(1.0, -1.0, 2.0),
        density: 1.5,
        restitution: 0.3,
        friction: 0.8,
    }
}

#[derive(Resource)]
struct Tracked(BodyHandle);

fn init_arena(mut world: RapierDiceWorld) -> Result<(), DiceError> {
    world.initialize(&ArenaBounds::default(), Vec3::new(0.0, -9.82, 0.0))
}

fn add_cube(mut world: RapierDiceWorld) -> BodyHandle {
    world.add_body(cube_spec())
}

fn tracked_state(world: RapierDiceWorld, tracked: Res<Tracked>) -> Option<BodyState> {
    world.query_state(tracked.0)
}

fn remove_tracked(mut world: RapierDiceWorld, tracked: Res<Tracked>) -> bool {
    world.remove_body(tracked.0)
}

fn tear_down(mut world: RapierDiceWorld) {
    world.teardown();
}

fn count<F: bevy::ecs::query::QueryFilter>(world: &mut World) -> usize {
    world.query_filtered::<Entity, F>().iter(world).count()
}

fn ecs_world() -> World {
    let mut world = World::new();
    world.init_resource::<RapierBodyRegistry>();
    world
}

#[test]
fn test_second_initialize_is_rejected() {
    let mut world = ecs_world();
    world.run_system_once(init_arena).unwrap().unwrap();
    assert_eq!(count::<With<ArenaCollider>>(&mut world), 6);
    assert_eq!(
        world.resource::<RapierBodyRegistry>().gravity(),
        Some(Vec3::new(0.0, -9.82, 0.0))
    );

    let second = world.run_system_once(init_arena).unwrap();
    assert!(matches!(second, Err(DiceError::AlreadyInitialized)));
    assert_eq!(count::<With<ArenaCollider>>(&mut world), 6);
}

#[test]
fn test_body_state_and_single_release() {
    let mut world = ecs_world();
    world.run_system_once(init_arena).unwrap().unwrap();

    let handle = world.run_system_once(add_cube).unwrap();
    world.insert_resource(Tracked(handle));
    assert_eq!(count::<With<DieBody>>(&mut world), 1);

    let spec = cube_spec();
    let state = world.run_system_once(tracked_state).unwrap().unwrap();
    assert_eq!(state.position, spec.position);
    assert_eq!(state.orientation, spec.orientation);
    assert_eq!(state.linear_velocity, spec.linear_velocity);
    assert_eq!(state.angular_velocity, spec.angular_velocity);

    assert!(world.run_system_once(remove_tracked).unwrap());
    assert!(!world.run_system_once(remove_tracked).unwrap());
    assert_eq!(count::<With<DieBody>>(&mut world), 0);
    assert!(world.run_system_once(tracked_state).unwrap().is_none());
    assert_eq!(world.resource::<RapierBodyRegistry>().body_count(), 0);
}

#[test]
fn test_teardown_despawns_bodies_and_arena() {
    let mut world = ecs_world();
    world.run_system_once(init_arena).unwrap().unwrap();
    world.run_system_once(add_cube).unwrap();
    world.run_system_once(add_cube).unwrap();
    assert_eq!(count::<With<DieBody>>(&mut world), 2);

    world.run_system_once(tear_down).unwrap();
    assert_eq!(count::<With<DieBody>>(&mut world), 0);
    assert_eq!(count::<With<ArenaCollider>>(&mut world), 0);
    let registry = world.resource::<RapierBodyRegistry>();
    assert_eq!(registry.body_count(), 0);
    assert!(registry.gravity().is_none());

    world.run_system_once(init_arena).unwrap().unwrap();
    assert_eq!(count::<With<ArenaCollider>>(&mut world), 6);
}

#[derive(Resource, Default)]
struct Completed(Vec<RollOutcome>);

fn collect_completed(mut messages: MessageReader<DieRollCompleted>, mut seen: ResMut<Completed>) {
    seen.0.extend(messages.read().map(|m| m.outcome));
}

/// Headless app with the same resources and system order as `DiceRollPlugin`,
/// minus the scene and keyboard.
fn rapier_app(settings: EngineSettings) -> App {
    let mut app = App::new();
    app.add_plugins((
        MinimalPlugins,
        bevy::transform::TransformPlugin,
        bevy::asset::AssetPlugin::default(),
    ))
        .init_asset::<Mesh>()
        .init_asset::<StandardMaterial>()
        .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
        .insert_resource(TimestepMode::Fixed {
            dt: settings.fixed_timestep,
            substeps: 1,
        })
        .insert_resource(DiceSession::new(settings.clone()))
        .insert_resource(settings)
        .init_resource::<RollRequests>()
        .init_resource::<DiceResults>()
        .init_resource::<RapierBodyRegistry>()
        .init_resource::<DieVisualAssets>()
        .init_resource::<Completed>()
        .add_message::<DieRollCompleted>()
        .add_systems(Startup, initialize_arena)
        .add_systems(
            Update,
            (
                configure_physics,
                process_roll_requests,
                tick_dice_session,
                collect_completed,
            )
                .chain(),
        );
    app
}

#[test]
fn test_requested_die_completes_once_and_is_despawned() {
    let mut settings = EngineSettings::default().with_seed(9);
    settings.settle = SettlePolicy {
        max_roll_ticks: 3,
        ..SettlePolicy::default()
    };
    let mut app = rapier_app(settings);
    app.world_mut().resource_mut::<RollRequests>().push("d6");

    // The die is spawned and sampled in the same frame, so it times out on
    // the third.
    app.update();
    assert!(app.world().resource::<DiceSession>().is_running());
    assert_eq!(app.world().resource::<DiceSession>().session.active_count(), 1);
    assert_eq!(app.world().resource::<DiceSession>().session.active_rolls()[0].ticks(), 1);
    assert_eq!(count::<With<DieBody>>(app.world_mut()), 1);
    assert_eq!(count::<With<DieVisual>>(app.world_mut()), 1);

    for _ in 0..5 {
        app.update();
    }

    let seen = &app.world().resource::<Completed>().0;
    assert_eq!(seen.len(), 1);
    let outcome = seen[0];
    assert_eq!(outcome.die_type, DiceType::D6);
    assert!((1..=6).contains(&outcome.value));
    assert!(outcome.forced);
    assert_eq!(outcome.ticks, 3);

    assert_eq!(app.world().resource::<DiceResults>().recent.len(), 1);
    assert_eq!(app.world().resource::<DiceSession>().session.active_count(), 0);
    assert_eq!(app.world().resource::<RapierBodyRegistry>().body_count(), 0);
    assert_eq!(count::<With<DieBody>>(app.world_mut()), 0);
    assert_eq!(count::<With<DieVisual>>(app.world_mut()), 0);
    assert_eq!(count::<With<ArenaCollider>>(app.world_mut()), 6);
}

#[test]
fn test_requests_before_arena_are_dropped() {
    let mut world = ecs_world();
    world.init_resource::<RollRequests>();
    world.init_resource::<DieVisualAssets>();
    world.init_resource::<Assets<Mesh>>();
    world.init_resource::<Assets<StandardMaterial>>();
    world.insert_resource(DiceSession::new(EngineSettings::default()));
    world.resource_mut::<RollRequests>().push("d20");

    world.run_system_once(process_roll_requests).unwrap();
    assert!(world.resource::<RollRequests>().pending.is_empty());
    assert_eq!(world.resource::<DiceSession>().session.active_count(), 0);
    assert_eq!(count::<With<DieBody>>(&mut world), 0);
}
